use clap::Parser;
use scubaclub_dal::club::ClubRepository;
use scubaclub_types::config::BackendConfig;

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct CreateSlugsCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for CreateSlugsCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let fixed = ClubRepository::new(pool).fill_missing_slugs().await?;
        if fixed.is_empty() {
            println!("No clubs found without slugs.");
        }
        for (club_id, lang, slug) in fixed {
            println!("Created slug \"{slug}\" for club {club_id} in {lang}");
        }
        Ok(())
    }
}
