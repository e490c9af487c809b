use clap::Parser;
use scubaclub_dal::language::LanguageRepository;
use scubaclub_types::{config::BackendConfig, language::LanguageCode};

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct CreateLanguagesCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for CreateLanguagesCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let created = LanguageRepository::new(pool).ensure_all().await?;
        for code in LanguageCode::ALL {
            if created.contains(&code) {
                println!("Created language \"{code}\"");
            } else {
                println!("Language \"{code}\" already exists");
            }
        }
        Ok(())
    }
}
