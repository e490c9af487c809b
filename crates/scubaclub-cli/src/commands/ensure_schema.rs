use clap::Parser;
use scubaclub_types::config::BackendConfig;

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct EnsureSchemaCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for EnsureSchemaCmd {
    async fn run(self) -> anyhow::Result<()> {
        let existed = database_exists(&self.backend);
        let pool = open_database(&self.backend).await?;
        scubaclub_dal::prepare_db(&pool).await?;
        let schema = self.backend.search_path();
        if existed {
            println!("Schema \"{schema}\" already exists, migrations are up to date");
        } else {
            println!("Successfully created schema \"{schema}\"");
        }
        Ok(())
    }
}

fn database_exists(backend: &BackendConfig) -> bool {
    let url = backend.database_url();
    match url.strip_prefix("sqlite://") {
        Some(path) => std::path::Path::new(path).exists(),
        None => false,
    }
}
