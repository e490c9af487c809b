use clap::Args;
use scubaclub_dal::user::UserRepository;
use scubaclub_types::config::BackendConfig;

use crate::commands::{open_database, Executor};

#[derive(Args, Debug)]
pub struct ChangePasswordCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Login name")]
    pub username: String,
    #[arg(short, long, help = "New user password")]
    pub password: String,
}

impl Executor for ChangePasswordCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let repository = UserRepository::new(pool);
        let user = repository
            .find_by_username(&self.username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} not found", self.username))?;
        repository.change_password(user.id, &self.password).await?;
        println!("Password of \"{}\" changed", user.username);
        Ok(())
    }
}
