use clap::Parser;
use scubaclub_dal::user::{CreateUser, UserRepository};
use scubaclub_types::{
    claim::Role,
    config::BackendConfig,
    general::{Username, ValidEmail},
};

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "Login name, letters and digits only")]
    username: Username,
    #[arg(short, long, help = "User email")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password")]
    pub password: String,
    #[arg(short, long, num_args=0..,
        value_delimiter = ';', help = "Roles of the user, separated by semicolon or used multiple times, currently only superuser is supported")]
    pub roles: Vec<Role>,
    #[arg(long, help = "Create account waiting for activation")]
    pub inactive: bool,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let repository = UserRepository::new(pool);
        let new_user = CreateUser {
            username: self.username,
            email: self.email,
            password: self.password,
            is_active: !self.inactive,
            is_superuser: self.roles.contains(&Role::Superuser),
        };
        let user = repository.create(new_user).await?;
        println!("Created user \"{}\" with id {}", user.username, user.id);

        Ok(())
    }
}
