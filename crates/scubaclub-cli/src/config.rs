use clap::{Parser, Subcommand};

use crate::commands::{
    Executor,
    change_password::ChangePasswordCmd, create_countries::CreateCountriesCmd,
    create_languages::CreateLanguagesCmd, create_slugs::CreateSlugsCmd,
    create_superuser::CreateSuperuserCmd, create_user::CreateUserCmd,
    ensure_schema::EnsureSchemaCmd, test_email::TestEmailCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for scubaclub - management commands for the scubaclub database and site."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Creates database file and applies migrations
    EnsureSchema(EnsureSchemaCmd),
    /// Creates supported languages
    CreateLanguages(CreateLanguagesCmd),
    /// Creates base set of countries with English and Dutch names
    CreateCountries(CreateCountriesCmd),
    /// Assigns slugs to club translations which have none
    CreateSlugs(CreateSlugsCmd),
    /// Creates superuser from DJANGO_SUPERUSER_* variables
    CreateSuperuser(CreateSuperuserCmd),
    CreateUser(CreateUserCmd),
    ChangePassword(ChangePasswordCmd),
    /// Sends test mail through configured mailer
    TestEmail(TestEmailCmd),
}

impl Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::EnsureSchema(cmd) => cmd.run().await,
            Command::CreateLanguages(cmd) => cmd.run().await,
            Command::CreateCountries(cmd) => cmd.run().await,
            Command::CreateSlugs(cmd) => cmd.run().await,
            Command::CreateSuperuser(cmd) => cmd.run().await,
            Command::CreateUser(cmd) => cmd.run().await,
            Command::ChangePassword(cmd) => cmd.run().await,
            Command::TestEmail(cmd) => cmd.run().await,
        }
    }
}
