use clap::Parser;
use scubaclub_dal::user::{CreateUser, UserRepository};
use scubaclub_types::{
    config::BackendConfig,
    general::{Username, ValidEmail},
};

use crate::commands::{open_database, Executor};

#[derive(Parser, Debug)]
pub struct CreateSuperuserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(long, env = "DJANGO_SUPERUSER_USERNAME", default_value = "")]
    username: String,
    #[arg(long, env = "DJANGO_SUPERUSER_EMAIL", default_value = "")]
    email: String,
    #[arg(long, env = "DJANGO_SUPERUSER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuperuserOutcome {
    Created(String),
    AlreadyExists(String),
    MissingPassword,
    Invalid(String),
}

pub async fn create_superuser(
    repository: &UserRepository,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> anyhow::Result<SuperuserOutcome> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Ok(SuperuserOutcome::MissingPassword);
    };
    if repository.exists(username).await? {
        return Ok(SuperuserOutcome::AlreadyExists(username.to_string()));
    }
    let (username_parsed, email_parsed) = match (username.parse::<Username>(), email.parse::<ValidEmail>()) {
        (Ok(u), Ok(e)) => (u, e),
        (Err(e), _) => return Ok(SuperuserOutcome::Invalid(format!("username: {e}"))),
        (_, Err(e)) => return Ok(SuperuserOutcome::Invalid(format!("email: {e}"))),
    };
    repository
        .create(CreateUser {
            username: username_parsed,
            email: email_parsed,
            password: password.to_string(),
            is_active: true,
            is_superuser: true,
        })
        .await?;
    Ok(SuperuserOutcome::Created(username.to_string()))
}

impl Executor for CreateSuperuserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        let repository = UserRepository::new(pool);
        match create_superuser(
            &repository,
            &self.username,
            &self.email,
            self.password.as_deref(),
        )
        .await?
        {
            SuperuserOutcome::Created(name) => {
                println!("Successfully created superuser \"{name}\"")
            }
            SuperuserOutcome::AlreadyExists(name) => println!("Superuser \"{name}\" already exists"),
            SuperuserOutcome::MissingPassword => {
                eprintln!("DJANGO_SUPERUSER_PASSWORD environment variable is required")
            }
            SuperuserOutcome::Invalid(msg) => eprintln!("Invalid superuser {msg}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_superuser() {
        let pool = scubaclub_dal::new_pool("sqlite::memory:").await.unwrap();
        scubaclub_dal::prepare_db(&pool).await.unwrap();
        let repository = UserRepository::new(pool);

        let res = create_superuser(&repository, "admin", "admin@example.com", None)
            .await
            .unwrap();
        assert_eq!(res, SuperuserOutcome::MissingPassword);
        assert!(!repository.exists("admin").await.unwrap());

        let res = create_superuser(&repository, "admin", "admin@example.com", Some("onderwater"))
            .await
            .unwrap();
        assert_eq!(res, SuperuserOutcome::Created("admin".into()));
        let user = repository.find_by_username("admin").await.unwrap().unwrap();
        assert!(user.is_superuser);
        assert!(user.is_active);

        let res = create_superuser(&repository, "admin", "other@example.com", Some("secret123"))
            .await
            .unwrap();
        assert_eq!(res, SuperuserOutcome::AlreadyExists("admin".into()));

        let res = create_superuser(&repository, "bad name", "x@example.com", Some("secret123"))
            .await
            .unwrap();
        assert!(matches!(res, SuperuserOutcome::Invalid(_)));
    }
}
