pub mod club;
pub mod country;
pub mod error;
pub mod event;
pub mod language;
pub mod location;
pub mod suggestion;
pub mod translation;
pub mod user;
mod validation;

use std::str::FromStr as _;

pub use error::Error;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;
pub type Connection = sqlx::SqliteConnection;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    // every connection to in-memory db is separate database
    let max_connections = if database_url.contains(":memory:") {
        1
    } else {
        50
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Creates or upgrades the schema and makes sure supported languages exist
pub async fn prepare_db(pool: &Pool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    let created = language::LanguageRepository::new(pool.clone())
        .ensure_all()
        .await?;
    debug!("Database ready, languages created: {created:?}");
    Ok(())
}
