pub mod change_password;
pub mod create_countries;
pub mod create_languages;
pub mod create_slugs;
pub mod create_superuser;
pub mod create_user;
pub mod ensure_schema;
pub mod test_email;

use scubaclub_dal::Pool;
use scubaclub_types::config::BackendConfig;
use tracing::debug;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens database and brings schema up to date
pub async fn open_database(backend: &BackendConfig) -> anyhow::Result<Pool> {
    let db_url = backend.database_url();
    let pool = scubaclub_dal::new_pool(&db_url).await?;
    scubaclub_dal::MIGRATOR.run(&pool).await?;
    debug!("Opened database {db_url}");
    Ok(pool)
}
