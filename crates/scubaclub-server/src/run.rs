use std::{path::Path, sync::Arc};

use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{response::IntoResponse, routing::get, Router};
use futures::FutureExt;
use scubaclub_app::{
    auth::session_layer,
    mailer::{LogMailer, Mailer},
    site_router,
    state::{AppConfig, AppState},
};
use scubaclub_auth::token::ActivationTokens;
use tokio::{fs, io::AsyncWriteExt as _};
use tracing::{debug, info};

const SECRET_LEN: usize = 64;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

pub fn main_router(state: AppState) -> Router<()> {
    let secure = state.config().secure_cookies();
    Router::new()
        .merge(site_router())
        .layer(session_layer(secure))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    build_state_with_mailer(config, Arc::new(LogMailer)).await
}

/// State with a custom mail delivery, tests use it to catch outgoing mails
pub async fn build_state_with_mailer(
    config: &ServerConfig,
    mailer: Arc<dyn Mailer>,
) -> Result<AppState> {
    let data_dir = config.data_dir();
    if !data_dir.is_dir() {
        fs::create_dir_all(&data_dir).await?;
        info!("Created data directory {data_dir:?}");
    }

    let app_config = AppConfig {
        base_url: config.base_url.clone(),
        default_from_email: config.default_from_email.clone(),
    };

    let pool = scubaclub_dal::new_pool(&config.database_url()).await?;
    scubaclub_dal::prepare_db(&pool).await?;
    debug!("Database {} ready", config.database_url());

    let secret = read_secret(&data_dir).await?;
    if secret.len() != SECRET_LEN {
        anyhow::bail!(
            "Secret file in {data_dir:?} has {} bytes, expected {SECRET_LEN}",
            secret.len()
        );
    }
    let tokens = ActivationTokens::new(&secret, config.activation_validity);
    Ok(AppState::new(app_config, pool, tokens, mailer))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; SECRET_LEN]>();
        #[cfg(unix)]
        let mut file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            {
                // Make sure the file is only accessible by the current user
                let _f = OpenOptions::new()
                    .mode(0o600)
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&secret_file)?;
            }
            fs::File::options().write(true).open(&secret_file).await?
        };
        #[cfg(not(unix))]
        let mut file = fs::File::create(&secret_file).await?;

        file.write_all(&random_bytes).await?;
        random_bytes.as_ref().to_vec()
    };
    Ok(secret)
}
