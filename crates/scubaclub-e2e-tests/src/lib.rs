use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Result, anyhow};
use rand::Rng as _;
use reqwest::{Client, Response, StatusCode, Url};
use scubaclub_app::mailer::RecordingMailer;
use scubaclub_dal::{
    Pool,
    user::{CreateUser, User, UserRepository},
};
use scubaclub_server::{
    build_state_with_mailer,
    config::{Parser, ServerConfig},
    run_graceful_with_state,
};
use scubaclub_types::general::ValidEmail;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

pub const TEST_PASSWORD: &str = "onderwater";

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "scubaclub-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
        "--default-from-email",
        "noreply@scubaclub.test",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    test_config(test_name, &std::env::temp_dir())
}

/// Running server, it is stopped when dropped
pub struct TestServer {
    pub base_url: Url,
    pub mailer: RecordingMailer,
    pool: Pool,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("valid test url")
    }

    pub fn pool(&self) -> Pool {
        self.pool.clone()
    }

    /// Active user with [`TEST_PASSWORD`]
    pub async fn create_user(&self, username: &str, is_superuser: bool) -> Result<User> {
        let user = UserRepository::new(self.pool())
            .create(CreateUser {
                username: username.parse()?,
                email: ValidEmail::cheat(format!("{username}@localhost")),
                password: TEST_PASSWORD.to_string(),
                is_active: true,
                is_superuser,
            })
            .await?;
        Ok(user)
    }
}

pub async fn spawn_server(args: ServerConfig) -> Result<TestServer> {
    let mailer = RecordingMailer::new();
    let state = build_state_with_mailer(&args, Arc::new(mailer.clone())).await?;
    let pool = state.pool().clone();
    let base_url = args.base_url.clone();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(e) = run_graceful_with_state(args, state, shutdown).await {
            error!("Test server failed: {e}");
        }
    });

    let client = Client::new();
    let health = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(health.clone()).send().await {
            if response.status().is_success() {
                info!("Test server ready at {base_url}");
                return Ok(TestServer {
                    base_url,
                    mailer,
                    pool,
                    _shutdown: tx,
                });
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Err(anyhow!("Test server did not start"))
}

/// Client keeping session cookie and not following redirects
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client config is valid")
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn login(client: &Client, server: &TestServer, username: &str) -> Result<()> {
    let response = client
        .post(server.url("login"))
        .form(&[("username", username), ("password", TEST_PASSWORD)])
        .send()
        .await?;
    debug!("Login response {response:?}");
    if response.status() != StatusCode::SEE_OTHER {
        return Err(anyhow!("Login of {username} failed: {}", response.status()));
    }
    Ok(())
}

/// Logged in client of a new active user
pub async fn user_client(
    server: &TestServer,
    username: &str,
    is_superuser: bool,
) -> Result<(Client, User)> {
    let user = server.create_user(username, is_superuser).await?;
    let client = client();
    login(&client, server, username).await?;
    Ok((client, user))
}

/// Creates club with Dutch name, returns response JSON
pub async fn create_club(client: &Client, server: &TestServer, name: &str) -> Result<Value> {
    let response = client
        .post(server.url("create-club/?lang=nl"))
        .json(&json!({
            "details": {"city": "Amsterdam"},
            "translations": [{"language": "nl", "name": name, "description": ""}]
        }))
        .send()
        .await?;
    if response.status() != StatusCode::CREATED {
        return Err(anyhow!("Club not created: {}", response.status()));
    }
    Ok(response.json().await?)
}

/// Creates dive location with Dutch name, returns response JSON
pub async fn create_location(client: &Client, server: &TestServer, name: &str) -> Result<Value> {
    let response = client
        .post(server.url("create_dive_location/?lang=nl"))
        .json(&json!({
            "language": "nl",
            "details": {"latitude": 52.2, "longitude": 4.9, "country_id": null},
            "translations": [{
                "language": "nl",
                "name": name,
                "description": "Zoetwater",
                "facilities": "",
                "parking": "Gratis",
                "directions": ""
            }]
        }))
        .send()
        .await?;
    if response.status() != StatusCode::CREATED {
        return Err(anyhow!("Location not created: {}", response.status()));
    }
    Ok(response.json().await?)
}
