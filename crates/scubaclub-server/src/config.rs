use std::{path::PathBuf, time::Duration};

use crate::error::Result;
pub use clap::Parser;
use scubaclub_types::config::BackendConfig;
use url::Url;

pub const DEFAULT_FROM_EMAIL: &str = "noreply@scubaclub.local";

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "SCUBACLUB_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "SCUBACLUB_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "SCUBACLUB_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the site as visible to users, used in activation links"
    )]
    pub base_url: Url,

    #[arg(
        long,
        env = "SCUBACLUB_ACTIVATION_VALIDITY",
        default_value = "3days",
        help = "Validity of account activation links in human friendly format (e.g. 3d, 12h - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub activation_validity: Duration,

    #[arg(
        long,
        env = "SCUBACLUB_DEFAULT_FROM_EMAIL",
        default_value = DEFAULT_FROM_EMAIL,
        help = "Sender address of outgoing mails"
    )]
    pub default_from_email: String,

    #[arg(long, env = "SCUBACLUB_NO_CORS", help = "Disable CORS")]
    pub no_cors: bool,

    #[command(flatten)]
    pub backend: BackendConfig,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.backend.data_dir()
    }

    pub fn database_url(&self) -> String {
        self.backend.database_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::try_parse_from(["scubaclub-server", "--data-dir", "/tmp/scuba"])
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.activation_validity, Duration::from_secs(3 * 24 * 3600));
        assert_eq!(config.database_url(), "sqlite:///tmp/scuba/scubaclub.db");
        assert!(!config.no_cors);

        let config = ServerConfig::try_parse_from([
            "scubaclub-server",
            "--data-dir",
            "/tmp/scuba",
            "--activation-validity",
            "2h 30m",
            "--no-cors",
        ])
        .unwrap();
        assert_eq!(config.activation_validity, Duration::from_secs(9000));
        assert!(config.no_cors);
    }
}
