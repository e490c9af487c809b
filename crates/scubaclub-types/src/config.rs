use clap::Parser;
use std::{fs, path::PathBuf};

pub const DEFAULT_SEARCH_PATH: &str = "scubaclub";

#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "SCUBACLUB_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db or similar, default is sqlite://[data-dir]/[search-path].db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "DB_SEARCH_PATH",
        default_value = DEFAULT_SEARCH_PATH,
        help = "Name of the database schema, used as database file name when --database-url is not given"
    )]
    search_path: String,

    #[arg(
        long,
        env = "SCUBACLUB_DATA_DIR",
        help = "Data directory (databases, secrets etc.), default is system default like ~/.local/share/scubaclub",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

pub fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("scubaclub"))
        .unwrap_or_else(|| PathBuf::from("scubaclub"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/{}.db", self.data_dir, self.search_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_from_search_path() {
        let config = BackendConfig::try_parse_from([
            "test",
            "--data-dir",
            "/tmp/scuba",
            "--search-path",
            "divers",
        ])
        .unwrap();
        assert_eq!(config.database_url(), "sqlite:///tmp/scuba/divers.db");
        assert_eq!(config.search_path(), "divers");

        let config = BackendConfig::try_parse_from([
            "test",
            "--data-dir",
            "/tmp/scuba",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(config.database_url(), "sqlite::memory:");
    }
}
