//! Service configuration.
//!
//! Defaults cover local development; production deployments override through
//! `config.toml` or environment variables (`DATABASE_URL`,
//! `MODEL_EXPORT_DIR`, `BIND_HOST`, `BIND_PORT`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Transaction store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_database_url")]
    pub database_url: String,

    /// Upper bound on pooled connections shared by concurrent requests.
    #[serde(default = "StorageConfig::default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "StorageConfig::default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

impl StorageConfig {
    fn default_database_url() -> String {
        "sqlite://./data/txs.db?mode=rwc".to_string()
    }
    fn default_max_connections() -> u32 {
        10
    }
    fn default_connection_timeout() -> u64 {
        30
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: Self::default_database_url(),
            max_connections: Self::default_max_connections(),
            connection_timeout_seconds: Self::default_connection_timeout(),
        }
    }
}

/// Model artifact locations.
///
/// `export_dir` is the promoted bundle the server loads at startup;
/// `work_dir` is where training writes raw artifacts before export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    #[serde(default = "ArtifactConfig::default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default = "ArtifactConfig::default_work_dir")]
    pub work_dir: PathBuf,
}

impl ArtifactConfig {
    fn default_export_dir() -> PathBuf {
        PathBuf::from("exported_model")
    }
    fn default_work_dir() -> PathBuf {
        PathBuf::from("models")
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            export_dir: Self::default_export_dir(),
            work_dir: Self::default_work_dir(),
        }
    }
}

/// HTTP bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,

    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub artifacts: ArtifactConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Apply environment-variable overrides on top of the current values.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Ok(dir) = std::env::var("MODEL_EXPORT_DIR") {
            self.artifacts.export_dir = PathBuf::from(dir);
        }
        if let Ok(host) = std::env::var("BIND_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BIND_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        self
    }
}
