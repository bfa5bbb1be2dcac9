//! Configuration for Depot.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $DEPOT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/depot/config.toml
//!   3. ~/.config/depot/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub listen_addr: String,
    pub listen_port: u16,
    /// Directory holding cell payloads.
    pub media_root: PathBuf,
    /// SQLite metadata database.
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub api_key: String,
    /// Maximum cell transfers in flight per upload/download.
    pub max_in_flight: usize,
    /// Per-request timeout; a cell exceeding it counts as failed.
    pub request_timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1".to_string(),
            listen_port: 9010,
            media_root: data_dir().join("media"),
            db_path: data_dir().join("depot.db"),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:9010".to_string(),
            api_key: String::new(),
            max_in_flight: 8,
            request_timeout_secs: 15,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("depot")
}

fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("depot")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl DepotConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::parse_file(&path)?
        } else {
            DepotConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit file, still applying env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("DEPOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&DepotConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply DEPOT_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DEPOT_SERVER__LISTEN_ADDR") {
            self.server.listen_addr = v;
        }
        if let Ok(v) = std::env::var("DEPOT_SERVER__LISTEN_PORT") {
            if let Ok(p) = v.parse() {
                self.server.listen_port = p;
            }
        }
        if let Ok(v) = std::env::var("DEPOT_SERVER__MEDIA_ROOT") {
            self.server.media_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEPOT_SERVER__DB_PATH") {
            self.server.db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DEPOT_CLIENT__SERVER_URL") {
            self.client.server_url = v;
        }
        if let Ok(v) = std::env::var("DEPOT_CLIENT__API_KEY") {
            self.client.api_key = v;
        }
        if let Ok(v) = std::env::var("DEPOT_CLIENT__MAX_IN_FLIGHT") {
            if let Ok(n) = v.parse() {
                self.client.max_in_flight = n;
            }
        }
        if let Ok(v) = std::env::var("DEPOT_CLIENT__REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                self.client.request_timeout_secs = n;
            }
        }
    }
}
