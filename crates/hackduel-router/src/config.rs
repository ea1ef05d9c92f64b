//! Configuration file parsing for the HackDuel server.
//!
//! Loads settings from TOML: bind address, rating constants, pairing and
//! sync tuning, and storage locations. Every section is optional.

use hackduel_domain::RatingConfig;
use hackduel_engine::{EngineConfig, PairingConfig};
use hackduel_sync::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the durable database path
pub const DATABASE_ENV: &str = "HACKDUEL_DATABASE";

/// Overrides the seed dataset path
pub const DATASET_ENV: &str = "HACKDUEL_DATASET";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
        }
    }
}

/// Where entries are persisted and seeded from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database: PathBuf,

    /// CSV seed dataset, read only when the database is empty
    pub dataset: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("hackduel.db"),
            dataset: None,
        }
    }
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener
    pub server: ServerConfig,
    /// Skill model constants
    pub rating: RatingConfig,
    /// Pair selection tuning
    pub pairing: PairingConfig,
    /// Write-behind tuning
    pub sync: SyncConfig,
    /// Storage locations
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply storage overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply storage overrides from `lookup`; blank values are ignored
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(database) = non_blank(DATABASE_ENV) {
            self.storage.database = PathBuf::from(database);
        }
        if let Some(dataset) = non_blank(DATASET_ENV) {
            self.storage.dataset = Some(PathBuf::from(dataset));
        }
        self
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.sync
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Rating and pairing sections as engine settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            rating: self.rating.clone(),
            pairing: self.pairing.clone(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
    }
}
