//! Server configuration, loaded from a JSON file at startup.

use std::path::{Path, PathBuf};

use resonanz_core::models::address::AddressIdentity;
use resonanz_db::{DbConfig, DbEngine};
use resonanz_geo::{GeocoderBackend, GeocoderConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "RESONANZ_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// TCP port the HTTP API listens on.
    pub port: u16,
    /// One of `trace`, `debug`, `info`, `warn`, `error`. `RUST_LOG`
    /// takes precedence when set.
    pub log_level: String,
    pub geocoder: GeocoderConfig,
    pub database: DbConfig,
    pub address_identity: AddressIdentity,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            log_level: "info".into(),
            geocoder: GeocoderConfig::default(),
            database: DbConfig::default(),
            address_identity: AddressIdentity::default(),
        }
    }
}

impl AppConfig {
    /// Load from `$RESONANZ_CONFIG`, else `./config.json`, else
    /// defaults. An explicitly named file must exist.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))
            }
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level_filter()?;

        if self.geocoder.backend == GeocoderBackend::GoogleMaps
            && self
                .geocoder
                .api_key
                .as_deref()
                .is_none_or(|key| key.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "geocoder.api_key is required for the google_maps backend".into(),
            ));
        }

        if self.address_identity == AddressIdentity::Components
            && !self.geocoder.backend.is_structured()
        {
            return Err(ConfigError::Invalid(format!(
                "address_identity `components` needs a structured geocoder, not {}",
                self.geocoder.backend.name()
            )));
        }

        if self.database.engine == DbEngine::File && self.database.path.is_none() {
            return Err(ConfigError::Invalid(
                "database.path is required for the file engine".into(),
            ));
        }

        if self.geocoder.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "geocoder.timeout_secs must be positive".into(),
            ));
        }

        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log_level `{}`", self.log_level)))
    }
}
