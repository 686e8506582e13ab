use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use lode_core::{ConfigurationError, FilterConfig, FilterSettings, Validator};

/// Connector configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub checkpoint_path: PathBuf,
    pub connector_name: String,
    pub batch_size: usize,
    pub poll_interval_secs: u64,
    pub start_date: Option<NaiveDateTime>,
    pub filters: FilterConfig,
}

impl Config {
    /// Load configuration from environment variables.
    /// DATABASE_URL defaults to "sqlite://livelink.db"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://livelink.db".to_string());

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("LISTEN_ADDR", "must be a valid socket address"))?;

        let checkpoint_path = lookup("LODE_CHECKPOINT_PATH")
            .unwrap_or_else(|| "./lode.redb".to_string())
            .into();

        let connector_name = lookup("LODE_CONNECTOR_NAME")
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| "livelink".to_string());
        if connector_name.is_empty() {
            return Err(ConfigError::Invalid(
                "LODE_CONNECTOR_NAME",
                "must not be empty",
            ));
        }

        let batch_size = lookup("LODE_BATCH_SIZE")
            .unwrap_or_else(|| "100".to_string())
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or(ConfigError::Invalid(
                "LODE_BATCH_SIZE",
                "must be a positive integer",
            ))?;

        let poll_interval_secs = lookup("LODE_POLL_INTERVAL_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30);

        let start_date = lookup("LODE_START_DATE").and_then(|value| {
            let parsed = Validator::parse_start_date(&value);
            if parsed.is_none() && !value.trim().is_empty() {
                tracing::warn!(
                    "Ignoring LODE_START_DATE {:?}: expected yyyy-MM-dd [HH:mm:ss]",
                    value
                );
            }
            parsed
        });

        let filters = FilterConfig::from_settings(&FilterSettings {
            excluded_node_types: lookup("LODE_EXCLUDED_NODE_TYPES"),
            excluded_volume_types: lookup("LODE_EXCLUDED_VOLUME_TYPES"),
            excluded_location_nodes: lookup("LODE_EXCLUDED_LOCATION_NODES"),
            included_location_nodes: lookup("LODE_INCLUDED_LOCATION_NODES"),
        })?;

        Ok(Config {
            listen_addr,
            database_url,
            checkpoint_path,
            connector_name,
            batch_size,
            poll_interval_secs,
            start_date,
            filters,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str, &'static str),
    Filters(ConfigurationError),
}

impl From<ConfigurationError> for ConfigError {
    fn from(e: ConfigurationError) -> Self {
        ConfigError::Filters(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
            ConfigError::Filters(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
