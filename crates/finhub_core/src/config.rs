//! Core runtime configuration.
//!
//! # Responsibility
//! - Hold the service endpoint, refresh cadence and storage settings.
//! - Load overrides from JSON or `FINHUB_*` environment variables.
//!
//! # Invariants
//! - `validate()` must pass before values reach the store or inbox.

use crate::remote::{NotificationQuery, MAX_PAGE_SIZE};
use crate::service::watchlist_store::DEFAULT_WATCHLIST_KEY;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8001";

/// Database file used when no `db_path` is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "finhub.sqlite3";

/// `db_path` value selecting a throwaway in-memory medium.
pub const IN_MEMORY_DB_PATH: &str = ":memory:";

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(String),
    #[error("environment variable `{name}` has invalid value `{value}`")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Settings shared by the watchlist store, the inbox and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub api_base_url: String,
    pub page_size: u32,
    pub poll_interval_secs: u64,
    pub watchlist_key: String,
    /// `None` resolves to `DEFAULT_DB_FILE_NAME` in the temp directory.
    pub db_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: crate::remote::DEFAULT_PAGE_SIZE,
            poll_interval_secs: 60,
            watchlist_key: DEFAULT_WATCHLIST_KEY.to_string(),
            db_path: None,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON object; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `FINHUB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` with an injectable variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup("FINHUB_API_URL") {
            config.api_base_url = value;
        }
        if let Some(value) = lookup("FINHUB_PAGE_SIZE") {
            config.page_size = parse_env("FINHUB_PAGE_SIZE", value)?;
        }
        if let Some(value) = lookup("FINHUB_POLL_INTERVAL_SECS") {
            config.poll_interval_secs = parse_env("FINHUB_POLL_INTERVAL_SECS", value)?;
        }
        if let Some(value) = lookup("FINHUB_WATCHLIST_KEY") {
            config.watchlist_key = value;
        }
        if let Some(value) = lookup("FINHUB_DB_PATH") {
            if !value.trim().is_empty() {
                config.db_path = Some(PathBuf::from(value.trim()));
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "cannot be empty"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(invalid(
                "page_size",
                format!("must be within 1..={MAX_PAGE_SIZE}"),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be positive"));
        }
        if self.watchlist_key.trim().is_empty() {
            return Err(invalid("watchlist_key", "cannot be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn inbox_query(&self) -> NotificationQuery {
        NotificationQuery::page(self.page_size)
    }

    /// Database file backing the watchlist medium.
    ///
    /// Returns `None` only for the explicit `IN_MEMORY_DB_PATH` opt-in.
    pub fn medium_path(&self) -> Option<PathBuf> {
        match self.db_path.as_deref() {
            Some(path) if path == Path::new(IN_MEMORY_DB_PATH) => None,
            Some(path) => Some(path.to_path_buf()),
            None => Some(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
