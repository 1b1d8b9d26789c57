//! Runtime configuration read from the process environment
//!
//! `main` loads an optional `.env` file first, so any of these may also be set
//! there.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::data::weather::{DEFAULT_TIMEOUT, OPENWEATHER_BASE_URL};

pub const API_KEY_VAR: &str = "OPENWEATHER_API_KEY";
pub const BASE_URL_VAR: &str = "OPENWEATHER_BASE_URL";
pub const LANG_VAR: &str = "OPENWEATHER_LANG";
pub const TIMEOUT_VAR: &str = "ECOGARDEN_HTTP_TIMEOUT_SECS";
pub const CACHE_DIR_VAR: &str = "ECOGARDEN_CACHE_DIR";

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENWEATHER_API_KEY is not set")]
    MissingApiKey,

    #[error("Invalid ECOGARDEN_HTTP_TIMEOUT_SECS: '{0}' (expected a positive number of seconds)")]
    InvalidTimeout(String),
}

/// Settings for the weather provider and the cache
#[derive(Debug, Clone)]
pub struct Config {
    /// Weather provider credential; only weather lookups need it
    pub api_key: Option<String>,
    pub base_url: String,
    /// Language for weather descriptions, e.g. "fr"
    pub lang: Option<String>,
    pub http_timeout: Duration,
    /// Overrides the default XDG cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENWEATHER_BASE_URL.to_string(),
            lang: None,
            http_timeout: DEFAULT_TIMEOUT,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Reads the configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let http_timeout = match var(TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_key: var(API_KEY_VAR),
            base_url: var(BASE_URL_VAR).unwrap_or_else(|| OPENWEATHER_BASE_URL.to_string()),
            lang: var(LANG_VAR),
            http_timeout,
            cache_dir: var(CACHE_DIR_VAR).map(PathBuf::from),
        })
    }

    /// The weather provider API key, required for lookups
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }
}
