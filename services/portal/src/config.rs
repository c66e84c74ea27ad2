//! services/portal/src/config.rs
//!
//! Defines the portal's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where confirmed bookings are sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingBackend {
    /// `POST /api/bookings` on the backend.
    Remote,
    /// Kept in process memory; the backend has no booking endpoint yet.
    Local,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub credential_path: PathBuf,
    pub request_timeout: Duration,
    pub booking_backend: BookingBackend,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend API ---
        let api_base_url = lookup("PADHO_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:5000".to_string());
        let parsed = reqwest::Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidValue("PADHO_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(
                "PADHO_API_BASE_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            ));
        }
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let timeout_str =
            lookup("PADHO_REQUEST_TIMEOUT_SECS").unwrap_or_else(|| "15".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "PADHO_REQUEST_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a number of seconds", timeout_str),
            )
        })?;

        let booking_backend = match lookup("PADHO_BOOKING_BACKEND")
            .unwrap_or_else(|| "remote".to_string())
            .to_lowercase()
            .as_str()
        {
            "remote" => BookingBackend::Remote,
            "local" => BookingBackend::Local,
            other => {
                return Err(ConfigError::InvalidValue(
                    "PADHO_BOOKING_BACKEND".to_string(),
                    format!("'{}' is neither 'remote' nor 'local'", other),
                ))
            }
        };

        // --- Client-local storage ---
        let credential_path = lookup("PADHO_CREDENTIAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.padho-likho/credential.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            credential_path,
            request_timeout: Duration::from_secs(timeout_secs),
            booking_backend,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(
            config.credential_path,
            PathBuf::from("./.padho-likho/credential.json")
        );
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.booking_backend, BookingBackend::Remote);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let config = load(&[("PADHO_API_BASE_URL", "https://api.padholikho.in/")]).unwrap();
        assert_eq!(config.api_base_url, "https://api.padholikho.in");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("PADHO_API_BASE_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("PADHO_REQUEST_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("PADHO_BOOKING_BACKEND", "carrier-pigeon")]),
            Err(ConfigError::InvalidValue(..))
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(..))
        ));
    }

    #[test]
    fn local_bookings_can_be_selected() {
        let config = load(&[("PADHO_BOOKING_BACKEND", "LOCAL")]).unwrap();
        assert_eq!(config.booking_backend, BookingBackend::Local);
    }
}
