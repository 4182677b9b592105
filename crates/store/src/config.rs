//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COSTEO_DATABASE_URL` - Realtime database base URL
//!   (e.g., `https://my-shop-default-rtdb.firebaseio.com`)
//!
//! ## Optional
//! - `COSTEO_AUTH_TOKEN` - Database secret or ID token, sent as `?auth=`
//! - `COSTEO_ROOT_PATH` - Path prefix for every collection (default: none)
//! - `COSTEO_POLL_INTERVAL_SECS` - Subscription polling interval (default: 5)
//! - `COSTEO_READY_TIMEOUT_SECS` - Readiness probe timeout (default: 10)
//! - `COSTEO_REQUEST_TIMEOUT_SECS` - Timeout for every other request (default: 30)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_POLL_INTERVAL_SECS: &str = "5";
const DEFAULT_READY_TIMEOUT_SECS: &str = "10";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Remote data store configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct StoreConfig {
    /// Realtime database base URL
    pub database_url: Url,
    /// Database secret or ID token
    pub auth_token: Option<SecretString>,
    /// Path prefix for every collection, without leading or trailing slashes
    pub root_path: String,
    /// How often watched collections are re-fetched
    pub poll_interval: Duration,
    /// How long the readiness probe may take
    pub ready_timeout: Duration,
    /// How long any other request may take, polls included
    pub request_timeout: Duration,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &self.database_url.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("root_path", &self.root_path)
            .field("poll_interval", &self.poll_interval)
            .field("ready_timeout", &self.ready_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or any variable
    /// fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_required_env(&lookup, "COSTEO_DATABASE_URL")?;
        let database_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("COSTEO_DATABASE_URL".to_string(), e.to_string())
        })?;
        if database_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "COSTEO_DATABASE_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let auth_token = get_optional_env(&lookup, "COSTEO_AUTH_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from);
        let root_path = get_optional_env(&lookup, "COSTEO_ROOT_PATH")
            .map(|path| path.trim_matches('/').to_string())
            .unwrap_or_default();
        let poll_interval = get_seconds(&lookup, "COSTEO_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "COSTEO_POLL_INTERVAL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let ready_timeout = get_seconds(&lookup, "COSTEO_READY_TIMEOUT_SECS", DEFAULT_READY_TIMEOUT_SECS)?;
        let request_timeout =
            get_seconds(&lookup, "COSTEO_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "COSTEO_REQUEST_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            auth_token,
            root_path,
            poll_interval,
            ready_timeout,
            request_timeout,
        })
    }

    /// Non-empty segments of the root path.
    pub fn root_segments(&self) -> impl Iterator<Item = &str> {
        self.root_path.split('/').filter(|segment| !segment.is_empty())
    }
}

/// Get a required environment variable.
fn get_required_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
}

/// Get an environment variable with a default value.
fn get_env_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds.
fn get_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    get_env_or_default(lookup, key, default)
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            StoreConfig::from_lookup(lookup(&[("COSTEO_DATABASE_URL", "https://shop.firebaseio.com")]))
                .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.ready_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.auth_token.is_none());
        assert_eq!(config.root_segments().count(), 0);
    }

    #[test]
    fn test_missing_database_url() {
        let result = StoreConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "COSTEO_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let result = StoreConfig::from_lookup(lookup(&[("COSTEO_DATABASE_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = StoreConfig::from_lookup(lookup(&[
            ("COSTEO_DATABASE_URL", "https://shop.firebaseio.com"),
            ("COSTEO_POLL_INTERVAL_SECS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "COSTEO_POLL_INTERVAL_SECS"));

        let result = StoreConfig::from_lookup(lookup(&[
            ("COSTEO_DATABASE_URL", "https://shop.firebaseio.com"),
            ("COSTEO_READY_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = StoreConfig::from_lookup(lookup(&[
            ("COSTEO_DATABASE_URL", "https://shop.firebaseio.com"),
            ("COSTEO_REQUEST_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "COSTEO_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_root_path_is_trimmed() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("COSTEO_DATABASE_URL", "https://shop.firebaseio.com"),
            ("COSTEO_ROOT_PATH", "/tenants/panaderia/"),
        ]))
        .unwrap();
        assert_eq!(config.root_path, "tenants/panaderia");
        assert_eq!(config.root_segments().collect::<Vec<_>>(), vec!["tenants", "panaderia"]);
    }

    #[test]
    fn test_debug_redacts_auth_token() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("COSTEO_DATABASE_URL", "https://shop.firebaseio.com"),
            ("COSTEO_AUTH_TOKEN", "super-secret-db-token"),
        ]))
        .unwrap();
        assert_eq!(
            config.auth_token.as_ref().unwrap().expose_secret(),
            "super-secret-db-token"
        );

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("shop.firebaseio.com"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-db-token"));
    }
}
