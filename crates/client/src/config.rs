//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLEMENTINE_API_BASE_URL` - Base URL of the commerce backend
//!
//! ## Optional
//! - `CLEMENTINE_API_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `CLEMENTINE_USER_AGENT` - User-Agent header (default: clementine/0.1)
//! - `CLEMENTINE_CREDENTIALS_PATH` - Path for the file-backed credential
//!   store; sessions stay in memory when unset

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = "clementine/0.1";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the commerce backend.
    pub base_url: Url,
    /// Fixed per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Where the file-backed credential store persists sessions.
    pub credentials_path: Option<PathBuf>,
}

impl ApiConfig {
    /// Create a configuration with defaults for everything but the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("base_url".to_owned(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            credentials_path: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url_raw = get_required_env("CLEMENTINE_API_BASE_URL")?;
        let base_url = Url::parse(&base_url_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("CLEMENTINE_API_BASE_URL".to_owned(), e.to_string())
        })?;

        let timeout_secs = get_env_or_default(
            "CLEMENTINE_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CLEMENTINE_API_TIMEOUT_SECS".to_owned(), e.to_string())
        })?;

        let user_agent = get_env_or_default("CLEMENTINE_USER_AGENT", DEFAULT_USER_AGENT);
        let credentials_path = get_optional_env("CLEMENTINE_CREDENTIALS_PATH").map(PathBuf::from);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
            credentials_path,
        })
    }

    /// Resolve an endpoint path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the path does not join
    /// cleanly (malformed path segments).
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url.join(path).map_err(|e| {
            ConfigError::InvalidEnvVar("endpoint path".to_owned(), e.to_string())
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = ApiConfig::new("https://api.example.com").expect("valid base url");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "clementine/0.1");
        assert!(config.credentials_path.is_none());
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(ApiConfig::new("not a url").is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ApiConfig::new("https://api.example.com").expect("valid base url");
        let url = config.endpoint("/users/login/").expect("joinable path");
        assert_eq!(url.as_str(), "https://api.example.com/users/login/");
    }
}
