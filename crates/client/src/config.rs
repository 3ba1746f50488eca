//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `SHOPFRONT_API_URL` - Backend base URL (default: `http://localhost:8080`)
//! - `SHOPFRONT_TOKEN_FILE` - Where the credential token is persisted
//!   (default: `$HOME/.shopfront/token.json`)
//! - `SHOPFRONT_TIMEOUT_SECS` - Transport timeout in seconds (default: 30)
//! - `SHOPFRONT_CATALOG_TTL_SECS` - Product cache lifetime in seconds (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const TOKEN_FILE_NAME: &str = "token.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; API paths are appended to it.
    pub api_url: Url,
    /// File holding the persisted credential token.
    pub token_file: PathBuf,
    /// Transport timeout for every request.
    pub timeout: Duration,
    /// How long product listings stay cached.
    pub catalog_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed,
    /// or if no token file is configured and no home directory is known.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("SHOPFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&api_url)?;

        let token_file = match lookup("SHOPFRONT_TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_token_file(&lookup)?,
        };

        let timeout = Duration::from_secs(parse_secs(
            &lookup,
            "SHOPFRONT_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);
        let catalog_ttl = Duration::from_secs(parse_secs(
            &lookup,
            "SHOPFRONT_CATALOG_TTL_SECS",
            DEFAULT_CATALOG_TTL_SECS,
        )?);

        Ok(Self {
            api_url,
            token_file,
            timeout,
            catalog_ttl,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    #[must_use]
    pub fn for_api(api_url: Url, token_file: PathBuf) -> Self {
        Self {
            api_url,
            token_file,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the backend URL, which must be absolute http(s).
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("SHOPFRONT_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPFRONT_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a whole number of seconds, falling back to `default` when unset.
fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// `$HOME/.shopfront/token.json` (or `%USERPROFILE%` on Windows).
fn default_token_file<F>(lookup: &F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let home = lookup("HOME")
        .or_else(|| lookup("USERPROFILE"))
        .ok_or_else(|| ConfigError::MissingEnvVar("SHOPFRONT_TOKEN_FILE".to_string()))?;
    Ok(PathBuf::from(home).join(".shopfront").join(TOKEN_FILE_NAME))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[("HOME", "/home/alice")])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/");
        assert_eq!(
            config.token_file,
            PathBuf::from("/home/alice/.shopfront/token.json")
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SHOPFRONT_API_URL", "https://shop.example.com"),
            ("SHOPFRONT_TOKEN_FILE", "/tmp/token.json"),
            ("SHOPFRONT_TIMEOUT_SECS", "5"),
            ("SHOPFRONT_CATALOG_TTL_SECS", "0"),
            ("SENTRY_DSN", ""),
        ]))
        .unwrap();
        assert_eq!(config.api_url.host_str(), Some("shop.example.com"));
        assert_eq!(config.token_file, PathBuf::from("/tmp/token.json"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.catalog_ttl, Duration::ZERO);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            ("HOME", "/home/alice"),
            ("SHOPFRONT_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SHOPFRONT_TIMEOUT_SECS"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            ("HOME", "/home/alice"),
            ("SHOPFRONT_API_URL", "ftp://shop.example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_missing_home_without_token_file() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}
