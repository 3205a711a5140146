//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_API_URL` - Base URL of the marketplace REST backend
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_BASE_URL` - Public URL of the storefront (default: `http://{host}:{port}`)
//! - `BAZAAR_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `BAZAAR_CATALOG_CACHE_SECS` - Category/shop cache TTL (default: 300)
//! - `BAZAAR_NOTIFICATION_POLL_SECS` - Notification badge poll interval (default: 30)
//! - `BAZAAR_PAGE_SIZE` - Products per collection page (default: 12)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Marketplace backend settings
    pub api: ApiConfig,
    /// Seconds between notification badge refreshes
    pub notification_poll_secs: u64,
    /// Products per collection page
    pub page_size: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Marketplace REST backend configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, always ending in `/`
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// TTL of cached category and shop lists
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Build a backend config with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("BAZAAR_API_URL", base_url)?,
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
        })
    }
}

impl StorefrontConfig {
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

        let host: IpAddr = get_parsed_or_default("BAZAAR_HOST", "127.0.0.1")?;
        let port: u16 = get_parsed_or_default("BAZAAR_PORT", "3000")?;
        let base_url = get_optional_env("BAZAAR_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));

        let api_url = get_required_env("BAZAAR_API_URL")?;
        let api = ApiConfig {
            base_url: parse_base_url("BAZAAR_API_URL", &api_url)?,
            timeout: Duration::from_secs(get_parsed_or_default("BAZAAR_API_TIMEOUT_SECS", "10")?),
            catalog_cache_ttl: Duration::from_secs(get_parsed_or_default(
                "BAZAAR_CATALOG_CACHE_SECS",
                "300",
            )?),
        };

        let notification_poll_secs =
            get_parsed_or_default::<u64>("BAZAAR_NOTIFICATION_POLL_SECS", "30")?.max(1);
        let page_size = get_parsed_or_default::<u32>("BAZAAR_PAGE_SIZE", "12")?.max(1);

        Ok(Self {
            host,
            port,
            base_url,
            api,
            notification_poll_secs,
            page_size,
            sentry_dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for tests and embedding: defaults everywhere, given backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the backend URL does not parse.
    pub fn for_api(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://127.0.0.1:3000".to_string(),
            api: ApiConfig::new(api_url)?,
            notification_poll_secs: 30,
            page_size: 12,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Sentry DSN, exposed only for client initialisation.
    #[must_use]
    pub fn sentry_dsn(&self) -> Option<&str> {
        self.sentry_dsn.as_ref().map(ExposeSecret::expose_secret)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed into `T`, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL and make sure relative joins keep its path.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
