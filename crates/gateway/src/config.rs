//! # Gateway Configuration
//!
//! Connection settings for the clinic settings service, loaded from the
//! environment. The bearer credential is injected here and handed to the
//! gateway at construction; nothing reads it from ambient storage later.
//!
//! ## Environment Variables
//!
//! - `CLINIC_API_BASE_URL`: Base URL of the clinic settings service (required)
//! - `CLINIC_API_TOKEN`: Bearer credential for the current session (required)
//! - `CLINIC_API_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
//! - `LOG_LEVEL`: Logging level (default: "info")

use std::{env, fmt, time::Duration};

use eyre::{Result, WrapErr, eyre};
use tracing::Level;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for [`HttpGateway`](crate::HttpGateway).
///
/// # Example
///
/// ```no_run
/// use clinicsched_gateway::{GatewayConfig, HttpGateway};
///
/// fn example() -> eyre::Result<HttpGateway> {
///     let config = GatewayConfig::from_env()?;
///     HttpGateway::new(config)
/// }
/// ```
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the service, e.g. "https://clinic.example.com/api"
    pub base_url: String,

    /// Bearer credential sent with every request
    pub bearer_token: String,

    /// Upper bound for a single request, including reading the body
    pub request_timeout: Duration,

    /// Log level for binaries embedding the gateway
    pub log_level: Level,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            log_level: Level::INFO,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Fails when the base URL or token is missing or empty, or when the
    /// timeout is not a positive whole number of seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CLINIC_API_BASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| eyre!("CLINIC_API_BASE_URL environment variable not set"))?;

        let bearer_token = lookup("CLINIC_API_TOKEN")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| eyre!("CLINIC_API_TOKEN environment variable not set"))?;

        let timeout_seconds: u64 = lookup("CLINIC_API_TIMEOUT_SECONDS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECONDS.to_string())
            .trim()
            .parse()
            .wrap_err("Invalid CLINIC_API_TIMEOUT_SECONDS value")?;
        if timeout_seconds == 0 {
            return Err(eyre!("CLINIC_API_TIMEOUT_SECONDS must be greater than zero"));
        }

        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            bearer_token,
            request_timeout: Duration::from_secs(timeout_seconds),
            log_level,
        })
    }

    /// Joins a route onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}
