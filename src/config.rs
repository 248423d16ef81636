//! Configuration management for the Fatebook MCP Server
//!
//! Handles environment variables, request timeouts, and API key resolution.

use std::time::Duration;

use crate::error::{ConfigError, FatebookMcpError, Result};

/// Environment variable holding the process-wide API key
pub const API_KEY_VAR: &str = "FATEBOOK_API_KEY";

/// Environment variable overriding the API base URL
pub const API_URL_VAR: &str = "FATEBOOK_API_URL";

/// Environment variable holding the request timeout in seconds
pub const TIMEOUT_VAR: &str = "FATEBOOK_TIMEOUT_SECS";

/// Environment variable holding the connect timeout in seconds
pub const CONNECT_TIMEOUT_VAR: &str = "FATEBOOK_CONNECT_TIMEOUT_SECS";

/// Configuration for the Fatebook MCP Server
#[derive(Clone)]
pub struct Config {
    /// Default API key, used when a tool call does not carry its own
    pub api_key: Option<String>,

    /// Base URL of the Fatebook API
    pub base_url: String,

    /// Upper bound on a whole request, including reading the body
    pub request_timeout: Duration,

    /// Upper bound on establishing the connection
    pub connect_timeout: Duration,
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty());

        let base_url = std::env::var(API_URL_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| fatebook::API_BASE_URL.to_string());

        let request_timeout = read_secs(TIMEOUT_VAR, fatebook::DEFAULT_TIMEOUT_SECS)?;
        let connect_timeout =
            read_secs(CONNECT_TIMEOUT_VAR, fatebook::DEFAULT_CONNECT_TIMEOUT_SECS)?;

        Ok(Self {
            api_key,
            base_url,
            request_timeout,
            connect_timeout,
        })
    }

    /// Replace the base URL (trailing slashes are dropped)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the default API key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: fatebook::API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(fatebook::DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(fatebook::DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

// The API key is never printed.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn read_secs(var: &str, default: u64) -> Result<Duration> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                FatebookMcpError::Config(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    message: format!("expected a whole number of seconds, got '{}'", raw),
                })
            })?;
            if secs == 0 {
                return Err(FatebookMcpError::Config(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    message: "timeout must be greater than zero".to_string(),
                }));
            }
            Ok(Duration::from_secs(secs))
        }
        _ => Ok(Duration::from_secs(default)),
    }
}

/// Resolve the API key for one invocation.
///
/// A non-blank key passed with the call wins over the process-wide default.
/// Blank values on either side count as absent.
pub fn resolve_api_key(
    operation: &str,
    explicit: Option<&str>,
    process_default: Option<&str>,
) -> Result<String> {
    explicit
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .or_else(|| process_default.map(str::trim).filter(|key| !key.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| FatebookMcpError::MissingCredential {
            operation: operation.to_string(),
        })
}

/// Fatebook API constants
pub mod fatebook {
    /// Base URL for the Fatebook API
    pub const API_BASE_URL: &str = "https://fatebook.io/api/v0";

    /// Public site, used to build question links
    pub const SITE_URL: &str = "https://fatebook.io";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}
