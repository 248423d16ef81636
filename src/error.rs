//! Error types for the Fatebook MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Fatebook MCP Server
#[derive(Error, Debug)]
pub enum FatebookMcpError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Argument errors caught before any request is sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Neither the call nor the process environment supplied an API key
    #[error("Missing API key for {operation}: pass apiKey or set FATEBOOK_API_KEY")]
    MissingCredential { operation: String },

    /// Fatebook API errors (the service answered with a non-success status)
    #[error("Fatebook API error: {0}")]
    Api(#[from] FatebookApiError),

    /// Timeouts, DNS failures, refused connections
    #[error("Network error: {}{message}", timeout_hint(.timed_out))]
    Transport { message: String, timed_out: bool },

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatebook API errors, one per class of HTTP failure
#[derive(Error, Debug)]
pub enum FatebookApiError {
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("not found (404): {message}")]
    NotFound { message: String },

    #[error("rejected request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("rate limited (429{}): {message}", retry_hint(.retry_after_secs))]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

fn timeout_hint(timed_out: &bool) -> &'static str {
    if *timed_out {
        "request timed out: "
    } else {
        ""
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {} seconds", secs),
        None => String::new(),
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidEnvVar { var: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid parameter: {name} - {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Unknown resource: {uri}")]
    UnknownResource { uri: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },
}

/// Stable label for each class of failure, surfaced to the calling agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalValidation,
    MissingCredential,
    Network,
    RemoteAuth,
    RemoteNotFound,
    RemoteValidation,
    RateLimited,
    ServerError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LocalValidation => "local_validation",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::Network => "network",
            ErrorKind::RemoteAuth => "remote_auth",
            ErrorKind::RemoteNotFound => "remote_not_found",
            ErrorKind::RemoteValidation => "remote_validation",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FatebookMcpError {
    /// Classify this error for the caller
    pub fn kind(&self) -> ErrorKind {
        match self {
            FatebookMcpError::Validation(_) => ErrorKind::LocalValidation,
            FatebookMcpError::MissingCredential { .. } => ErrorKind::MissingCredential,
            FatebookMcpError::Transport { .. } => ErrorKind::Network,
            FatebookMcpError::Api(api) => match api {
                FatebookApiError::Unauthorized { .. } => ErrorKind::RemoteAuth,
                FatebookApiError::NotFound { .. } => ErrorKind::RemoteNotFound,
                FatebookApiError::InvalidRequest { .. } => ErrorKind::RemoteValidation,
                FatebookApiError::RateLimited { .. } => ErrorKind::RateLimited,
                FatebookApiError::Server { .. } => ErrorKind::ServerError,
                FatebookApiError::RequestFailed { .. }
                | FatebookApiError::UnexpectedResponse { .. } => ErrorKind::Internal,
            },
            FatebookMcpError::Mcp(McpError::UnknownTool { .. })
            | FatebookMcpError::Mcp(McpError::InvalidParams { .. }) => ErrorKind::LocalValidation,
            FatebookMcpError::Mcp(_)
            | FatebookMcpError::Config(_)
            | FatebookMcpError::Io(_)
            | FatebookMcpError::Json(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status attached to a remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FatebookMcpError::Api(FatebookApiError::Unauthorized { status, .. })
            | FatebookMcpError::Api(FatebookApiError::InvalidRequest { status, .. })
            | FatebookMcpError::Api(FatebookApiError::Server { status, .. })
            | FatebookMcpError::Api(FatebookApiError::RequestFailed { status, .. }) => {
                Some(*status)
            }
            FatebookMcpError::Api(FatebookApiError::NotFound { .. }) => Some(404),
            FatebookMcpError::Api(FatebookApiError::RateLimited { .. }) => Some(429),
            _ => None,
        }
    }

    /// Shorthand for a parameter validation failure
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        FatebookMcpError::Validation(ValidationError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        })
    }
}

/// Transport failures are rendered without the request URL, which carries
/// the API key in its query string.
impl From<reqwest::Error> for FatebookMcpError {
    fn from(err: reqwest::Error) -> Self {
        FatebookMcpError::Transport {
            timed_out: err.is_timeout(),
            message: err.without_url().to_string(),
        }
    }
}

/// Result type alias for Fatebook MCP operations
pub type Result<T> = std::result::Result<T, FatebookMcpError>;
