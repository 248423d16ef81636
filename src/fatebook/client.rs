//! Fatebook API client
//!
//! Runs one request through validate → resolve key → build → send → classify → project.
//! Every call is a single attempt with a bounded timeout; nothing is cached
//! between calls.

use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use serde_json::Value;

use crate::config::{resolve_api_key, Config};
use crate::error::{ConfigError, FatebookApiError, FatebookMcpError, Result};
use crate::fatebook::requests::{ApiRequest, FatebookRequest, ToolOutput};

/// Fatebook API client
pub struct FatebookClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API base URL, without a trailing slash
    base_url: String,

    /// Process-wide API key, read once at startup
    default_api_key: Option<String>,
}

impl FatebookClient {
    /// Create a new Fatebook client
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("fatebook-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                FatebookMcpError::Config(ConfigError::InvalidConfig {
                    message: format!("Failed to create HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_api_key: config.api_key.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a process-wide API key is configured
    pub fn has_default_api_key(&self) -> bool {
        self.default_api_key.is_some()
    }

    /// Execute one request
    pub async fn execute(&self, request: &FatebookRequest) -> Result<ToolOutput> {
        let operation = request.tool_name();

        request.validate()?;

        let api_key = if request.requires_api_key() {
            Some(resolve_api_key(
                operation,
                request.explicit_api_key(),
                self.default_api_key.as_deref(),
            )?)
        } else {
            None
        };

        let api_request = request.build(api_key.as_deref())?;
        let body = self.send(operation, &api_request).await?;

        request.project(&body)
    }

    /// Send the HTTP call and return the body of a successful response
    async fn send(&self, operation: &str, api_request: &ApiRequest) -> Result<String> {
        // The URL carries the API key for GET and DELETE calls; only the
        // endpoint is logged.
        let url = api_request.url(&self.base_url);

        tracing::debug!(
            operation,
            method = %api_request.method,
            endpoint = api_request.endpoint,
            "Sending Fatebook request"
        );

        let mut builder = self.http_client.request(api_request.method.clone(), &url);
        if let Some(body) = &api_request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            let err = FatebookMcpError::from(e);
            tracing::warn!(operation, error = %err, "Fatebook request failed");
            err
        })?;

        let status = response.status();
        tracing::debug!(operation, status = status.as_u16(), "Fatebook responded");

        if status.is_success() {
            Ok(response.text().await?)
        } else {
            let err = classify_failure(response).await;
            tracing::warn!(operation, status = status.as_u16(), error = %err, "Fatebook rejected request");
            Err(err)
        }
    }
}

/// Map a non-success response onto the error taxonomy
async fn classify_failure(response: Response) -> FatebookMcpError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok());
    let text = response.text().await.unwrap_or_default();

    classify_status(status, retry_after_secs, &text)
}

/// Map a status code and body onto the error taxonomy
pub fn classify_status(
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> FatebookMcpError {
    let message = server_message(status, body);
    let code = status.as_u16();

    let api_error = match code {
        401 | 403 => FatebookApiError::Unauthorized {
            status: code,
            message,
        },
        404 => FatebookApiError::NotFound { message },
        400 | 422 => FatebookApiError::InvalidRequest {
            status: code,
            message,
        },
        429 => FatebookApiError::RateLimited {
            retry_after_secs,
            message,
        },
        500..=599 => FatebookApiError::Server {
            status: code,
            message,
        },
        _ => FatebookApiError::RequestFailed {
            status: code,
            message,
        },
    };

    FatebookMcpError::Api(api_error)
}

/// Prefer the service's own explanation, then the raw body, then the reason phrase
fn server_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message", "detail"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(s)) = inner.get("message") {
                        return s.clone();
                    }
                }
                _ => {}
            }
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.to_string()
    }
}
