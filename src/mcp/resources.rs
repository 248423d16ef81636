//! MCP resources
//!
//! Questions are readable as `question://{question_id}` resources, fetched
//! with the process-wide API key.

use std::sync::Arc;

use crate::error::{FatebookMcpError, McpError, Result};
use crate::fatebook::client::FatebookClient;
use crate::fatebook::requests::{FatebookRequest, GetQuestionArgs};
use crate::mcp::types::{ReadResourceResult, ResourceContent, ResourceTemplate};

/// URI scheme for question resources
pub const QUESTION_SCHEME: &str = "question://";

/// Template advertised to clients
pub const QUESTION_TEMPLATE: &str = "question://{question_id}";

const JSON_MIME: &str = "application/json";

/// Resource handler
pub struct ResourceHandler {
    client: Arc<FatebookClient>,
}

impl ResourceHandler {
    pub fn new(client: Arc<FatebookClient>) -> Self {
        Self { client }
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            uri_template: QUESTION_TEMPLATE.to_string(),
            name: "question".to_string(),
            description: Some(
                "A Fatebook question with its forecasts, comments and tags".to_string(),
            ),
            mime_type: Some(JSON_MIME.to_string()),
        }]
    }

    /// Read a question resource
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult> {
        let question_id = parse_question_uri(uri)?;

        let request = FatebookRequest::GetQuestion(GetQuestionArgs {
            question_id,
            api_key: None,
        });
        let text = self.client.execute(&request).await?.into_text();

        Ok(ReadResourceResult {
            contents: vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: Some(JSON_MIME.to_string()),
                text: Some(text),
            }],
        })
    }
}

/// Extract the question id from `question://{question_id}`
pub fn parse_question_uri(uri: &str) -> Result<String> {
    let unknown = || {
        FatebookMcpError::Mcp(McpError::UnknownResource {
            uri: uri.to_string(),
        })
    };

    let raw = uri.strip_prefix(QUESTION_SCHEME).ok_or_else(unknown)?;
    let raw = raw.trim_end_matches('/');
    if raw.is_empty() || raw.contains('/') {
        return Err(unknown());
    }

    let id = urlencoding::decode(raw).map_err(|_| unknown())?;
    Ok(id.into_owned())
}
