//! MCP Tool definitions and handlers
//!
//! Defines all available tools and dispatches calls to the Fatebook client.

use std::sync::Arc;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde_json::Value;

use crate::fatebook::client::FatebookClient;
use crate::fatebook::requests::*;
use crate::mcp::types::{CallToolResult, Tool};

/// Tool handler
pub struct ToolHandler {
    client: Arc<FatebookClient>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(client: Arc<FatebookClient>) -> Self {
        Self { client }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        tool_catalogue()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let request = match FatebookRequest::from_tool_call(name, args) {
            Ok(request) => request,
            Err(e) => return CallToolResult::failure(name, &e),
        };

        match self.client.execute(&request).await {
            Ok(output) => CallToolResult::text(output.into_text()),
            Err(e) => {
                tracing::debug!(tool = name, kind = %e.kind(), "Tool call failed");
                CallToolResult::failure(name, &e)
            }
        }
    }
}

/// Every tool with its generated input schema
pub fn tool_catalogue() -> Vec<Tool> {
    vec![
        tool_def::<ListQuestionsArgs>(
            tool_names::LIST_QUESTIONS,
            "Lists your Fatebook questions, optionally filtered by resolution state or search text",
        ),
        tool_def::<CreateQuestionArgs>(
            tool_names::CREATE_QUESTION,
            "Creates a new Fatebook question with an initial forecast; returns its id, title and url",
        ),
        tool_def::<GetQuestionArgs>(
            tool_names::GET_QUESTION,
            "Retrieves a question with its forecasts, comments, tags and visibility settings",
        ),
        tool_def::<AddForecastArgs>(
            tool_names::ADD_FORECAST,
            "Adds a forecast (probability between 0 and 1) to a question",
        ),
        tool_def::<AddCommentArgs>(tool_names::ADD_COMMENT, "Adds a comment to a question"),
        tool_def::<ResolveQuestionArgs>(
            tool_names::RESOLVE_QUESTION,
            "Resolves a question as YES, NO or AMBIGUOUS (or an option id for multiple choice)",
        ),
        tool_def::<EditQuestionArgs>(
            tool_names::EDIT_QUESTION,
            "Updates the title, resolution date or notes of a question",
        ),
        tool_def::<DeleteQuestionArgs>(tool_names::DELETE_QUESTION, "Deletes a question"),
        tool_def::<SetVisibilityArgs>(
            tool_names::SET_VISIBILITY,
            "Changes whether a question is shared publicly and whether it is unlisted. \
             unlisted defaults to false, so pass unlisted: true to keep an unlisted question hidden",
        ),
        tool_def::<CountForecastsArgs>(
            tool_names::COUNT_FORECASTS,
            "Counts the forecasts a user has made (no API key needed)",
        ),
    ]
}

fn tool_def<T: JsonSchema>(name: &str, description: &str) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: input_schema::<T>(),
    }
}

/// JSON Schema for an argument record, with subschemas inlined
fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| {
        serde_json::json!({"type": "object"})
    });
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    value
}
