//! Fatebook requests
//!
//! Every operation the server exposes is one variant of [`FatebookRequest`],
//! carrying its own argument record. A request knows how to validate itself,
//! which endpoint it targets, how to build the outbound HTTP call, and how to
//! project the response body into a tool result. None of this touches the
//! network, so the whole contract can be exercised offline.

use reqwest::Method;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{FatebookApiError, FatebookMcpError, McpError, Result, ValidationError};
use crate::fatebook::types::*;
use crate::fatebook::utils::{
    question_id_from_url, question_url, validate_calendar_date, validate_not_blank,
};

/// Tool names, in catalogue order
pub mod tool_names {
    pub const LIST_QUESTIONS: &str = "list_questions";
    pub const CREATE_QUESTION: &str = "create_question";
    pub const GET_QUESTION: &str = "get_question";
    pub const ADD_FORECAST: &str = "add_forecast";
    pub const ADD_COMMENT: &str = "add_comment";
    pub const RESOLVE_QUESTION: &str = "resolve_question";
    pub const EDIT_QUESTION: &str = "edit_question";
    pub const DELETE_QUESTION: &str = "delete_question";
    pub const SET_VISIBILITY: &str = "set_visibility";
    pub const COUNT_FORECASTS: &str = "count_forecasts";

    pub const ALL: [&str; 10] = [
        LIST_QUESTIONS,
        CREATE_QUESTION,
        GET_QUESTION,
        ADD_FORECAST,
        ADD_COMMENT,
        RESOLVE_QUESTION,
        EDIT_QUESTION,
        DELETE_QUESTION,
        SET_VISIBILITY,
        COUNT_FORECASTS,
    ];
}

/// Fatebook API endpoints (relative to the base URL)
pub mod endpoints {
    pub const GET_QUESTIONS: &str = "getQuestions";
    pub const CREATE_QUESTION: &str = "createQuestion";
    pub const GET_QUESTION: &str = "getQuestion";
    pub const RESOLVE_QUESTION: &str = "resolveQuestion";
    pub const ADD_FORECAST: &str = "addForecast";
    pub const ADD_COMMENT: &str = "addComment";
    pub const EDIT_QUESTION: &str = "editQuestion";
    pub const DELETE_QUESTION: &str = "deleteQuestion";
    pub const SET_SHARED_PUBLICLY: &str = "setSharedPublicly";
    pub const COUNT_FORECASTS: &str = "countForecasts";
}

/// Confirmation text returned by write operations
pub const CONFIRMATION: &str = "true";

// ==================== Argument Records ====================

/// Arguments for list_questions
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsArgs {
    /// Only return resolved questions
    pub resolved: Option<bool>,

    /// Only return unresolved questions
    pub unresolved: Option<bool>,

    /// Text to search for in question titles
    pub search_string: Option<String>,

    /// Maximum number of questions to return
    #[validate(range(min = 1))]
    pub limit: Option<u32>,

    /// Pagination cursor from a previous call
    pub cursor: Option<String>,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for create_question
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionArgs {
    /// Question title
    #[validate(custom = "validate_not_blank")]
    pub title: String,

    /// Resolution date (YYYY-MM-DD)
    #[validate(custom = "validate_calendar_date")]
    pub resolve_by: String,

    /// Initial forecast probability between 0 and 1
    #[validate(range(min = 0.0, max = 1.0))]
    pub forecast: f64,

    /// Tags to attach to the question
    pub tags: Option<Vec<String>>,

    /// Make the question visible to anyone with the link
    pub share_publicly: Option<bool>,

    /// Names of lists to share the question with
    pub share_with_lists: Option<Vec<String>>,

    /// Email addresses to share the question with
    pub share_with_email: Option<Vec<String>>,

    /// Hide other forecasts until this date (YYYY-MM-DD)
    #[validate(custom = "validate_calendar_date")]
    pub hide_forecasts_until: Option<String>,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for get_question
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetQuestionArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for add_forecast
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddForecastArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// Forecast probability between 0 and 1
    #[validate(range(min = 0.0, max = 1.0))]
    pub forecast: f64,

    /// Option to forecast on (multiple choice questions)
    #[validate(custom = "validate_not_blank")]
    pub option_id: Option<String>,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for add_comment
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// Comment text
    #[validate(custom = "validate_not_blank")]
    pub comment: String,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for resolve_question
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuestionArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// YES, NO or AMBIGUOUS for binary questions; an option id for multiple choice
    pub resolution: String,

    /// Type of the question being resolved
    pub question_type: QuestionType,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

impl ResolveQuestionArgs {
    /// The resolution as it will be sent, or why it is not allowed
    pub fn normalized_resolution(&self) -> Result<String> {
        let raw = self.resolution.trim();
        let invalid = |message: String| FatebookMcpError::invalid_parameter("resolution", message);

        match self.question_type {
            QuestionType::Binary => {
                let upper = raw.to_ascii_uppercase();
                match upper.as_str() {
                    "YES" | "NO" | "AMBIGUOUS" => Ok(upper),
                    _ => Err(invalid(format!(
                        "'{}' is not valid for a {} question (expected YES, NO or AMBIGUOUS)",
                        self.resolution,
                        self.question_type.as_str()
                    ))),
                }
            }
            QuestionType::MultipleChoice => {
                if raw.is_empty() {
                    Err(invalid(format!(
                        "an option id is required for a {} question",
                        self.question_type.as_str()
                    )))
                } else {
                    Ok(raw.to_string())
                }
            }
            QuestionType::Numeric => {
                if raw.eq_ignore_ascii_case("AMBIGUOUS") {
                    Ok("AMBIGUOUS".to_string())
                } else if raw.parse::<f64>().map_or(false, f64::is_finite) {
                    Ok(raw.to_string())
                } else {
                    Err(invalid(format!(
                        "'{}' is not valid for a {} question (expected a number or AMBIGUOUS)",
                        self.resolution,
                        self.question_type.as_str()
                    )))
                }
            }
        }
    }
}

/// Arguments for edit_question
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditQuestionArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// New title
    #[validate(custom = "validate_not_blank")]
    pub title: Option<String>,

    /// New resolution date (YYYY-MM-DD)
    #[validate(custom = "validate_calendar_date")]
    pub resolve_by: Option<String>,

    /// New notes
    pub notes: Option<String>,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for delete_question
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuestionArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for set_visibility
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetVisibilityArgs {
    /// ID of the question
    #[validate(custom = "validate_not_blank")]
    pub question_id: String,

    /// Whether anyone with the link can view the question
    pub shared_publicly: bool,

    /// Keep the question out of public listings. Omitting it sends false, which
    /// makes an unlisted question listed again; pass true to keep it unlisted.
    pub unlisted: Option<bool>,

    /// Fatebook API key (defaults to FATEBOOK_API_KEY)
    pub api_key: Option<String>,
}

/// Arguments for count_forecasts
#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CountForecastsArgs {
    /// ID of the user whose forecasts to count
    #[validate(custom = "validate_not_blank")]
    pub user_id: String,
}

// ==================== Requests ====================

/// One tool invocation, decoded
#[derive(Debug, Clone)]
pub enum FatebookRequest {
    ListQuestions(ListQuestionsArgs),
    CreateQuestion(CreateQuestionArgs),
    GetQuestion(GetQuestionArgs),
    AddForecast(AddForecastArgs),
    AddComment(AddCommentArgs),
    ResolveQuestion(ResolveQuestionArgs),
    EditQuestion(EditQuestionArgs),
    DeleteQuestion(DeleteQuestionArgs),
    SetVisibility(SetVisibilityArgs),
    CountForecasts(CountForecastsArgs),
}

/// An outbound HTTP call, fully described
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, endpoint: &'static str) -> Self {
        Self {
            method,
            endpoint,
            query: Vec::new(),
            body: None,
        }
    }

    fn query(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    fn query_opt(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(name, value),
            None => self,
        }
    }

    fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Full URL including the encoded query string
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}/{}", base_url.trim_end_matches('/'), self.endpoint);
        for (i, (name, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Look up a query parameter
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Result of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Structured result
    Json(Value),

    /// Plain confirmation text
    Text(String),
}

impl ToolOutput {
    /// Render as the text handed back to the host
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text,
        }
    }
}

impl FatebookRequest {
    /// Decode the arguments of a named tool call
    pub fn from_tool_call(name: &str, args: Value) -> Result<Self> {
        let args = match args {
            Value::Null => json!({}),
            other => other,
        };

        let request = match name {
            tool_names::LIST_QUESTIONS => Self::ListQuestions(parse_args(args)?),
            tool_names::CREATE_QUESTION => Self::CreateQuestion(parse_args(args)?),
            tool_names::GET_QUESTION => Self::GetQuestion(parse_args(args)?),
            tool_names::ADD_FORECAST => Self::AddForecast(parse_args(args)?),
            tool_names::ADD_COMMENT => Self::AddComment(parse_args(args)?),
            tool_names::RESOLVE_QUESTION => Self::ResolveQuestion(parse_args(args)?),
            tool_names::EDIT_QUESTION => Self::EditQuestion(parse_args(args)?),
            tool_names::DELETE_QUESTION => Self::DeleteQuestion(parse_args(args)?),
            tool_names::SET_VISIBILITY => Self::SetVisibility(parse_args(args)?),
            tool_names::COUNT_FORECASTS => Self::CountForecasts(parse_args(args)?),
            _ => {
                return Err(FatebookMcpError::Mcp(McpError::UnknownTool {
                    name: name.to_string(),
                }))
            }
        };

        Ok(request)
    }

    /// Name of the tool this request came from
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ListQuestions(_) => tool_names::LIST_QUESTIONS,
            Self::CreateQuestion(_) => tool_names::CREATE_QUESTION,
            Self::GetQuestion(_) => tool_names::GET_QUESTION,
            Self::AddForecast(_) => tool_names::ADD_FORECAST,
            Self::AddComment(_) => tool_names::ADD_COMMENT,
            Self::ResolveQuestion(_) => tool_names::RESOLVE_QUESTION,
            Self::EditQuestion(_) => tool_names::EDIT_QUESTION,
            Self::DeleteQuestion(_) => tool_names::DELETE_QUESTION,
            Self::SetVisibility(_) => tool_names::SET_VISIBILITY,
            Self::CountForecasts(_) => tool_names::COUNT_FORECASTS,
        }
    }

    /// countForecasts is the only public endpoint
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::CountForecasts(_))
    }

    /// API key passed with the call, if any
    pub fn explicit_api_key(&self) -> Option<&str> {
        match self {
            Self::ListQuestions(a) => a.api_key.as_deref(),
            Self::CreateQuestion(a) => a.api_key.as_deref(),
            Self::GetQuestion(a) => a.api_key.as_deref(),
            Self::AddForecast(a) => a.api_key.as_deref(),
            Self::AddComment(a) => a.api_key.as_deref(),
            Self::ResolveQuestion(a) => a.api_key.as_deref(),
            Self::EditQuestion(a) => a.api_key.as_deref(),
            Self::DeleteQuestion(a) => a.api_key.as_deref(),
            Self::SetVisibility(a) => a.api_key.as_deref(),
            Self::CountForecasts(_) => None,
        }
    }

    /// Check arguments before anything is sent
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ListQuestions(a) => check(a),
            Self::CreateQuestion(a) => check(a),
            Self::GetQuestion(a) => check(a),
            Self::AddForecast(a) => check(a),
            Self::AddComment(a) => check(a),
            Self::ResolveQuestion(a) => {
                check(a)?;
                a.normalized_resolution().map(|_| ())
            }
            Self::EditQuestion(a) => {
                check(a)?;
                if a.title.is_none() && a.resolve_by.is_none() && a.notes.is_none() {
                    return Err(FatebookMcpError::Validation(ValidationError::MissingField {
                        field: "title, resolveBy or notes".to_string(),
                    }));
                }
                Ok(())
            }
            Self::DeleteQuestion(a) => check(a),
            Self::SetVisibility(a) => check(a),
            Self::CountForecasts(a) => check(a),
        }
    }

    /// Build the HTTP call. `api_key` must be present for every request
    /// except count_forecasts.
    pub fn build(&self, api_key: Option<&str>) -> Result<ApiRequest> {
        let key = || {
            api_key.ok_or_else(|| FatebookMcpError::MissingCredential {
                operation: self.tool_name().to_string(),
            })
        };

        let request = match self {
            Self::ListQuestions(a) => ApiRequest::new(Method::GET, endpoints::GET_QUESTIONS)
                .query("apiKey", key()?)
                .query_opt("resolved", a.resolved)
                .query_opt("unresolved", a.unresolved)
                .query_opt("searchString", a.search_string.as_deref())
                .query_opt("limit", a.limit)
                .query_opt("cursor", a.cursor.as_deref()),
            Self::CreateQuestion(a) => {
                let body = CreateQuestionRequest {
                    api_key: key()?,
                    title: a.title.trim(),
                    resolve_by: a.resolve_by.trim(),
                    forecast: a.forecast,
                    tags: a.tags.as_deref(),
                    share_publicly: a.share_publicly,
                    share_with_lists: a.share_with_lists.as_deref(),
                    share_with_email: a.share_with_email.as_deref(),
                    hide_forecasts_until: a.hide_forecasts_until.as_deref().map(str::trim),
                };
                ApiRequest::new(Method::POST, endpoints::CREATE_QUESTION)
                    .body(serde_json::to_value(body)?)
            }
            Self::GetQuestion(a) => ApiRequest::new(Method::GET, endpoints::GET_QUESTION)
                .query("apiKey", key()?)
                .query("questionId", a.question_id.trim()),
            Self::AddForecast(a) => {
                let body = AddForecastRequest {
                    question_id: a.question_id.trim(),
                    forecast: a.forecast,
                    api_key: key()?,
                    option_id: a.option_id.as_deref().map(str::trim),
                };
                ApiRequest::new(Method::POST, endpoints::ADD_FORECAST)
                    .body(serde_json::to_value(body)?)
            }
            Self::AddComment(a) => {
                let body = AddCommentRequest {
                    question_id: a.question_id.trim(),
                    comment: &a.comment,
                    api_key: key()?,
                };
                ApiRequest::new(Method::POST, endpoints::ADD_COMMENT)
                    .body(serde_json::to_value(body)?)
            }
            Self::ResolveQuestion(a) => {
                let resolution = a.normalized_resolution()?;
                let body = ResolveQuestionRequest {
                    question_id: a.question_id.trim(),
                    resolution: &resolution,
                    question_type: a.question_type,
                    api_key: key()?,
                };
                ApiRequest::new(Method::POST, endpoints::RESOLVE_QUESTION)
                    .body(serde_json::to_value(body)?)
            }
            Self::EditQuestion(a) => {
                let body = EditQuestionRequest {
                    question_id: a.question_id.trim(),
                    api_key: key()?,
                    title: a.title.as_deref().map(str::trim),
                    resolve_by: a.resolve_by.as_deref().map(str::trim),
                    notes: a.notes.as_deref(),
                };
                ApiRequest::new(Method::PATCH, endpoints::EDIT_QUESTION)
                    .body(serde_json::to_value(body)?)
            }
            Self::DeleteQuestion(a) => ApiRequest::new(Method::DELETE, endpoints::DELETE_QUESTION)
                .query("questionId", a.question_id.trim())
                .query("apiKey", key()?),
            Self::SetVisibility(a) => {
                let body = SetSharedPubliclyRequest {
                    question_id: a.question_id.trim(),
                    shared_publicly: a.shared_publicly,
                    unlisted: a.unlisted.unwrap_or(false),
                    api_key: key()?,
                };
                ApiRequest::new(Method::PATCH, endpoints::SET_SHARED_PUBLICLY)
                    .body(serde_json::to_value(body)?)
            }
            Self::CountForecasts(a) => ApiRequest::new(Method::GET, endpoints::COUNT_FORECASTS)
                .query("userId", a.user_id.trim()),
        };

        Ok(request)
    }

    /// Turn a successful response body into the tool result
    pub fn project(&self, body: &str) -> Result<ToolOutput> {
        match self {
            Self::ListQuestions(_) => {
                let response: QuestionsResponse = parse_body(self.tool_name(), body)?;
                let list = QuestionsList {
                    result: response.items,
                    cursor: response.cursor,
                };
                Ok(ToolOutput::Json(serde_json::to_value(list)?))
            }
            Self::CreateQuestion(a) => {
                let reference = parse_created_question(body, a.title.trim())?;
                Ok(ToolOutput::Json(serde_json::to_value(reference)?))
            }
            Self::GetQuestion(a) => {
                let mut question: Question = parse_body(self.tool_name(), body)?;
                if question.id.is_none() {
                    question.id = Some(a.question_id.trim().to_string());
                }
                Ok(ToolOutput::Json(serde_json::to_value(question)?))
            }
            Self::CountForecasts(_) => {
                let count = parse_forecast_count(body)?;
                Ok(ToolOutput::Json(json!(count)))
            }
            Self::AddForecast(_)
            | Self::AddComment(_)
            | Self::ResolveQuestion(_)
            | Self::EditQuestion(_)
            | Self::DeleteQuestion(_)
            | Self::SetVisibility(_) => Ok(ToolOutput::Text(CONFIRMATION.to_string())),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| {
        FatebookMcpError::Validation(ValidationError::InvalidArguments {
            message: e.to_string(),
        })
    })
}

fn parse_body<T: serde::de::DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        FatebookMcpError::Api(FatebookApiError::UnexpectedResponse {
            message: format!("{} returned a payload that could not be read: {}", operation, e),
        })
    })
}

/// Run the derived validators and report the first failing field
fn check<T: Validate>(args: &T) -> Result<()> {
    let errors = match args.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| *name);

    let (field, message) = fields
        .first()
        .and_then(|(name, errs)| errs.first().map(|err| (camel_case(name), describe(err))))
        .unwrap_or_else(|| ("arguments".to_string(), errors.to_string()));

    Err(FatebookMcpError::invalid_parameter(field, message))
}

fn describe(err: &validator::ValidationError) -> String {
    if let Some(message) = &err.message {
        return message.to_string();
    }
    match &*err.code {
        "range" => match (err.params.get("min"), err.params.get("max")) {
            (Some(min), Some(max)) => format!("must be between {} and {}", min, max),
            (Some(min), None) => format!("must be at least {}", min),
            (None, Some(max)) => format!("must be at most {}", max),
            (None, None) => "out of range".to_string(),
        },
        code => format!("failed the {} check", code),
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// createQuestion answers with the question link, either bare or inside a
/// JSON object
fn parse_created_question(body: &str, title: &str) -> Result<QuestionReference> {
    let unexpected = || {
        FatebookMcpError::Api(FatebookApiError::UnexpectedResponse {
            message: format!("create_question returned no question id: {}", body.trim()),
        })
    };

    let (id, url, title) = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let url = map.get("url").and_then(Value::as_str).map(str::to_string);
            let id = match map.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => url.as_deref().and_then(question_id_from_url),
            };
            let title = map
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(title)
                .to_string();
            (id, url, title)
        }
        Ok(Value::String(url)) => (question_id_from_url(&url), Some(url), title.to_string()),
        _ => {
            let url = body.trim().to_string();
            (question_id_from_url(&url), Some(url), title.to_string())
        }
    };

    let id = id.ok_or_else(unexpected)?;
    let url = url.unwrap_or_else(|| question_url(&title, &id));

    Ok(QuestionReference { id, title, url })
}

/// countForecasts answers with either a bare number or an object holding it
fn parse_forecast_count(body: &str) -> Result<u64> {
    let value: Value = serde_json::from_str(body.trim()).map_err(|e| {
        FatebookMcpError::Api(FatebookApiError::UnexpectedResponse {
            message: format!("count_forecasts returned a non-JSON payload: {}", e),
        })
    })?;

    let count = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => ["numberOfForecasts", "count", "forecastCount"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_u64)),
        _ => None,
    };

    count.ok_or_else(|| {
        FatebookMcpError::Api(FatebookApiError::UnexpectedResponse {
            message: format!("count_forecasts returned no count: {}", value),
        })
    })
}
