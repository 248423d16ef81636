//! Fatebook API type definitions
//!
//! These types mirror the Fatebook API payloads and are used for serialization/deserialization.
//! Absent fields are skipped on output so tool results stay compact.

use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[default]
    Binary,
    Numeric,
    MultipleChoice,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Binary => "BINARY",
            QuestionType::Numeric => "NUMERIC",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
        }
    }
}

/// User attached to a forecast or comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,
}

/// Tag used to categorize questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    pub name: String,
}

/// A forecast made on a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Probability between 0 and 1 (sent as a number or a decimal string)
    #[serde(deserialize_with = "number_or_numeric_string")]
    pub forecast: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Option the forecast applies to (multiple choice questions)
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub option_id: Option<String>,
}

/// A comment on a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    pub comment: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A Fatebook question
///
/// List responses carry a subset of these fields; `getQuestion` fills in the
/// forecasts, comments and visibility settings but omits the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    pub title: String,

    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    #[serde(default)]
    pub resolved: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,

    /// YES, NO, AMBIGUOUS, or an option id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecasts: Option<Vec<Forecast>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_publicly: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlisted: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_forecasts_until: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_lists: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_email: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_latest_prediction: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_scores: Option<Vec<Value>>,
}

/// Response from the getQuestions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsResponse {
    #[serde(default)]
    pub items: Vec<Question>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Result of list_questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsList {
    pub result: Vec<Question>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Minimal reference to a newly created question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReference {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Body of a createQuestion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest<'a> {
    pub api_key: &'a str,
    pub title: &'a str,
    pub resolve_by: &'a str,
    pub forecast: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a [String]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_publicly: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_lists: Option<&'a [String]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_email: Option<&'a [String]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_forecasts_until: Option<&'a str>,
}

/// Body of a resolveQuestion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuestionRequest<'a> {
    pub question_id: &'a str,
    pub resolution: &'a str,
    pub question_type: QuestionType,
    pub api_key: &'a str,
}

/// Body of an addForecast request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddForecastRequest<'a> {
    pub question_id: &'a str,
    pub forecast: f64,
    pub api_key: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<&'a str>,
}

/// Body of an addComment request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCommentRequest<'a> {
    pub question_id: &'a str,
    pub comment: &'a str,
    pub api_key: &'a str,
}

/// Body of an editQuestion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditQuestionRequest<'a> {
    pub question_id: &'a str,
    pub api_key: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_by: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
}

/// Body of a setSharedPublicly request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSharedPubliclyRequest<'a> {
    pub question_id: &'a str,
    pub shared_publicly: bool,
    pub unlisted: bool,
    pub api_key: &'a str,
}

/// Accept ids sent either as strings or as numbers, and keep them as strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or numeric id, got {}",
            other
        ))),
    }
}

/// Accept probabilities sent either as numbers or as decimal strings such as "0.70"
fn number_or_numeric_string<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| de::Error::custom(format!("forecast {} is out of range", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| de::Error::custom(format!("expected a numeric forecast, got \"{}\"", s))),
        other => Err(de::Error::custom(format!(
            "expected a numeric forecast, got {}",
            other
        ))),
    }
}
