//! Fatebook utility functions
//!
//! Argument checks shared by the request records, and helpers for question links.

use chrono::{DateTime, NaiveDate};

use crate::config::fatebook::SITE_URL;

/// Reject empty and whitespace-only strings (used by `#[validate(custom)]`)
pub fn validate_not_blank(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("must not be empty or whitespace".into());
        return Err(err);
    }
    Ok(())
}

/// Accept `YYYY-MM-DD` or a full RFC 3339 timestamp (used by `#[validate(custom)]`)
pub fn validate_calendar_date(value: &str) -> std::result::Result<(), validator::ValidationError> {
    if parse_calendar_date(value).is_none() {
        let mut err = validator::ValidationError::new("date");
        err.message = Some(format!("'{}' is not a calendar date (expected YYYY-MM-DD)", value).into());
        return Err(err);
    }
    Ok(())
}

/// Parse a calendar date, ignoring any time component
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Extract the question id from a link such as
/// `https://fatebook.io/q/will-it-rain--clx123abc`
pub fn question_id_from_url(url: &str) -> Option<String> {
    let path = url.trim().split(['?', '#']).next()?;
    let last = path.trim_end_matches('/').rsplit('/').next()?;
    let id = last.rsplit("--").next()?;
    if id.is_empty() || (id == last && !path.contains("/q/")) {
        return None;
    }
    Some(id.to_string())
}

/// Build the public link for a question
pub fn question_url(title: &str, id: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        format!("{}/q/{}", SITE_URL, id)
    } else {
        format!("{}/q/{}--{}", SITE_URL, slug, id)
    }
}
