//! Response Extractor: turns the model's free-text reply into a validated
//! `ModelTurnResult`.
//!
//! The wire contract is one ```json fenced block whose values are all
//! strings. A reply with no fence, or an unparseable block, is
//! `MalformedOutput`; a parseable block missing fields or carrying values
//! that cannot be coerced into range is `SchemaViolation`. The engine retries
//! either kind once with a corrective follow-up before surfacing it.

use serde_json::Value;
use thiserror::Error;

use crate::interview::models::{Category, ModelTurnResult};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no fenced JSON block found in model output")]
    MissingFence,

    #[error("fenced block is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("schema violation: field `{field}` {reason}")]
    SchemaViolation { field: &'static str, reason: String },
}

/// Locates the ```json fence in the raw model text and parses its contents
/// into a validated `ModelTurnResult`.
pub fn extract_turn_result(raw: &str) -> Result<ModelTurnResult, ExtractError> {
    let block = find_fenced_json(raw).ok_or(ExtractError::MissingFence)?;
    let value: Value = serde_json::from_str(block)?;

    let score = bounded_int(&value, "score", 10)?;
    let overall_score = bounded_int(&value, "overallScore", 100)?;
    let question_category = category(&value)?;
    let completed = boolean(&value, "completed")?;

    Ok(ModelTurnResult {
        ai_summary: required_str(&value, "aiSummary")?.to_string(),
        current_analysis: required_str(&value, "currentAnalysis")?.to_string(),
        generated_question: required_str(&value, "generated_question")?.to_string(),
        question_category,
        hypothetical_response: required_str(&value, "hypothetical_response")?.to_string(),
        score,
        overall_score,
        weaknesses: required_str(&value, "weaknesses")?.to_string(),
        completed,
    })
}

/// Returns the contents of the first ```json fence, or None.
fn find_fenced_json(raw: &str) -> Option<&str> {
    let start = raw.find("```json")?;
    let body = &raw[start + "```json".len()..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn required_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, ExtractError> {
    match value.get(field) {
        None => Err(ExtractError::SchemaViolation {
            field,
            reason: "is missing".to_string(),
        }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ExtractError::SchemaViolation {
            field,
            reason: format!("must be a string, got {other}"),
        }),
    }
}

/// Coerces a string-encoded integer field and checks it against `0..=max`.
fn bounded_int(value: &Value, field: &'static str, max: u8) -> Result<u8, ExtractError> {
    let text = required_str(value, field)?;
    let parsed: i64 = text
        .trim()
        .parse()
        .map_err(|_| ExtractError::SchemaViolation {
            field,
            reason: format!("is not an integer: {text:?}"),
        })?;
    if parsed < 0 || parsed > i64::from(max) {
        return Err(ExtractError::SchemaViolation {
            field,
            reason: format!("must be in 0..={max}, got {parsed}"),
        });
    }
    Ok(parsed as u8)
}

/// Coerces the string-encoded `"true"` / `"false"` completion flag.
fn boolean(value: &Value, field: &'static str) -> Result<bool, ExtractError> {
    let text = required_str(value, field)?;
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ExtractError::SchemaViolation {
            field,
            reason: format!("must be \"true\" or \"false\", got {other:?}"),
        }),
    }
}

/// Coerces the string-encoded category id into the closed enum.
fn category(value: &Value) -> Result<Category, ExtractError> {
    let field = "question_category";
    let text = required_str(value, field)?;
    let id: u8 = text
        .trim()
        .parse()
        .map_err(|_| ExtractError::SchemaViolation {
            field,
            reason: format!("is not a category id: {text:?}"),
        })?;
    Category::from_id(id).ok_or_else(|| ExtractError::SchemaViolation {
        field,
        reason: format!("must be in 1..=9, got {id}"),
    })
}
