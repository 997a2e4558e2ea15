use serde_json::Value;

use crate::models::RawCandidate;

const FENCE: &str = "```";

/// Raised when generator output cannot be decoded
///
/// Recoverable: the orchestrator spends one attempt and moves on.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("\"suggestions\" is not an array")]
    SuggestionsNotArray,
}

/// Extracts candidate records from raw generator text
///
/// Surrounding markdown fences are tolerated. A missing `suggestions` key
/// yields no candidates; array elements that are not objects are skipped.
pub fn parse(raw: &str) -> Result<Vec<RawCandidate>, ParseError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(&body)?;

    let Value::Object(mut object) = value else {
        return Err(ParseError::NotAnObject);
    };

    let items = match object.remove("suggestions") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ParseError::SuggestionsNotArray),
    };

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<RawCandidate>(item).ok())
        .collect())
}

/// Removes a leading fence line (with optional language tag) and a trailing fence line
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|line| line.starts_with(FENCE)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.starts_with(FENCE)) {
        lines.pop();
    }

    lines.join("\n").trim().to_string()
}
