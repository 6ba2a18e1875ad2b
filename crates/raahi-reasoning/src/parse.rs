//! Coercion of model output into a [`TripState`].

use raahi_types::TripState;
use serde_json::Value;

use crate::error::ReasoningError;

/// Strips a surrounding Markdown code fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Removes `null` members so serde defaults apply to them.
fn drop_nulls(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, v| !v.is_null());
        for v in map.values_mut() {
            drop_nulls(v);
        }
    }
}

/// Parses the model's content into the candidate next state.
///
/// Missing text slots default to empty and a missing `user` is taken from
/// `current`. Enum values outside their closed sets are rejected.
pub fn parse_candidate(raw: &str, current: &TripState) -> Result<TripState, ReasoningError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ReasoningError::EmptyResponse);
    }

    let mut value: Value =
        serde_json::from_str(body).map_err(|e| ReasoningError::InvalidState(e.to_string()))?;
    if !value.is_object() {
        return Err(ReasoningError::InvalidState(
            "expected a JSON object".to_string(),
        ));
    }
    drop_nulls(&mut value);

    if let Value::Object(map) = &mut value {
        if !map.contains_key("user") {
            let user = serde_json::to_value(&current.user)
                .map_err(|e| ReasoningError::InvalidState(e.to_string()))?;
            map.insert("user".to_string(), user);
        }
    }

    serde_json::from_value(value).map_err(|e| ReasoningError::InvalidState(e.to_string()))
}
