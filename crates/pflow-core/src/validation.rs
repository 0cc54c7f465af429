//! Form-boundary validation.
//!
//! Everything here runs before a request is built. A failure aborts the
//! submission and is logged locally; it never reaches the Remote Client.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ValidationError;

/// Parses the payload text typed into the dashboard.
///
/// Blank text yields `{}`. Anything else must parse to a JSON object.
pub fn parse_payload(text: &str) -> Result<Value, ValidationError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "Invalid payload");
        ValidationError::InvalidPayload(e.to_string())
    })?;

    match value {
        Value::Object(_) => Ok(value),
        other => {
            let kind = json_kind(&other);
            warn!(kind, "Payload is not an object");
            Err(ValidationError::PayloadNotObject(kind))
        }
    }
}

/// Rejects blank required fields
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        warn!(field, "Missing required field");
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
