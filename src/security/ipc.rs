use serde_json::Value;

use crate::error::ShellError;
use crate::limits::MAX_INPUT_CHARS;

/// Validate an `executeCommand` payload and borrow its `input` string.
///
/// The payload must be an object with a string `input` of at most
/// [`MAX_INPUT_CHARS`] characters.
pub fn validate_execute_payload(payload: &Value) -> Result<&str, ShellError> {
    let Some(obj) = payload.as_object() else {
        return Err(ShellError::Validation("must be an object".into()));
    };
    let Some(input) = obj.get("input") else {
        return Err(ShellError::Validation("missing \"input\" field".into()));
    };
    let Some(input) = input.as_str() else {
        return Err(ShellError::Validation("\"input\" must be a string".into()));
    };
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(ShellError::Validation(
            "\"input\" exceeds maximum length".into(),
        ));
    }
    Ok(input)
}
