//! Shared field validators and `validator` error helpers.

use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

/// Reject strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Value must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Flatten `ValidationErrors` into `{ field: [message, ..] }`.
///
/// Struct-level errors are reported under `__all__`.
pub fn validation_details(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .map(Value::String)
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(fields)
}

/// One-line summary used as the public error message.
pub fn validation_summary(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect();
    messages.sort();
    messages.dedup();

    if messages.is_empty() {
        "The provided input is invalid".to_string()
    } else {
        messages.join("; ")
    }
}
