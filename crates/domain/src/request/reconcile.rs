//! Re-editing of previously stored request bodies.
//!
//! Field edits keep the wire shape of the stored body: new text is coerced
//! back into the scalar type of the value it replaces, and an input that
//! cannot be coerced leaves the stored value untouched.

use std::collections::BTreeMap;

use serde_json::{Number, Value as JsonValue};

use super::body::{BodyError, BodyKind, RequestBody};

/// How the caller wants to change an existing body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEdit {
    /// Leave the body as it is.
    Keep,
    /// Remove the body.
    Clear,
    /// Replace the whole body with new text of the given kind.
    Replace {
        /// Kind the text is parsed as.
        kind: BodyKind,
        /// The replacement text.
        text: String,
    },
    /// Replace individual fields of a JSON object or form body.
    EditFields(BTreeMap<String, String>),
}

/// One field offered for editing, with its current value as the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableField {
    /// Field name.
    pub name: String,
    /// Current value rendered as text.
    pub default: String,
    /// Current value as stored.
    pub original: JsonValue,
}

/// Lists the editable fields of a JSON object or form body.
///
/// # Errors
///
/// Returns [`BodyError::NotEditable`] for any other body.
pub fn editable_fields(body: &RequestBody) -> Result<Vec<EditableField>, BodyError> {
    match body {
        RequestBody::Json {
            content: JsonValue::Object(map),
        } => Ok(map
            .iter()
            .map(|(name, value)| EditableField {
                name: name.clone(),
                default: display_value(value),
                original: value.clone(),
            })
            .collect()),
        RequestBody::Form { fields } => Ok(fields
            .iter()
            .map(|(name, value)| EditableField {
                name: name.clone(),
                default: value.clone(),
                original: JsonValue::String(value.clone()),
            })
            .collect()),
        other => Err(BodyError::NotEditable(other.kind())),
    }
}

/// Coerces user text into the type of the value it replaces.
#[must_use]
pub fn coerce_field(original: &JsonValue, input: &str) -> JsonValue {
    match original {
        JsonValue::String(_) => JsonValue::String(input.to_string()),
        JsonValue::Bool(current) => {
            let trimmed = input.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                JsonValue::Bool(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                JsonValue::Bool(false)
            } else {
                JsonValue::Bool(*current)
            }
        }
        JsonValue::Number(current) => coerce_number(current, input.trim())
            .map_or_else(|| original.clone(), JsonValue::Number),
        JsonValue::Null => serde_json::from_str(input)
            .unwrap_or_else(|_| JsonValue::String(input.to_string())),
        JsonValue::Array(_) => match serde_json::from_str(input) {
            Ok(parsed @ JsonValue::Array(_)) => parsed,
            _ => original.clone(),
        },
        JsonValue::Object(_) => match serde_json::from_str(input) {
            Ok(parsed @ JsonValue::Object(_)) => parsed,
            _ => original.clone(),
        },
    }
}

/// Applies an edit intent to an existing body.
///
/// # Errors
///
/// Fails when replacement text is invalid for its kind or when fields are
/// edited on a body that has none. The existing body is never modified.
pub fn reconcile_body(existing: &RequestBody, intent: BodyEdit) -> Result<RequestBody, BodyError> {
    match intent {
        BodyEdit::Keep => Ok(existing.clone()),
        BodyEdit::Clear => Ok(RequestBody::Empty),
        BodyEdit::Replace { kind, text } => RequestBody::parse(kind, &text),
        BodyEdit::EditFields(edits) => edit_fields(existing, edits),
    }
}

fn edit_fields(
    existing: &RequestBody,
    edits: BTreeMap<String, String>,
) -> Result<RequestBody, BodyError> {
    match existing {
        RequestBody::Json {
            content: JsonValue::Object(map),
        } => {
            let mut map = map.clone();
            for (name, input) in edits {
                let value = map
                    .get(&name)
                    .map_or_else(|| JsonValue::String(input.clone()), |old| coerce_field(old, &input));
                map.insert(name, value);
            }
            Ok(RequestBody::json(JsonValue::Object(map)))
        }
        RequestBody::Form { fields } => {
            let mut fields = fields.clone();
            fields.extend(edits);
            Ok(RequestBody::form(fields))
        }
        other => Err(BodyError::NotEditable(other.kind())),
    }
}

fn coerce_number(current: &Number, input: &str) -> Option<Number> {
    if current.is_f64() {
        return input.parse::<f64>().ok().and_then(Number::from_f64);
    }
    if let Ok(value) = input.parse::<i64>() {
        return Some(Number::from(value));
    }
    input.parse::<u64>().ok().map(Number::from)
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}
