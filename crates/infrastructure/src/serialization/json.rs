//! JSON serialization helpers for deterministic record files.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Serializes a value to deterministic JSON bytes.
///
/// Output format:
/// - 2-space indentation
/// - Trailing newline
/// - Keys in declaration order for structs, sorted for `BTreeMap`s
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(SerializationError::Serialize)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Deserializes JSON from bytes.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use apix_domain::{AuthProfile, RequestBody, RequestSpec, Template};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_output_is_indented_with_trailing_newline() {
        let profile = AuthProfile::bearer("dev", "tok");
        let text = String::from_utf8(to_json_stable_bytes(&profile).unwrap()).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"name\": \"dev\""));
    }

    #[test]
    fn test_template_headers_are_sorted() {
        let spec = RequestSpec::get("https://a.test")
            .with_header("Zeta", "1")
            .with_header("Accept", "2");
        let bytes = to_json_stable_bytes(&Template::from_request("t", &spec)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("Accept").unwrap() < text.find("Zeta").unwrap());
    }

    #[test]
    fn test_template_survives_disk_format() {
        let spec = RequestSpec::get("https://a.test").with_body(RequestBody::json(json!({"a": [1, 2]})));
        let template = Template::from_request("t", &spec);
        let restored: Template = from_json_bytes(&to_json_stable_bytes(&template).unwrap()).unwrap();
        assert_eq!(restored, template);
    }

    #[test]
    fn test_invalid_bytes_report_deserialize() {
        let result: Result<Template, _> = from_json_bytes(b"{not json");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
