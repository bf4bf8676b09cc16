//! HTTP Request body types and serialization-kind inference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use url::form_urlencoded;

use crate::error::DomainError;

/// Errors raised when a body cannot be built from user text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BodyError {
    /// The text is not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// The text does not match `file:<path>;field:<name>`.
    #[error("invalid file upload descriptor: {0}")]
    InvalidFileDescriptor(String),

    /// The text is not a `key=value&file=@/path` multipart description.
    #[error("invalid multipart body: {0}")]
    InvalidMultipart(String),

    /// Field-level editing was requested on a body that has no fields.
    #[error("a {0} body has no editable fields")]
    NotEditable(BodyKind),
}

/// The serialization kind of a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyKind {
    /// No body.
    #[default]
    None,
    /// JSON document.
    Json,
    /// `application/x-www-form-urlencoded` fields.
    Form,
    /// Multipart form with text fields and file references.
    Multipart,
    /// Single file upload descriptor.
    File,
    /// Raw text.
    Raw,
}

impl BodyKind {
    /// Returns the kind as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Json => "json",
            Self::Form => "form",
            Self::Multipart => "multipart",
            Self::File => "file",
            Self::Raw => "raw",
        }
    }

    /// Returns whether bodies of this kind support field-level edits.
    #[must_use]
    pub const fn has_fields(self) -> bool {
        matches!(self, Self::Json | Self::Form)
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "json" => Ok(Self::Json),
            "form" => Ok(Self::Form),
            "multipart" => Ok(Self::Multipart),
            "file" => Ok(Self::File),
            "raw" => Ok(Self::Raw),
            other => Err(DomainError::UnsupportedBodyKind(other.to_string())),
        }
    }
}

/// A field in a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MultipartField {
    /// Text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: String,
        /// Path to the file on disk.
        path: String,
    },
}

impl MultipartField {
    /// Creates a text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a file field.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// HTTP request body.
///
/// Persisted with a `type` discriminator. Records written before bodies were
/// typed hold a bare JSON value instead; see [`deserialize_lenient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// Raw text body
    Raw {
        /// The text content.
        content: String,
    },
    /// JSON body with structured content.
    Json {
        /// The JSON content (object, array, or scalar).
        content: JsonValue,
    },
    /// URL-encoded form fields.
    Form {
        /// Form fields as key-value pairs.
        fields: BTreeMap<String, String>,
    },
    /// Multipart form data.
    Multipart {
        /// Text fields and file references.
        fields: Vec<MultipartField>,
    },
    /// Single file upload.
    File {
        /// Path to the file on disk.
        path: String,
        /// Form field name the file is sent under.
        field: String,
    },
}

impl RequestBody {
    /// Creates a raw text body.
    #[must_use]
    pub fn raw(content: impl Into<String>) -> Self {
        Self::Raw {
            content: content.into(),
        }
    }

    /// Creates a JSON body from a `serde_json::Value`.
    #[must_use]
    pub const fn json(content: JsonValue) -> Self {
        Self::Json { content }
    }

    /// Creates a form-urlencoded body.
    #[must_use]
    pub const fn form(fields: BTreeMap<String, String>) -> Self {
        Self::Form { fields }
    }

    /// Creates a file upload body.
    #[must_use]
    pub fn file(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Builds a body from text whose origin is unknown.
    ///
    /// The kind is chosen by [`infer_kind`]. Text classified as multipart
    /// that does not describe fields is kept as raw text.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let kind = infer_kind(text);
        Self::parse(kind, text).unwrap_or_else(|_| Self::raw(text))
    }

    /// Builds a body of an explicitly chosen kind from user text.
    ///
    /// # Errors
    ///
    /// Returns a [`BodyError`] when the text is not valid for `kind`; JSON is
    /// never silently downgraded to raw text.
    pub fn parse(kind: BodyKind, text: &str) -> Result<Self, BodyError> {
        match kind {
            BodyKind::None => Ok(Self::Empty),
            BodyKind::Json => {
                if text.trim().is_empty() {
                    return Ok(Self::Empty);
                }
                serde_json::from_str(text)
                    .map(Self::json)
                    .map_err(|e| BodyError::InvalidJson(e.to_string()))
            }
            BodyKind::Form => Ok(Self::form(decode_form(text.trim()))),
            BodyKind::Multipart => parse_multipart(text.trim()).map(|fields| Self::Multipart { fields }),
            BodyKind::File => parse_file_descriptor(text.trim())
                .map(|(path, field)| Self::file(path, field))
                .ok_or_else(|| BodyError::InvalidFileDescriptor(text.to_string())),
            BodyKind::Raw => Ok(Self::raw(text)),
        }
    }

    /// Returns the kind of this body.
    ///
    /// A JSON body is always `json`, a form map is always `form`; only raw
    /// text is reclassified, and only through [`RequestBody::infer`].
    #[must_use]
    pub const fn kind(&self) -> BodyKind {
        match self {
            Self::Empty => BodyKind::None,
            Self::Raw { .. } => BodyKind::Raw,
            Self::Json { .. } => BodyKind::Json,
            Self::Form { .. } => BodyKind::Form,
            Self::Multipart { .. } => BodyKind::Multipart,
            Self::File { .. } => BodyKind::File,
        }
    }

    /// Returns whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Raw { content } => content.is_empty(),
            Self::Form { fields } => fields.is_empty(),
            Self::Multipart { fields } => fields.is_empty(),
            Self::Json { .. } | Self::File { .. } => false,
        }
    }

    /// Returns the content type the body is sent with, if any.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Raw { .. } => Some("text/plain"),
            Self::Json { .. } => Some("application/json"),
            Self::Form { .. } => Some("application/x-www-form-urlencoded"),
            Self::Multipart { .. } | Self::File { .. } => Some("multipart/form-data"),
        }
    }

    /// Renders the body as the text a user would type to recreate it.
    #[must_use]
    pub fn to_wire_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Raw { content } => content.clone(),
            Self::Json { content } => content.to_string(),
            Self::Form { fields } => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish(),
            Self::Multipart { fields } => fields
                .iter()
                .map(|field| match field {
                    MultipartField::Text { name, value } => format!("{name}={value}"),
                    MultipartField::File { name, path } => format!("{name}=@{path}"),
                })
                .collect::<Vec<_>>()
                .join("&"),
            Self::File { path, field } => format!("file:{path};field:{field}"),
        }
    }
}

/// Infers the serialization kind of a stored body string.
///
/// First match wins: JSON, URL-encoded form containing `=`, multipart
/// markers (`boundary=` or `@/`), the `file:<path>;field:<name>` upload
/// descriptor, and finally raw text. Blank text has no body.
#[must_use]
pub fn infer_kind(text: &str) -> BodyKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BodyKind::None;
    }
    if serde_json::from_str::<JsonValue>(trimmed).is_ok() {
        return BodyKind::Json;
    }
    if trimmed.contains('=') && is_urlencoded(trimmed) {
        return BodyKind::Form;
    }
    if trimmed.contains("boundary=") || trimmed.contains("@/") {
        return BodyKind::Multipart;
    }
    if parse_file_descriptor(trimmed).is_some() {
        return BodyKind::File;
    }
    BodyKind::Raw
}

/// Deserializes a body field that may hold either a typed body or a legacy
/// untyped value.
///
/// Legacy values map as: `null` to empty, strings through
/// [`RequestBody::infer`], and any other JSON value to a JSON body.
///
/// # Errors
///
/// Only fails when the input is not JSON-shaped at all.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<RequestBody, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    if value.get("type").is_some_and(JsonValue::is_string)
        && let Ok(body) = serde_json::from_value::<RequestBody>(value.clone())
    {
        return Ok(body);
    }
    Ok(match value {
        JsonValue::Null => RequestBody::Empty,
        JsonValue::String(text) => RequestBody::infer(&text),
        other => RequestBody::json(other),
    })
}

/// Strict URL-encoded check: no `;` separators and only well-formed
/// percent escapes.
fn is_urlencoded(text: &str) -> bool {
    text.split('&')
        .filter(|pair| !pair.is_empty())
        .all(|pair| !pair.contains(';') && has_valid_escapes(pair))
}

fn has_valid_escapes(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

fn decode_form(text: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(text.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn parse_multipart(text: &str) -> Result<Vec<MultipartField>, BodyError> {
    let mut fields = Vec::new();
    for pair in text.split('&').filter(|pair| !pair.is_empty()) {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(BodyError::InvalidMultipart(format!("missing '=' in '{pair}'")));
        };
        let name = name.trim();
        if name.is_empty() || name.contains(['\r', '\n', ';']) {
            return Err(BodyError::InvalidMultipart(format!("invalid field name '{name}'")));
        }
        match value.strip_prefix('@') {
            Some(path) if !path.is_empty() => fields.push(MultipartField::file(name, path)),
            _ => fields.push(MultipartField::text(name, value)),
        }
    }
    if fields.is_empty() {
        return Err(BodyError::InvalidMultipart("no fields".to_string()));
    }
    Ok(fields)
}

fn parse_file_descriptor(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("file:")?;
    let (path, field) = rest.rsplit_once(";field:")?;
    let (path, field) = (path.trim(), field.trim());
    (!path.is_empty() && !field.is_empty()).then_some((path, field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_infer_kind_first_match_wins() {
        assert_eq!(infer_kind(r#"{"a":1}"#), BodyKind::Json);
        assert_eq!(infer_kind("a=1&b=2"), BodyKind::Form);
        assert_eq!(infer_kind("file:/tmp/x.png;field:avatar"), BodyKind::File);
        assert_eq!(infer_kind("hello world"), BodyKind::Raw);
        assert_eq!(infer_kind("   "), BodyKind::None);
    }

    #[test]
    fn test_infer_kind_multipart_markers() {
        // `;` makes the text an invalid query string, so the marker decides.
        assert_eq!(
            infer_kind("multipart/form-data; boundary=XyZ"),
            BodyKind::Multipart
        );
        assert_eq!(infer_kind("upload @/tmp/a.txt"), BodyKind::Multipart);
        // A valid query string still wins over the file marker.
        assert_eq!(infer_kind("name=x&doc=@/tmp/a.txt"), BodyKind::Form);
    }

    #[test]
    fn test_bad_percent_escape_is_not_form() {
        assert_eq!(infer_kind("a=%zz"), BodyKind::Raw);
    }

    #[test]
    fn test_infer_builds_variants() {
        assert_eq!(
            RequestBody::infer(r#"{"a":1}"#),
            RequestBody::json(json!({"a": 1}))
        );
        let RequestBody::Form { fields } = RequestBody::infer("a=1&b=hello%20there") else {
            panic!("expected form body");
        };
        assert_eq!(fields["b"], "hello there");
        assert_eq!(
            RequestBody::infer("file:/tmp/x.png;field:avatar"),
            RequestBody::file("/tmp/x.png", "avatar")
        );
        assert_eq!(RequestBody::infer("hello"), RequestBody::raw("hello"));
        // Multipart marker without field structure stays raw.
        let boundary = "multipart/form-data; boundary=XyZ";
        assert_eq!(RequestBody::infer(boundary), RequestBody::raw(boundary));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let result = RequestBody::parse(BodyKind::Json, "{not json");
        assert!(matches!(result, Err(BodyError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_multipart_fields() {
        let body = RequestBody::parse(BodyKind::Multipart, "name=John&avatar=@/tmp/me.png").unwrap();
        assert_eq!(
            body,
            RequestBody::Multipart {
                fields: vec![
                    MultipartField::text("name", "John"),
                    MultipartField::file("avatar", "/tmp/me.png"),
                ]
            }
        );
        assert_eq!(body.to_wire_text(), "name=John&avatar=@/tmp/me.png");
    }

    #[test]
    fn test_parse_file_descriptor_requires_shape() {
        assert!(RequestBody::parse(BodyKind::File, "file:;field:").is_err());
        assert!(RequestBody::parse(BodyKind::File, "/tmp/x.png").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(RequestBody::Empty.content_type(), None);
        assert_eq!(
            RequestBody::json(json!({})).content_type(),
            Some("application/json")
        );
        assert_eq!(RequestBody::raw("x").content_type(), Some("text/plain"));
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        body: RequestBody,
    }

    #[test]
    fn test_lenient_deserialization_of_legacy_values() {
        let holder: Holder = serde_json::from_str(r#"{"body": "a=1&b=2"}"#).unwrap();
        assert_eq!(holder.body.kind(), BodyKind::Form);

        let holder: Holder = serde_json::from_str(r#"{"body": {"name": "x"}}"#).unwrap();
        assert_eq!(holder.body, RequestBody::json(json!({"name": "x"})));

        let holder: Holder = serde_json::from_str(r#"{"body": null}"#).unwrap();
        assert_eq!(holder.body, RequestBody::Empty);

        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(holder.body, RequestBody::Empty);
    }

    #[test]
    fn test_lenient_deserialization_of_typed_values() {
        let typed = serde_json::to_string(&RequestBody::raw("hello")).unwrap();
        let holder: Holder = serde_json::from_str(&format!(r#"{{"body": {typed}}}"#)).unwrap();
        assert_eq!(holder.body, RequestBody::raw("hello"));

        // A legacy object that happens to carry a `type` key stays JSON.
        let holder: Holder = serde_json::from_str(r#"{"body": {"type": "user", "id": 1}}"#).unwrap();
        assert_eq!(holder.body.kind(), BodyKind::Json);
    }
}
