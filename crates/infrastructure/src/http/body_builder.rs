//! HTTP request body builder.
//!
//! Turns a [`RequestSpec`]'s body and file attachments into the payload
//! handed to reqwest.

use std::path::Path;

use apix_application::ports::HttpClientError;
use apix_domain::{MultipartField, RequestBody, RequestSpec};
use reqwest::multipart::{Form, Part};

/// Result of building a body.
pub enum BuiltBody {
    /// No body.
    None,
    /// Text body with content type.
    Text {
        /// Encoded text.
        content: String,
        /// Content-Type header value.
        content_type: &'static str,
    },
    /// Multipart form data.
    Multipart(Form),
}

impl BuiltBody {
    /// Returns the Content-Type header value.
    ///
    /// Multipart bodies return `None`; reqwest sets the type together with
    /// the boundary.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Text { content_type, .. } => Some(*content_type),
            Self::None | Self::Multipart(_) => None,
        }
    }
}

/// Builds the payload for a request.
///
/// Attachments in `spec.files` turn the request into a multipart upload;
/// a JSON, raw or form body is then sent as a `body` text field, and
/// multipart fields are merged into the same form.
///
/// # Errors
///
/// Returns [`HttpClientError::FileRead`] when an attachment cannot be read
/// and [`HttpClientError::InvalidBody`] when the body cannot be encoded.
pub async fn build_body(spec: &RequestSpec) -> Result<BuiltBody, HttpClientError> {
    let has_files = !spec.files.is_empty();
    let body_uses_form = matches!(
        spec.body,
        RequestBody::Multipart { .. } | RequestBody::File { .. }
    );
    if !has_files && !body_uses_form {
        return text_body(&spec.body);
    }

    let mut form = Form::new();
    match &spec.body {
        RequestBody::Empty => {}
        RequestBody::Multipart { fields } => {
            for field in fields {
                form = match field {
                    MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                    MultipartField::File { name, path } => form.part(name.clone(), file_part(path).await?),
                };
            }
        }
        RequestBody::File { path, field } => {
            form = form.part(field.clone(), file_part(path).await?);
        }
        other => form = form.text("body", other.to_wire_text()),
    }
    for (field, path) in &spec.files {
        form = form.part(field.clone(), file_part(path).await?);
    }

    Ok(BuiltBody::Multipart(form))
}

fn text_body(body: &RequestBody) -> Result<BuiltBody, HttpClientError> {
    let Some(content_type) = body.content_type() else {
        return Ok(BuiltBody::None);
    };
    let content = match body {
        RequestBody::Json { content } => serde_json::to_string(content)
            .map_err(|e| HttpClientError::InvalidBody(format!("Invalid JSON: {e}")))?,
        RequestBody::Form { fields } => serde_urlencoded::to_string(fields)
            .map_err(|e| HttpClientError::InvalidBody(e.to_string()))?,
        other => other.to_wire_text(),
    };
    Ok(BuiltBody::Text {
        content,
        content_type,
    })
}

async fn file_part(path: &str) -> Result<Part, HttpClientError> {
    let file_path = Path::new(path);
    let content = tokio::fs::read(file_path)
        .await
        .map_err(|e| HttpClientError::FileRead {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let mime_type = mime_guess::from_path(file_path).first_or_octet_stream();

    Part::bytes(content)
        .file_name(filename)
        .mime_str(mime_type.as_ref())
        .map_err(|e| HttpClientError::InvalidBody(format!("Invalid MIME type: {e}")))
}
