//! Request specification type

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::body::{RequestBody, deserialize_lenient};
use super::method::HttpMethod;
use crate::auth::{AuthRef, BasicCredentials};

/// String map with deterministic key order.
pub type OrderedMap = BTreeMap<String, String>;

/// One HTTP request plus persistence intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL, absolute or relative to the configured base URL.
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: OrderedMap,
    /// Query parameters appended to the URL.
    #[serde(default)]
    pub query_params: OrderedMap,
    /// Cookies, sent as a single `Cookie` header.
    #[serde(default)]
    pub cookies: OrderedMap,
    /// Request body
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub body: RequestBody,
    /// Multipart attachments: field name to file path.
    #[serde(default)]
    pub files: OrderedMap,
    /// Authentication to resolve before execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthRef>,
    /// Resolved basic-auth material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicCredentials>,
    /// Save as a template under this name after a response is received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    /// Header written by credential resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential_header: Option<String>,
}

impl RequestSpec {
    /// Creates a request stamped with the current time.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: OrderedMap::new(),
            query_params: OrderedMap::new(),
            cookies: OrderedMap::new(),
            body: RequestBody::Empty,
            files: OrderedMap::new(),
            auth: None,
            basic_auth: None,
            template_name: None,
            timestamp: Utc::now(),
            credential_header: None,
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Adds a header; a later value for the same name wins.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Attaches a file under a multipart field name.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        self.files.insert(field.into(), path.into());
        self
    }

    /// Sets the authentication reference.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthRef) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Marks the request to be saved as a template once executed.
    #[must_use]
    pub fn save_as_template(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }

    /// Returns when the request was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns whether the request is saved as a template after execution.
    #[must_use]
    pub const fn is_template(&self) -> bool {
        self.template_name.is_some()
    }

    pub(crate) fn set_credential_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.insert(name.clone(), value.into());
        self.credential_header = Some(name);
    }

    /// Removes credential material written by resolution, leaving `auth`.
    pub fn strip_resolved_credentials(&mut self) {
        if let Some(name) = self.credential_header.take() {
            self.headers.remove(&name);
        }
        self.basic_auth = None;
    }
}
