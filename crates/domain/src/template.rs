//! Named, replayable request snapshots.

use serde::{Deserialize, Serialize};

use crate::auth::AuthRef;
use crate::request::{HttpMethod, OrderedMap, RequestBody, RequestSpec, deserialize_lenient};

/// A request saved under a unique name for replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Unique template name.
    pub name: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: OrderedMap,
    /// Query parameters
    #[serde(default)]
    pub query_params: OrderedMap,
    /// Multipart attachments
    #[serde(default)]
    pub files: OrderedMap,
    /// Request body
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub body: RequestBody,
    /// Authentication reference, resolved again on every replay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthRef>,
}

impl Template {
    /// Snapshots a request under `name`.
    ///
    /// Credential material written by resolution is left out; the template
    /// keeps the `auth` reference instead.
    #[must_use]
    pub fn from_request(name: impl Into<String>, spec: &RequestSpec) -> Self {
        let mut spec = spec.clone();
        spec.strip_resolved_credentials();
        Self {
            name: name.into(),
            method: spec.method,
            url: spec.url,
            headers: spec.headers,
            query_params: spec.query_params,
            files: spec.files,
            body: spec.body,
            auth: spec.auth,
        }
    }

    /// Builds a fresh request from this template.
    #[must_use]
    pub fn to_request(&self) -> RequestSpec {
        let mut spec = RequestSpec::new(self.method, self.url.clone());
        spec.headers.clone_from(&self.headers);
        spec.query_params.clone_from(&self.query_params);
        spec.files.clone_from(&self.files);
        spec.body = self.body.clone();
        spec.auth.clone_from(&self.auth);
        spec
    }
}
