//! Apix Domain - Core types
//!
//! Requests, bodies, credentials, templates, history entries, responses and
//! the JSON query evaluator. All types here are pure Rust with no I/O.

pub mod auth;
pub mod error;
pub mod history;
pub mod query;
pub mod request;
pub mod response;
pub mod template;

pub use auth::{
    AuthError, AuthProfile, AuthRef, BasicCredentials, Credential, DEFAULT_API_KEY_HEADER,
    ProfileKind, mask_sensitive, parse_expiry,
};
pub use error::{DomainError, DomainResult};
pub use history::HistoryEntry;
pub use query::{QueryOutcome, evaluate};
pub use request::{
    BodyEdit, BodyError, BodyKind, EditableField, HttpMethod, MultipartField, OrderedMap,
    RequestBody, RequestSpec, coerce_field, editable_fields, infer_kind, reconcile_body,
    resolve_url,
};
pub use response::{ResponseSpec, StatusCode};
pub use template::Template;
