//! Apix Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (record stores, history log, HTTP client, clock, file system)
//! - Auth profile management and credential resolution
//! - Template management
//! - Request execution and its post-response side effects

pub mod auth;
pub mod error;
pub mod execute_request;
pub mod ports;
pub mod send_request;
pub mod templates;

#[cfg(test)]
#[allow(clippy::unwrap_used, missing_docs, clippy::new_without_default)]
mod testing;

pub use auth::{AuthProfiles, CredentialResolver, ProfileError, ResolveError};
pub use error::{ApplicationError, ApplicationResult};
pub use execute_request::{
    ExecuteOptions, ExecuteRequest, ExecuteRequestError, ExecuteResult, SideEffectError,
};
pub use ports::{
    Clock, FileSystem, FileSystemError, HistoryLog, HttpClient, HttpClientError, Listing,
    ListingWarning, Record, RecordKind, RecordStore, StoreError,
};
pub use send_request::{SendRequest, SendRequestError};
pub use templates::{TemplateError, Templates};
