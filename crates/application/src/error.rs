//! Application error types

use apix_domain::{AuthError, BodyError, DomainError};
use thiserror::Error;

use crate::auth::{ProfileError, ResolveError};
use crate::execute_request::ExecuteRequestError;
use crate::ports::StoreError;
use crate::send_request::SendRequestError;
use crate::templates::TemplateError;

/// Application-level errors.
///
/// Each use case has its own error type; this umbrella lets callers that
/// drive several of them propagate with `?`.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request body could not be parsed or edited.
    #[error("body error: {0}")]
    Body(#[from] BodyError),

    /// Credentials could not be produced.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Template management failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Auth profile management failed.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Credential resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Request execution failed.
    #[error(transparent)]
    Execute(#[from] ExecuteRequestError),
}

impl From<SendRequestError> for ApplicationError {
    fn from(error: SendRequestError) -> Self {
        match error {
            SendRequestError::Resolve(e) => Self::Resolve(e),
            SendRequestError::Execute(e) => Self::Execute(e),
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
