//! Execute Request Use Case
//!
//! Sends a resolved request through the HTTP client and, once a response
//! has been received, records it in the history log and saves it as a
//! template when asked to.

use std::sync::Arc;
use std::time::Duration;

use apix_domain::request::has_http_scheme;
use apix_domain::{RequestSpec, ResponseSpec, Template};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::ports::{HistoryLog, HttpClient, HttpClientError, RecordStore, StoreError};

/// Result type for request execution.
pub type ExecuteResult = Result<ResponseSpec, ExecuteRequestError>;

/// A post-response side effect that failed.
#[derive(Debug, Error)]
pub enum SideEffectError {
    /// The history entry could not be appended.
    #[error("failed to record history: {0}")]
    History(#[source] StoreError),

    /// The template could not be saved.
    #[error("failed to save template '{name}': {source}")]
    Template {
        /// Template name.
        name: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

/// Error type for the execute request use case.
#[derive(Debug, Error)]
pub enum ExecuteRequestError {
    /// URL is empty.
    #[error("URL is required")]
    EmptyUrl,

    /// URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No response was received.
    #[error("{0}")]
    HttpError(#[from] HttpClientError),

    /// A response was received but a side effect failed. The request is not
    /// rolled back.
    #[error("request completed with status {} but {source}", .response.status)]
    SideEffect {
        /// The received response.
        response: Box<ResponseSpec>,
        /// What failed.
        #[source]
        source: SideEffectError,
    },
}

impl ExecuteRequestError {
    /// Returns the response carried by a side-effect failure.
    #[must_use]
    pub fn response(&self) -> Option<&ResponseSpec> {
        match self {
            Self::SideEffect { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Transport timeout.
    pub timeout: Duration,
    /// Whether executed requests are appended to the history log.
    pub record_history: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            record_history: true,
        }
    }
}

/// Use case for executing HTTP requests.
///
/// # Example
///
/// ```ignore
/// let use_case = ExecuteRequest::new(client, history, templates, ExecuteOptions::default());
/// let response = use_case.execute(&RequestSpec::get("https://api.example.com/users")).await?;
/// ```
pub struct ExecuteRequest<C, H, T> {
    client: Arc<C>,
    history: Arc<H>,
    templates: Arc<T>,
    options: ExecuteOptions,
}

impl<C, H, T> ExecuteRequest<C, H, T>
where
    C: HttpClient,
    H: HistoryLog,
    T: RecordStore<Template>,
{
    /// Creates a new `ExecuteRequest` use case.
    pub const fn new(client: Arc<C>, history: Arc<H>, templates: Arc<T>, options: ExecuteOptions) -> Self {
        Self {
            client,
            history,
            templates,
            options,
        }
    }

    /// Returns the execution settings.
    #[must_use]
    pub const fn options(&self) -> ExecuteOptions {
        self.options
    }

    /// Executes the request and runs its side effects.
    ///
    /// # Validation
    ///
    /// - URL must not be empty
    /// - URL must start with http:// or https://
    ///
    /// # Errors
    ///
    /// Returns `ExecuteRequestError` on validation or transport failures,
    /// in which case nothing is persisted, or when a side effect fails after
    /// a response was received.
    pub async fn execute(&self, request: &RequestSpec) -> ExecuteResult {
        Self::validate(request)?;

        debug!(method = %request.method, url = %request.url, "dispatching request");
        let response = self.client.execute(request, self.options.timeout).await?;
        info!(
            method = %request.method,
            url = %request.url,
            status = response.status.as_u16(),
            duration_ms = u64::try_from(response.duration.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        if self.options.record_history
            && let Err(e) = self.history.append(request).await
        {
            error!(error = %e, "failed to record history");
            return Err(ExecuteRequestError::SideEffect {
                response: Box::new(response),
                source: SideEffectError::History(e),
            });
        }

        if let Some(name) = &request.template_name {
            let template = Template::from_request(name.as_str(), request);
            if let Err(e) = self.templates.put(&template).await {
                error!(template = %name, error = %e, "failed to save template");
                return Err(ExecuteRequestError::SideEffect {
                    response: Box::new(response),
                    source: SideEffectError::Template {
                        name: name.clone(),
                        source: e,
                    },
                });
            }
            info!(template = %name, "template saved");
        }

        Ok(response)
    }

    /// Validates the request before execution.
    fn validate(request: &RequestSpec) -> Result<(), ExecuteRequestError> {
        if request.url.trim().is_empty() {
            return Err(ExecuteRequestError::EmptyUrl);
        }

        if !has_http_scheme(&request.url) {
            return Err(ExecuteRequestError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}
