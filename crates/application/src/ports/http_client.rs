//! HTTP Client port

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use apix_domain::{RequestSpec, ResponseSpec};
use thiserror::Error;

/// Transport failures: no response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The request did not complete within the timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("could not resolve host '{host}': {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// The connection failed for another reason.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Configured limit.
        max: usize,
    },

    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The body could not be encoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// An attachment could not be read.
    #[error("failed to read file '{path}': {message}")]
    FileRead {
        /// File path.
        path: String,
        /// I/O message.
        message: String,
    },

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// Implementations apply the method, URL, query parameters, headers,
/// cookies, body, attachments and basic-auth material of the request.
pub trait HttpClient: Send + Sync {
    /// Executes a request, giving up after `timeout`.
    ///
    /// Any received response is `Ok`, whatever its status code.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    fn execute(
        &self,
        request: &RequestSpec,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>>;
}
