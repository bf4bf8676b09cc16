//! Send Request Use Case
//!
//! Prefixes the base URL, resolves credentials and executes.

use apix_domain::{AuthProfile, RequestSpec, Template, resolve_url};
use thiserror::Error;

use crate::auth::{CredentialResolver, ResolveError};
use crate::execute_request::{ExecuteRequest, ExecuteRequestError, ExecuteResult};
use crate::ports::{Clock, HistoryLog, HttpClient, RecordStore};

/// Errors raised while sending a request.
#[derive(Debug, Error)]
pub enum SendRequestError {
    /// Credentials could not be resolved; nothing was sent.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Execution failed.
    #[error(transparent)]
    Execute(#[from] ExecuteRequestError),
}

/// Full request pipeline from user-built spec to response.
pub struct SendRequest<C, H, T, P, K> {
    executor: ExecuteRequest<C, H, T>,
    resolver: CredentialResolver<P, K>,
    base_url: Option<String>,
}

impl<C, H, T, P, K> SendRequest<C, H, T, P, K>
where
    C: HttpClient,
    H: HistoryLog,
    T: RecordStore<Template>,
    P: RecordStore<AuthProfile>,
    K: Clock,
{
    /// Creates the pipeline.
    pub const fn new(
        executor: ExecuteRequest<C, H, T>,
        resolver: CredentialResolver<P, K>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            executor,
            resolver,
            base_url,
        }
    }

    /// Prepares a request for execution: joins relative URLs onto the base
    /// URL and attaches resolved credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if credentials cannot be resolved.
    pub async fn prepare(&self, spec: &RequestSpec) -> Result<RequestSpec, ResolveError> {
        let mut prepared = spec.clone();
        prepared.url = resolve_url(&spec.url, self.base_url.as_deref());
        self.resolver.apply(&mut prepared).await?;
        Ok(prepared)
    }

    /// Prepares and executes a request.
    ///
    /// # Errors
    ///
    /// Returns an error if credential resolution or execution fails.
    pub async fn send(&self, spec: &RequestSpec) -> Result<ExecuteResult, SendRequestError> {
        let prepared = self.prepare(spec).await?;
        Ok(self.executor.execute(&prepared).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::AuthProfiles;
    use crate::execute_request::ExecuteOptions;
    use crate::testing::{FixedClock, MemoryHistory, MemoryStore, MockHttpClient};
    use apix_domain::{AuthError, AuthRef};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    type Pipeline = SendRequest<
        MockHttpClient,
        MemoryHistory,
        MemoryStore<Template>,
        MemoryStore<AuthProfile>,
        FixedClock,
    >;

    async fn pipeline(client: Arc<MockHttpClient>, history: Arc<MemoryHistory>) -> Pipeline {
        let profiles = Arc::new(MemoryStore::new());
        profiles.seed(AuthProfile::bearer("dev", "tok"));
        let registry = Arc::new(AuthProfiles::open(profiles).await.unwrap());
        registry.activate("dev").await.unwrap();

        SendRequest::new(
            ExecuteRequest::new(
                client,
                history,
                Arc::new(MemoryStore::new()),
                ExecuteOptions::default(),
            ),
            CredentialResolver::new(registry, Arc::new(FixedClock(Utc::now()))),
            Some("https://api.example.com/".to_string()),
        )
    }

    #[tokio::test]
    async fn test_send_prefixes_base_url_and_resolves_profile() {
        let client = Arc::new(MockHttpClient::success());
        let history = Arc::new(MemoryHistory::default());
        let send = pipeline(Arc::clone(&client), Arc::clone(&history)).await;

        let spec = RequestSpec::get("/users").with_auth(AuthRef::Profile);
        let response = send.send(&spec).await.unwrap().unwrap();
        assert_eq!(response.status.as_u16(), 200);

        let sent = client.last_sent().unwrap();
        assert_eq!(sent.url, "https://api.example.com/users");
        assert_eq!(sent.headers["Authorization"], "Bearer tok");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_failure_sends_nothing() {
        let client = Arc::new(MockHttpClient::success());
        let history = Arc::new(MemoryHistory::default());
        let send = pipeline(Arc::clone(&client), Arc::clone(&history)).await;

        let spec = RequestSpec::get("/users").with_auth(AuthRef::bearer(""));
        let result = send.send(&spec).await;
        assert!(matches!(
            result,
            Err(SendRequestError::Resolve(ResolveError::Auth(
                AuthError::InvalidCredential { .. }
            )))
        ));
        assert!(client.last_sent().is_none());
        assert_eq!(history.len(), 0);
    }
}
