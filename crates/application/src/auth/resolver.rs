//! Credential resolution.

use std::sync::Arc;

use apix_domain::{AuthError, AuthProfile, AuthRef, Credential, RequestSpec};
use thiserror::Error;
use tracing::debug;

use super::profiles::AuthProfiles;
use crate::ports::{Clock, RecordStore, StoreError};

/// Errors raised while resolving credentials.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The reference or profile cannot produce credentials.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The profile store failed.
    #[error("failed to load auth profile: {0}")]
    Store(#[from] StoreError),
}

/// Turns an [`AuthRef`] into credential material.
pub struct CredentialResolver<S, C> {
    profiles: Arc<AuthProfiles<S>>,
    clock: Arc<C>,
}

impl<S, C> CredentialResolver<S, C>
where
    S: RecordStore<AuthProfile>,
    C: Clock,
{
    /// Creates a resolver over the profile registry.
    pub const fn new(profiles: Arc<AuthProfiles<S>>, clock: Arc<C>) -> Self {
        Self { profiles, clock }
    }

    /// Resolves a reference.
    ///
    /// Explicit references are validated and returned directly. A profile
    /// reference must name an existing, active, unexpired profile.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] describing why resolution failed, or a
    /// store failure other than a missing profile.
    pub async fn resolve(&self, auth: &AuthRef) -> Result<Credential, ResolveError> {
        if let Some(credential) = auth.explicit_credential()? {
            return Ok(credential);
        }

        let name = self
            .profiles
            .active_name()
            .await
            .ok_or(AuthError::NoActiveProfile)?;
        let profile = match self.profiles.get(&name).await {
            Ok(profile) => profile,
            Err(e) if e.is_not_found() => return Err(AuthError::ProfileNotFound(name).into()),
            Err(e) => return Err(e.into()),
        };
        if !profile.active {
            return Err(AuthError::ProfileInactive(name).into());
        }
        if let Some(expired_at) = profile.expiry
            && profile.is_expired(self.clock.now())
        {
            return Err(AuthError::ProfileExpired { name, expired_at }.into());
        }

        debug!(profile = %name, kind = %profile.kind, "resolved credentials from profile");
        Ok(profile.credential()?)
    }

    /// Resolves `spec.auth` and attaches the credential to the request.
    /// Does nothing when the request has no auth reference.
    ///
    /// # Errors
    ///
    /// See [`CredentialResolver::resolve`].
    pub async fn apply(&self, spec: &mut RequestSpec) -> Result<(), ResolveError> {
        let Some(auth) = spec.auth.clone() else {
            return Ok(());
        };
        self.resolve(&auth).await?.apply_to(spec);
        Ok(())
    }
}
