//! Auth profile registry.
//!
//! Owns the profile store and the name of the active profile. At most one
//! profile is ever persisted with `active = true`.

use std::sync::Arc;

use apix_domain::AuthProfile;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::ports::{Listing, RecordStore, StoreError};

/// Errors raised by profile management.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A profile with this name already exists.
    #[error("auth profile '{0}' already exists")]
    AlreadyExists(String),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registry of authentication profiles with a single active designation.
pub struct AuthProfiles<S> {
    store: Arc<S>,
    active: Mutex<Option<String>>,
}

impl<S: RecordStore<AuthProfile>> AuthProfiles<S> {
    /// Opens the registry over `store`.
    ///
    /// If several stored profiles are marked active, the last one in name
    /// order stays active and the others are persisted as inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or a reconciliation
    /// write fails.
    pub async fn open(store: Arc<S>) -> Result<Self, ProfileError> {
        let listing = store.list().await?;
        let mut active: Vec<AuthProfile> = listing
            .records
            .into_iter()
            .filter(|profile| profile.active)
            .collect();
        let keep = active.pop();
        for mut extra in active {
            warn!(
                profile = %extra.name,
                "multiple active auth profiles found, deactivating"
            );
            extra.active = false;
            store.put(&extra).await?;
        }

        Ok(Self {
            store,
            active: Mutex::new(keep.map(|profile| profile.name)),
        })
    }

    /// Creates a profile. New profiles start inactive.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AlreadyExists`] if the name is taken.
    pub async fn create(&self, mut profile: AuthProfile) -> Result<(), ProfileError> {
        if self.store.exists(&profile.name).await? {
            return Err(ProfileError::AlreadyExists(profile.name));
        }
        profile.active = false;
        self.store.put(&profile).await?;
        info!(profile = %profile.name, kind = %profile.kind, "auth profile created");
        Ok(())
    }

    /// Overwrites an existing profile, keeping its stored active flag.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` store error if the profile does not exist.
    pub async fn update(&self, mut profile: AuthProfile) -> Result<(), ProfileError> {
        let stored = self.store.get(&profile.name).await?;
        profile.active = stored.active;
        self.store.put(&profile).await?;
        info!(profile = %profile.name, "auth profile updated");
        Ok(())
    }

    /// Loads one profile.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `NotFound`.
    pub async fn get(&self, name: &str) -> Result<AuthProfile, StoreError> {
        self.store.get(name).await
    }

    /// Lists all readable profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    pub async fn list(&self) -> Result<Listing<AuthProfile>, StoreError> {
        self.store.list().await
    }

    /// Returns the name of the active profile.
    pub async fn active_name(&self) -> Option<String> {
        self.active.lock().await.clone()
    }

    /// Loads the active profile, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `NotFound` for a stale name.
    pub async fn active_profile(&self) -> Result<Option<AuthProfile>, StoreError> {
        let Some(name) = self.active_name().await else {
            return Ok(None);
        };
        self.store.get(&name).await.map(Some)
    }

    /// Makes `name` the active profile.
    ///
    /// The previously active profile is persisted as inactive before the
    /// target is persisted as active. If the second write fails the previous
    /// profile is restored and the active name is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` store error if `name` does not exist, or the
    /// failing write.
    pub async fn activate(&self, name: &str) -> Result<(), ProfileError> {
        let mut active = self.active.lock().await;
        let mut target = self.store.get(name).await?;

        let previous = match active.as_deref() {
            Some(current) if current != name => match self.store.get(current).await {
                Ok(profile) => Some(profile).filter(|profile| profile.active),
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e.into()),
            },
            _ => None,
        };

        if let Some(previous) = &previous {
            let mut inactive = previous.clone();
            inactive.active = false;
            self.store.put(&inactive).await?;
        }

        target.active = true;
        if let Err(e) = self.store.put(&target).await {
            if let Some(previous) = &previous
                && let Err(restore) = self.store.put(previous).await
            {
                error!(
                    profile = %previous.name,
                    error = %restore,
                    "failed to restore previously active auth profile"
                );
            }
            return Err(e.into());
        }

        info!(
            profile = name,
            previous = previous.as_ref().map(|p| p.name.as_str()),
            "auth profile activated"
        );
        *active = Some(name.to_string());
        Ok(())
    }

    /// Clears the active designation.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be persisted as inactive.
    pub async fn deactivate(&self) -> Result<(), ProfileError> {
        let mut active = self.active.lock().await;
        let Some(name) = active.clone() else {
            return Ok(());
        };
        match self.store.get(&name).await {
            Ok(mut profile) => {
                profile.active = false;
                self.store.put(&profile).await?;
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        info!(profile = %name, "auth profile deactivated");
        *active = None;
        Ok(())
    }

    /// Deletes a profile. Deleting an unknown name succeeds.
    ///
    /// Deleting the active profile clears the active designation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot remove the record.
    pub async fn delete(&self, name: &str) -> Result<(), ProfileError> {
        let mut active = self.active.lock().await;
        self.store.delete(name).await?;
        if active.as_deref() == Some(name) {
            *active = None;
        }
        info!(profile = name, "auth profile deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use pretty_assertions::assert_eq;

    fn active_names(store: &MemoryStore<AuthProfile>) -> Vec<String> {
        store
            .snapshot()
            .into_iter()
            .filter(|p| p.active)
            .map(|p| p.name)
            .collect()
    }

    async fn registry(names: &[&str]) -> (Arc<MemoryStore<AuthProfile>>, AuthProfiles<MemoryStore<AuthProfile>>) {
        let store = Arc::new(MemoryStore::new());
        for name in names {
            store.seed(AuthProfile::bearer(*name, "tok"));
        }
        let profiles = AuthProfiles::open(Arc::clone(&store)).await.unwrap();
        (store, profiles)
    }

    #[tokio::test]
    async fn test_activation_is_exclusive() {
        let (store, profiles) = registry(&["a", "b", "c"]).await;

        profiles.activate("a").await.unwrap();
        assert_eq!(active_names(&store), vec!["a"]);

        profiles.activate("b").await.unwrap();
        assert_eq!(active_names(&store), vec!["b"]);
        assert_eq!(profiles.active_name().await.as_deref(), Some("b"));

        profiles.activate("b").await.unwrap();
        assert_eq!(active_names(&store), vec!["b"]);
    }

    #[tokio::test]
    async fn test_activate_unknown_profile() {
        let (_, profiles) = registry(&["a"]).await;
        let result = profiles.activate("missing").await;
        assert!(matches!(result, Err(ProfileError::Store(StoreError::NotFound { .. }))));
        assert_eq!(profiles.active_name().await, None);
    }

    #[tokio::test]
    async fn test_failed_activation_restores_previous() {
        let (store, profiles) = registry(&["a", "b"]).await;
        profiles.activate("a").await.unwrap();
        store.fail_puts_for("b");

        assert!(profiles.activate("b").await.is_err());
        assert_eq!(active_names(&store), vec!["a"]);
        assert_eq!(profiles.active_name().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_open_reconciles_multiple_active() {
        let store = Arc::new(MemoryStore::new());
        for name in ["x", "y", "z"] {
            let mut profile = AuthProfile::bearer(name, "tok");
            profile.active = name != "y";
            store.seed(profile);
        }

        let profiles = AuthProfiles::open(Arc::clone(&store)).await.unwrap();
        assert_eq!(profiles.active_name().await.as_deref(), Some("z"));
        assert_eq!(active_names(&store), vec!["z"]);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_starts_inactive() {
        let (store, profiles) = registry(&[]).await;
        let mut profile = AuthProfile::bearer("dev", "tok");
        profile.active = true;
        profiles.create(profile.clone()).await.unwrap();
        assert!(active_names(&store).is_empty());

        let result = profiles.create(profile).await;
        assert!(matches!(result, Err(ProfileError::AlreadyExists(name)) if name == "dev"));
    }

    #[tokio::test]
    async fn test_update_preserves_active_flag() {
        let (_, profiles) = registry(&["dev"]).await;
        profiles.activate("dev").await.unwrap();

        profiles.update(AuthProfile::bearer("dev", "new-token")).await.unwrap();
        let stored = profiles.get("dev").await.unwrap();
        assert!(stored.active);
        assert_eq!(stored.token, "new-token");
    }

    #[tokio::test]
    async fn test_delete_active_clears_designation() {
        let (_, profiles) = registry(&["dev"]).await;
        profiles.activate("dev").await.unwrap();

        profiles.delete("dev").await.unwrap();
        assert_eq!(profiles.active_name().await, None);
        profiles.delete("dev").await.unwrap();
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (store, profiles) = registry(&["dev"]).await;
        profiles.activate("dev").await.unwrap();
        profiles.deactivate().await.unwrap();
        assert!(active_names(&store).is_empty());
        assert!(profiles.active_profile().await.unwrap().is_none());
    }
}
