//! Keyed record persistence port
//!
//! Templates and auth profiles are stored one record per key. The trait
//! keeps callers independent of the on-disk format.

use std::fmt;

use apix_domain::{AuthProfile, Template};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::file_system::FileSystemError;

/// The kinds of persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Named request templates.
    Template,
    /// Authentication profiles.
    AuthProfile,
    /// The request history log.
    History,
}

impl RecordKind {
    /// Returns the directory (or file) name the kind occupies under the
    /// store root.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Template => "templates",
            Self::AuthProfile => "auth-profiles",
            Self::History => "history",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Template => "template",
            Self::AuthProfile => "auth profile",
            Self::History => "history entry",
        })
    }
}

/// Errors raised by record stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record could not be written, read from disk, or removed.
    #[error("failed to persist {kind} '{key}': {source}")]
    Persistence {
        /// Record kind.
        kind: RecordKind,
        /// Record key.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: FileSystemError,
    },

    /// The record could not be encoded.
    #[error("failed to encode {kind} '{key}': {reason}")]
    Encode {
        /// Record kind.
        kind: RecordKind,
        /// Record key.
        key: String,
        /// Serializer message.
        reason: String,
    },

    /// No record exists under the key.
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Record kind.
        kind: RecordKind,
        /// Record key.
        key: String,
    },

    /// The stored record does not parse.
    #[error("{kind} '{key}' is corrupt: {reason}")]
    CorruptRecord {
        /// Record kind.
        kind: RecordKind,
        /// Record key.
        key: String,
        /// Parser message.
        reason: String,
    },

    /// The key cannot be used as a record name.
    #[error("invalid {kind} name '{key}': {reason}")]
    InvalidKey {
        /// Record kind.
        kind: RecordKind,
        /// Offending key.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl StoreError {
    /// Returns true for [`StoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Checks that `key` can name a record file.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] for empty keys and keys containing path
/// separators, `..` or NUL.
pub fn validate_key(kind: RecordKind, key: &str) -> Result<(), StoreError> {
    let reason = if key.trim().is_empty() {
        Some("name is empty")
    } else if key.contains(['/', '\\']) {
        Some("name contains a path separator")
    } else if key.contains("..") {
        Some("name contains '..'")
    } else if key.contains('\0') {
        Some("name contains NUL")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(StoreError::InvalidKey {
            kind,
            key: key.to_string(),
            reason,
        })
    })
}

/// A value persisted under its own key.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind of the record.
    const KIND: RecordKind;

    /// Key the record is stored under.
    fn key(&self) -> &str;
}

impl Record for Template {
    const KIND: RecordKind = RecordKind::Template;

    fn key(&self) -> &str {
        &self.name
    }
}

impl Record for AuthProfile {
    const KIND: RecordKind = RecordKind::AuthProfile;

    fn key(&self) -> &str {
        &self.name
    }
}

/// A record file skipped while listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingWarning {
    /// Key derived from the file name.
    pub key: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of listing a store: the readable records, sorted by key, plus the
/// files that were skipped.
#[derive(Debug, Clone)]
pub struct Listing<R> {
    /// Well-formed records.
    pub records: Vec<R>,
    /// Skipped files.
    pub warnings: Vec<ListingWarning>,
}

impl<R> Listing<R> {
    /// Creates an empty listing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Port for keyed record persistence.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Writes the record under its key, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the record cannot be
    /// written.
    async fn put(&self, record: &R) -> Result<(), StoreError>;

    /// Loads one record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent and `CorruptRecord` if it does not parse.
    async fn get(&self, key: &str) -> Result<R, StoreError>;

    /// Lists every readable record, skipping malformed ones.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself cannot be enumerated.
    async fn list(&self) -> Result<Listing<R>, StoreError>;

    /// Removes a record. Removing an absent record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or removal fails.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Returns whether a record exists under the key.
    ///
    /// # Errors
    ///
    /// Propagates any failure other than `NotFound`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key(RecordKind::Template, "get-users").is_ok());
        assert!(validate_key(RecordKind::Template, "v1.2 list").is_ok());
        for bad in ["", "  ", "a/b", "a\\b", "..", "x..y", "nul\0"] {
            assert!(
                matches!(
                    validate_key(RecordKind::Template, bad),
                    Err(StoreError::InvalidKey { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_error_messages_name_kind_and_key() {
        let err = StoreError::NotFound {
            kind: RecordKind::AuthProfile,
            key: "prod".to_string(),
        };
        assert_eq!(err.to_string(), "auth profile 'prod' not found");
        assert_eq!(RecordKind::AuthProfile.dir_name(), "auth-profiles");
    }
}
