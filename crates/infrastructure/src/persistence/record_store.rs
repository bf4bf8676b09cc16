//! File-per-record store.
//!
//! Each record lives at `<root>/<kind>/<key>.json`. Writes go to a sibling
//! temporary file that is renamed over the target, so a reader sees either
//! the previous or the new version of a record.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use apix_application::ports::{
    FileSystem, FileSystemError, Listing, ListingWarning, Record, RecordStore, StoreError,
    validate_key,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::file_system::TokioFileSystem;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const EXTENSION: &str = "json";

/// JSON file backend for [`RecordStore`].
pub struct JsonFileStore<R, F = TokioFileSystem> {
    dir: PathBuf,
    fs: F,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> JsonFileStore<R, TokioFileSystem> {
    /// Creates a store for `R` under `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self::with_file_system(root, TokioFileSystem::new())
    }
}

impl<R: Record, F: FileSystem> JsonFileStore<R, F> {
    /// Creates a store for `R` under `root` using the given file system.
    #[must_use]
    pub fn with_file_system(root: &Path, fs: F) -> Self {
        Self {
            dir: root.join(R::KIND.dir_name()),
            fs,
            _record: PhantomData,
        }
    }

    /// Directory holding the record files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn persistence(key: &str, source: FileSystemError) -> StoreError {
        StoreError::Persistence {
            kind: R::KIND,
            key: key.to_string(),
            source,
        }
    }

    async fn read_record(&self, key: &str, path: &Path) -> Result<R, StoreError> {
        let bytes = self.fs.read_file(path).await.map_err(|e| match e {
            FileSystemError::NotFound(_) => StoreError::NotFound {
                kind: R::KIND,
                key: key.to_string(),
            },
            other => Self::persistence(key, other),
        })?;
        from_json_bytes(&bytes).map_err(|e| StoreError::CorruptRecord {
            kind: R::KIND,
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl<R: Record, F: FileSystem> RecordStore<R> for JsonFileStore<R, F> {
    async fn put(&self, record: &R) -> Result<(), StoreError> {
        let key = record.key();
        validate_key(R::KIND, key)?;

        let bytes = to_json_stable_bytes(record).map_err(|e| StoreError::Encode {
            kind: R::KIND,
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let path = self.record_path(key);
        let tmp = self.dir.join(format!(".{key}.{EXTENSION}.tmp"));

        self.fs
            .write_file(&tmp, &bytes)
            .await
            .map_err(|e| Self::persistence(key, e))?;
        if let Err(e) = self.fs.rename(&tmp, &path).await {
            let _ = self.fs.remove_file(&tmp).await;
            return Err(Self::persistence(key, e));
        }

        debug!(kind = %R::KIND, key, "record written");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<R, StoreError> {
        validate_key(R::KIND, key)?;
        let record = self.read_record(key, &self.record_path(key)).await?;
        debug!(kind = %R::KIND, key, "record loaded");
        Ok(record)
    }

    async fn list(&self) -> Result<Listing<R>, StoreError> {
        let paths = match self.fs.read_dir(&self.dir).await {
            Ok(paths) => paths,
            Err(FileSystemError::NotFound(_)) => return Ok(Listing::empty()),
            Err(e) => return Err(Self::persistence(R::KIND.dir_name(), e)),
        };

        let mut listing = Listing::empty();
        for path in paths {
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match self.read_record(key, &path).await {
                Ok(record) => listing.records.push(record),
                Err(e) => {
                    warn!(kind = %R::KIND, key, error = %e, "skipping unreadable record");
                    listing.warnings.push(ListingWarning {
                        key: key.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        listing.records.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(listing)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(R::KIND, key)?;
        match self.fs.remove_file(&self.record_path(key)).await {
            Ok(()) => {
                debug!(kind = %R::KIND, key, "record deleted");
                Ok(())
            }
            Err(FileSystemError::NotFound(_)) => Ok(()),
            Err(e) => Err(Self::persistence(key, e)),
        }
    }
}
