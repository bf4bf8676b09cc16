//! Request history persistence.
//!
//! History is a single JSON array at `<root>/history`. Entry ids are not
//! stored; they are the position of the request in the array.

use std::path::{Path, PathBuf};

use apix_application::ports::{FileSystem, FileSystemError, HistoryLog, RecordKind, StoreError};
use apix_domain::{HistoryEntry, RequestSpec};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::file_system::TokioFileSystem;
use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const HISTORY_KEY: &str = "history";

/// File-backed [`HistoryLog`].
pub struct FileHistoryLog<F = TokioFileSystem> {
    path: PathBuf,
    fs: F,
    lock: Mutex<()>,
}

impl FileHistoryLog<TokioFileSystem> {
    /// Creates the log under `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self::with_file_system(root, TokioFileSystem::new())
    }
}

impl<F: FileSystem> FileHistoryLog<F> {
    /// Creates the log under `root` using the given file system.
    #[must_use]
    pub fn with_file_system(root: &Path, fs: F) -> Self {
        Self {
            path: root.join(RecordKind::History.dir_name()),
            fs,
            lock: Mutex::new(()),
        }
    }

    /// Path of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence(source: FileSystemError) -> StoreError {
        StoreError::Persistence {
            kind: RecordKind::History,
            key: HISTORY_KEY.to_string(),
            source,
        }
    }

    async fn load(&self) -> Result<Vec<RequestSpec>, StoreError> {
        let bytes = match self.fs.read_file(&self.path).await {
            Ok(bytes) => bytes,
            Err(FileSystemError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(Self::persistence(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        from_json_bytes(&bytes).map_err(|e| StoreError::CorruptRecord {
            kind: RecordKind::History,
            key: HISTORY_KEY.to_string(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, requests: &[RequestSpec]) -> Result<(), StoreError> {
        let bytes = to_json_stable_bytes(&requests).map_err(|e| StoreError::Encode {
            kind: RecordKind::History,
            key: HISTORY_KEY.to_string(),
            reason: e.to_string(),
        })?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        self.fs
            .write_file(&tmp, &bytes)
            .await
            .map_err(Self::persistence)?;
        if let Err(e) = self.fs.rename(&tmp, &self.path).await {
            let _ = self.fs.remove_file(&tmp).await;
            return Err(Self::persistence(e));
        }
        Ok(())
    }
}

#[async_trait]
impl<F: FileSystem> HistoryLog for FileHistoryLog<F> {
    async fn append(&self, request: &RequestSpec) -> Result<HistoryEntry, StoreError> {
        let _guard = self.lock.lock().await;
        let mut requests = self.load().await?;
        requests.push(request.clone());
        self.save(&requests).await?;

        let id = requests.len() - 1;
        debug!(id, url = %request.url, "history entry appended");
        Ok(HistoryEntry::new(id, request.clone()))
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .load()
            .await?
            .into_iter()
            .enumerate()
            .map(|(id, request)| HistoryEntry::new(id, request))
            .collect())
    }

    async fn get(&self, id: usize) -> Result<HistoryEntry, StoreError> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .into_iter()
            .nth(id)
            .map(|request| HistoryEntry::new(id, request))
            .ok_or_else(|| StoreError::NotFound {
                kind: RecordKind::History,
                key: id.to_string(),
            })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        match self.fs.remove_file(&self.path).await {
            Ok(()) | Err(FileSystemError::NotFound(_)) => {
                info!("history cleared");
                Ok(())
            }
            Err(e) => Err(Self::persistence(e)),
        }
    }
}
