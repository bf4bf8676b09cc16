//! Request history port

use apix_domain::{HistoryEntry, RequestSpec};
use async_trait::async_trait;

use super::record_store::StoreError;

/// Port for the positional request history log.
///
/// Entry ids are dense and zero-based: the n-th appended entry has id n - 1
/// until the log is cleared.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    /// Appends an executed request and returns the stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or rewritten.
    async fn append(&self, request: &RequestSpec) -> Result<HistoryEntry, StoreError>;

    /// Returns all entries in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or parsed.
    async fn entries(&self) -> Result<Vec<HistoryEntry>, StoreError>;

    /// Returns the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no entry has that id.
    async fn get(&self, id: usize) -> Result<HistoryEntry, StoreError>;

    /// Removes every entry. Clearing an empty log succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be removed.
    async fn clear(&self) -> Result<(), StoreError>;
}
