//! Executed request log entries.

use serde::{Deserialize, Serialize};

use crate::request::RequestSpec;

/// A request as it was executed, with its position in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Zero-based position in the log.
    pub id: usize,
    /// The executed request.
    #[serde(flatten)]
    pub request: RequestSpec,
}

impl HistoryEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(id: usize, request: RequestSpec) -> Self {
        Self { id, request }
    }
}
