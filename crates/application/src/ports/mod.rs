//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod file_system;
mod history_log;
mod http_client;
mod record_store;

pub use clock::Clock;
pub use file_system::{FileSystem, FileSystemError};
pub use history_log::HistoryLog;
pub use http_client::{HttpClient, HttpClientError};
pub use record_store::{
    Listing, ListingWarning, Record, RecordKind, RecordStore, StoreError, validate_key,
};
