//! Persistence adapters
//!
//! Record files live under a single root directory:
//!
//! ```text
//! <root>/
//!   auth-profiles/<name>.json
//!   templates/<name>.json
//!   history
//! ```

mod file_system;
mod history_repository;
mod record_store;

pub use file_system::TokioFileSystem;
pub use history_repository::FileHistoryLog;
pub use record_store::JsonFileStore;
