//! Apix Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod config;
pub mod http;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use self::config::{ApixConfig, ConfigError, ConfigLoader, default_root_dir};
pub use http::{BuiltBody, build_body};
pub use persistence::{FileHistoryLog, JsonFileStore, TokioFileSystem};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
