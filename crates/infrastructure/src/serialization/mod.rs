//! Serialization utilities for record files.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable_bytes};
