//! Authentication domain types

mod credential;
mod profile;

pub use credential::{AuthError, AuthRef, BasicCredentials, Credential, DEFAULT_API_KEY_HEADER};
pub use profile::{AuthProfile, ProfileKind, mask_sensitive, parse_expiry};
