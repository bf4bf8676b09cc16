//! Authentication profile management and credential resolution.

mod profiles;
mod resolver;

pub use profiles::{AuthProfiles, ProfileError};
pub use resolver::{CredentialResolver, ResolveError};
