//! Authentication references and resolved credential material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::RequestSpec;

/// Header used for API keys when no header name is configured.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Authentication errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A profile reference was given but no profile is active.
    #[error("no active auth profile")]
    NoActiveProfile,

    /// The active profile no longer exists in the store.
    #[error("auth profile '{0}' not found")]
    ProfileNotFound(String),

    /// The profile is stored as inactive.
    #[error("auth profile '{0}' is not active")]
    ProfileInactive(String),

    /// The profile's expiry is in the past.
    #[error("auth profile '{name}' expired at {expired_at}")]
    ProfileExpired {
        /// Profile name.
        name: String,
        /// When the profile expired.
        expired_at: DateTime<Utc>,
    },

    /// The profile lacks the material its type needs.
    #[error("auth profile '{name}' is invalid: {reason}")]
    InvalidProfile {
        /// Profile name.
        name: String,
        /// What is missing.
        reason: String,
    },

    /// Explicit credentials lack required material.
    #[error("invalid {auth_type} credentials: {reason}")]
    InvalidCredential {
        /// Auth type the credentials were given for.
        auth_type: String,
        /// What is missing.
        reason: String,
    },

    /// The auth type is not one of the supported ones.
    #[error("unsupported auth type: {0}")]
    UnsupportedType(String),

    /// An expiry input matched none of the accepted formats.
    #[error("invalid expiry '{0}': use YYYY-MM-DD HH:MM or similar")]
    InvalidExpiry(String),
}

/// Username and password consumed by the transport's basic-auth mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BasicCredentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Authentication selected for a request.
///
/// Explicit references carry the credential material directly: the token
/// for bearer, the key and header name for API keys, and username and
/// password for basic auth. `Profile` defers to the active auth profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthRef {
    /// Bearer token in `primary`.
    Bearer {
        /// The token.
        primary: String,
        /// Unused.
        #[serde(default)]
        secondary: String,
    },
    /// API key in `primary`, header name in `secondary`.
    ApiKey {
        /// The key.
        primary: String,
        /// Header name; empty means [`DEFAULT_API_KEY_HEADER`].
        #[serde(default)]
        secondary: String,
    },
    /// Username in `primary`, password in `secondary`.
    Basic {
        /// Username.
        primary: String,
        /// Password.
        #[serde(default)]
        secondary: String,
    },
    /// Use the currently active auth profile.
    Profile,
}

impl AuthRef {
    /// Creates an explicit bearer reference.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            primary: token.into(),
            secondary: String::new(),
        }
    }

    /// Creates an explicit API key reference.
    #[must_use]
    pub fn api_key(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self::ApiKey {
            primary: key.into(),
            secondary: header.into(),
        }
    }

    /// Creates an explicit basic-auth reference.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            primary: username.into(),
            secondary: password.into(),
        }
    }

    /// Parses the combined value strings typed by users: `header:key` or a
    /// bare key for API keys and `user:pass` for basic auth.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnsupportedType`] for unknown types and
    /// [`AuthError::InvalidCredential`] when a basic value has no `:`.
    pub fn from_legacy_value(auth_type: &str, value: &str) -> Result<Self, AuthError> {
        match auth_type.trim().to_lowercase().as_str() {
            "bearer" => Ok(Self::bearer(value.trim())),
            "apikey" => Ok(match value.split_once(':') {
                Some((header, key)) => Self::api_key(key.trim(), header.trim()),
                None => Self::api_key(value.trim(), ""),
            }),
            "basic" => value
                .split_once(':')
                .map(|(user, pass)| Self::basic(user, pass))
                .ok_or_else(|| AuthError::InvalidCredential {
                    auth_type: "basic".to_string(),
                    reason: "value must be in format 'username:password'".to_string(),
                }),
            "profile" => Ok(Self::Profile),
            other => Err(AuthError::UnsupportedType(other.to_string())),
        }
    }

    /// Returns whether this reference defers to the active profile.
    #[must_use]
    pub const fn is_profile(&self) -> bool {
        matches!(self, Self::Profile)
    }

    /// Returns the auth type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "bearer",
            Self::ApiKey { .. } => "apikey",
            Self::Basic { .. } => "basic",
            Self::Profile => "profile",
        }
    }

    /// Materializes an explicit reference; `Ok(None)` for `Profile`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] when required material is
    /// empty.
    pub fn explicit_credential(&self) -> Result<Option<Credential>, AuthError> {
        let invalid = |reason: &str| AuthError::InvalidCredential {
            auth_type: self.type_name().to_string(),
            reason: reason.to_string(),
        };
        match self {
            Self::Bearer { primary, .. } => {
                if primary.is_empty() {
                    return Err(invalid("token is empty"));
                }
                Ok(Some(Credential::Bearer(primary.clone())))
            }
            Self::ApiKey { primary, secondary } => {
                if primary.is_empty() {
                    return Err(invalid("API key is empty"));
                }
                Ok(Some(Credential::api_key(primary, secondary)))
            }
            Self::Basic { primary, secondary } => {
                if primary.is_empty() || secondary.is_empty() {
                    return Err(invalid("username and password are required"));
                }
                Ok(Some(Credential::Basic(BasicCredentials::new(
                    primary.as_str(),
                    secondary.as_str(),
                ))))
            }
            Self::Profile => Ok(None),
        }
    }
}

/// Resolved credential material ready to attach to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// A single header carrying an API key.
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// Basic auth handled by the transport.
    Basic(BasicCredentials),
}

impl Credential {
    /// Creates an API key header credential, defaulting an empty header
    /// name to [`DEFAULT_API_KEY_HEADER`].
    #[must_use]
    pub fn api_key(key: &str, header: &str) -> Self {
        let header = header.trim();
        let name = if header.is_empty() {
            DEFAULT_API_KEY_HEADER
        } else {
            header
        };
        Self::Header {
            name: name.to_string(),
            value: key.to_string(),
        }
    }

    /// Attaches the credential to a request.
    ///
    /// Bearer and API key credentials become a header; basic credentials
    /// fill `basic_auth`.
    pub fn apply_to(self, spec: &mut RequestSpec) {
        match self {
            Self::Bearer(token) => {
                spec.set_credential_header("Authorization", format!("Bearer {token}"));
            }
            Self::Header { name, value } => spec.set_credential_header(name, value),
            Self::Basic(basic) => spec.basic_auth = Some(basic),
        }
    }
}
