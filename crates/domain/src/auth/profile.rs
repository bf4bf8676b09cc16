//! Named authentication profiles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::credential::{AuthError, BasicCredentials, Credential, DEFAULT_API_KEY_HEADER};

/// Kind of credential a profile holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Bearer token.
    Bearer,
    /// API key sent in a header.
    ApiKey,
    /// Username and password.
    Basic,
    /// `OAuth` access token, sent as a bearer token.
    OAuth,
}

impl ProfileKind {
    /// Returns the kind as stored on disk.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::ApiKey => "apikey",
            Self::Basic => "basic",
            Self::OAuth => "oauth",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "apikey" => Ok(Self::ApiKey),
            "basic" => Ok(Self::Basic),
            "oauth" => Ok(Self::OAuth),
            other => Err(AuthError::UnsupportedType(other.to_string())),
        }
    }
}

/// A named, persisted credential set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProfile {
    /// Unique profile name.
    pub name: String,
    /// Credential kind.
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    /// Token for bearer and `OAuth` profiles.
    #[serde(default)]
    pub token: String,
    /// Username for basic profiles.
    #[serde(default)]
    pub username: String,
    /// Password for basic profiles.
    #[serde(default)]
    pub password: String,
    /// Key for API key profiles.
    #[serde(default)]
    pub api_key: String,
    /// Header name for API key profiles.
    #[serde(default)]
    pub header: String,
    /// When the credentials stop being usable.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Whether this is the active profile.
    #[serde(default)]
    pub active: bool,
}

impl AuthProfile {
    /// Creates an empty, inactive profile.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ProfileKind) -> Self {
        Self {
            name: name.into(),
            kind,
            token: String::new(),
            username: String::new(),
            password: String::new(),
            api_key: String::new(),
            header: String::new(),
            expiry: None,
            active: false,
        }
    }

    /// Creates a bearer profile.
    #[must_use]
    pub fn bearer(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::new(name, ProfileKind::Bearer)
        }
    }

    /// Creates an API key profile.
    #[must_use]
    pub fn api_key(name: impl Into<String>, key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            api_key: key.into(),
            header: header.into(),
            ..Self::new(name, ProfileKind::ApiKey)
        }
    }

    /// Creates a basic-auth profile.
    #[must_use]
    pub fn basic(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::new(name, ProfileKind::Basic)
        }
    }

    /// Sets the expiry.
    #[must_use]
    pub const fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns the header name API keys are sent under.
    #[must_use]
    pub fn header_name(&self) -> &str {
        let header = self.header.trim();
        if header.is_empty() {
            DEFAULT_API_KEY_HEADER
        } else {
            header
        }
    }

    /// Returns whether the profile has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= now)
    }

    /// Builds the credential this profile's kind describes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidProfile`] when required material is empty.
    pub fn credential(&self) -> Result<Credential, AuthError> {
        let invalid = |reason: &str| AuthError::InvalidProfile {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        match self.kind {
            ProfileKind::Bearer | ProfileKind::OAuth => {
                if self.token.is_empty() {
                    return Err(invalid("token is empty"));
                }
                Ok(Credential::Bearer(self.token.clone()))
            }
            ProfileKind::ApiKey => {
                if self.api_key.is_empty() {
                    return Err(invalid("API key is empty"));
                }
                Ok(Credential::api_key(&self.api_key, &self.header))
            }
            ProfileKind::Basic => {
                if self.username.is_empty() || self.password.is_empty() {
                    return Err(invalid("username and password are required"));
                }
                Ok(Credential::Basic(BasicCredentials::new(
                    self.username.as_str(),
                    self.password.as_str(),
                )))
            }
        }
    }

    /// Renders the profile for display with secrets masked.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Name: {}", self.name),
            format!("Type: {}", self.kind),
        ];
        match self.kind {
            ProfileKind::Bearer | ProfileKind::OAuth => {
                lines.push(format!("Token: {}", mask_sensitive(&self.token)));
            }
            ProfileKind::ApiKey => {
                lines.push(format!("Header: {}", self.header_name()));
                lines.push(format!("API Key: {}", mask_sensitive(&self.api_key)));
            }
            ProfileKind::Basic => {
                lines.push(format!("Username: {}", self.username));
                lines.push(format!("Password: {}", mask_sensitive(&self.password)));
            }
        }
        let expiry = self
            .expiry
            .map_or_else(|| "Not set".to_string(), |e| e.format("%Y-%m-%d %H:%M").to_string());
        lines.push(format!("Expiry: {expiry}"));
        lines.push(format!("Active: {}", if self.active { "yes" } else { "no" }));
        lines.join("\n")
    }
}

/// Masks a secret for display.
///
/// Empty values read `Not set`; values of at most eight characters are fully
/// hidden; longer values keep their first and last four characters.
#[must_use]
pub fn mask_sensitive(value: &str) -> String {
    if value.is_empty() {
        return "Not set".to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

/// Parses a user-entered expiry time, interpreted as UTC.
///
/// # Errors
///
/// Returns [`AuthError::InvalidExpiry`] when no accepted format matches.
pub fn parse_expiry(input: &str) -> Result<Option<DateTime<Utc>>, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Some(parsed.and_utc()));
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| AuthError::InvalidExpiry(input.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_json_layout() {
        let profile = AuthProfile::api_key("svc", "abcdef", "");
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["type"], "apikey");
        assert_eq!(value["api_key"], "abcdef");
        assert_eq!(value["active"], false);
        assert!(value["expiry"].is_null());

        let parsed: AuthProfile =
            serde_json::from_str(r#"{"name":"legacy","type":"oauth","token":"t"}"#).unwrap();
        assert_eq!(parsed.kind, ProfileKind::OAuth);
        assert!(!parsed.active);
    }

    #[test]
    fn test_header_name_defaults() {
        assert_eq!(AuthProfile::api_key("a", "k", "").header_name(), "X-API-Key");
        assert_eq!(AuthProfile::api_key("a", "k", " ").header_name(), "X-API-Key");
        assert_eq!(AuthProfile::api_key("a", "k", "X-Custom").header_name(), "X-Custom");
    }

    #[test]
    fn test_credential_dispatch() {
        assert_eq!(
            AuthProfile::bearer("b", "tok").credential().unwrap(),
            Credential::Bearer("tok".to_string())
        );
        let mut oauth = AuthProfile::new("o", ProfileKind::OAuth);
        oauth.token = "otok".to_string();
        assert_eq!(oauth.credential().unwrap(), Credential::Bearer("otok".to_string()));
        assert!(matches!(
            AuthProfile::api_key("k", "", "X").credential(),
            Err(AuthError::InvalidProfile { .. })
        ));
        assert!(AuthProfile::basic("u", "ana", "").credential().is_err());
        assert!(AuthProfile::bearer("b", "").credential().is_err());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let profile = AuthProfile::bearer("b", "t");
        assert!(!profile.is_expired(now));
        assert!(profile.clone().with_expiry(now).is_expired(now));
        assert!(!profile.with_expiry(now + Duration::minutes(1)).is_expired(now));
    }

    #[test]
    fn test_mask_sensitive() {
        assert_eq!(mask_sensitive(""), "Not set");
        assert_eq!(mask_sensitive("12345678"), "****");
        assert_eq!(mask_sensitive("sk-abcdef123456"), "sk-a****3456");
        assert_eq!(mask_sensitive("ééééééééé"), "éééé****éééé");
    }

    #[test]
    fn test_summary_masks_secrets() {
        let summary = AuthProfile::basic("p", "ana", "supersecretpw").summary();
        assert!(summary.contains("Password: supe****etpw"));
        assert!(!summary.contains("supersecretpw"));
    }

    #[test]
    fn test_parse_expiry_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 4, 10, 30, 0).unwrap();
        assert_eq!(parse_expiry("2026-03-04 10:30").unwrap(), Some(expected));
        assert_eq!(parse_expiry("2026-03-04T10:30:00Z").unwrap(), Some(expected));
        assert_eq!(parse_expiry("2026-03-04T10:30:00").unwrap(), Some(expected));
        assert_eq!(parse_expiry("2026-03-04T12:30:00+02:00").unwrap(), Some(expected));
        assert_eq!(
            parse_expiry("2026-03-04").unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_expiry("").unwrap(), None);
        assert!(matches!(parse_expiry("tomorrow"), Err(AuthError::InvalidExpiry(_))));
    }
}
