//! Platform credentials.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh token pair with an expiry.
///
/// Owned by a credential store; the uploader and catalog client borrow it per
/// call and never refresh it themselves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Credential valid for the given duration from now.
    pub fn valid_for(access_token: impl Into<String>, ttl: Duration) -> Self {
        Self::new(access_token, Utc::now() + ttl)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Token usable for a request: present and unexpired.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let valid = Credential::valid_for("token", Duration::minutes(10));
        assert!(valid.is_usable());

        let expired = Credential::valid_for("token", Duration::minutes(-1));
        assert!(expired.is_expired());
        assert!(!expired.is_usable());

        let blank = Credential::valid_for("", Duration::minutes(10));
        assert!(!blank.is_usable());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let cred = Credential::valid_for("secret-access", Duration::minutes(10))
            .with_refresh_token("secret-refresh");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("<redacted>"));
    }
}
