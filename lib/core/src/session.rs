//! Session tokens issued by the provider.
//!
//! A session is never created, persisted or expired locally. It is the
//! provider's sign-in or refresh response, relayed to cookies and bodies.

use serde::{Deserialize, Serialize};

use crate::token::{AccessToken, RefreshToken};
use crate::user::User;

fn default_token_type() -> String {
    "bearer".to_string()
}

/// A provider-issued session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer credential.
    pub access_token: AccessToken,
    /// Credential used to rotate the session.
    pub refresh_token: RefreshToken,
    /// Token type reported by the provider (normally `bearer`).
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry of the access token as a unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// The user the session belongs to, when the provider includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    /// Milliseconds until the access token expires, relative to `now_ms`.
    ///
    /// Returns `None` when the provider didn't report an absolute expiry.
    #[must_use]
    pub fn expires_in_ms(&self, now_ms: i64) -> Option<i64> {
        self.expires_at
            .map(|at| at.saturating_mul(1000).saturating_sub(now_ms))
    }
}
