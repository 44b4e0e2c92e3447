//! Identity record returned by the provider.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An authenticated user as described by the identity provider.
///
/// Only the identifier and email are typed. Every other field the provider
/// sends (metadata, timestamps, factors) is kept verbatim in `extra` and
/// written back out unchanged when the user is relayed to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned unique identifier.
    pub id: String,
    /// Primary email address, if the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining provider fields, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Creates a user with only an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            extra: Map::new(),
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_fields_survive_relay() {
        let json = r#"{
            "id": "8d0fd2b3-0a4e-4c43-9a5e-0e3c4f1d2b11",
            "aud": "authenticated",
            "email": "alice@example.com",
            "app_metadata": {"provider": "email"}
        }"#;
        let user: User = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.extra["aud"], "authenticated");

        let out = serde_json::to_value(&user).expect("serialize");
        assert_eq!(out["app_metadata"]["provider"], "email");
        assert_eq!(out["id"], "8d0fd2b3-0a4e-4c43-9a5e-0e3c4f1d2b11");
    }

    #[test]
    fn user_without_email_omits_field() {
        let user = User::new("usr-1");
        let out = serde_json::to_value(&user).expect("serialize");
        assert!(out.get("email").is_none());
    }
}
