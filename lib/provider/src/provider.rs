//! The identity provider seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use supagate_core::{AccessToken, RefreshToken, Session, User};

use crate::error::ProviderError;

/// How far a sign-out reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutScope {
    /// Revoke only the session the token belongs to.
    Local,
    /// Revoke every session of the user.
    Global,
}

impl SignOutScope {
    /// Returns the provider's query value for this scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for SignOutScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an admin magic-link generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLink {
    /// The hashed one-time token embedded in the generated link.
    pub hashed_token: String,
}

/// Trait for hosted identity providers.
///
/// Implementations own every cryptographic and storage concern. Callers only
/// move tokens in and out and branch on `ProviderError::kind`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs a user in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the provider refuses the pair.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError>;

    /// Looks up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` or `TokenInvalid` when the token is rejected.
    async fn get_user(&self, access_token: &AccessToken) -> Result<User, ProviderError>;

    /// Exchanges a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `RefreshTokenInvalid` when the token can't be used.
    async fn refresh_session(&self, refresh_token: &RefreshToken)
    -> Result<Session, ProviderError>;

    /// Revokes sessions for the token's user within `scope`.
    async fn sign_out(
        &self,
        access_token: Option<&AccessToken>,
        scope: SignOutScope,
    ) -> Result<(), ProviderError>;

    /// Generates a magic link for `email` using admin privileges.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when no service-role key is available.
    async fn generate_magic_link(&self, email: &str) -> Result<MagicLink, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_query_values() {
        assert_eq!(SignOutScope::Local.as_str(), "local");
        assert_eq!(SignOutScope::Global.to_string(), "global");
    }

    #[test]
    fn scope_serde_uses_snake_case() {
        let json = serde_json::to_string(&SignOutScope::Global).expect("serialize");
        assert_eq!(json, "\"global\"");
    }
}
