//! Authentication operations on top of an identity provider.

use std::sync::Arc;
use supagate_core::{AccessToken, RefreshToken, Session, User};
use supagate_provider::{IdentityProvider, MagicLink, SignOutScope};
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::resolver::SessionResolver;

/// Result of a successful email/password sign-in.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: User,
    pub session: Session,
}

/// Stateless front for the identity provider.
///
/// Validates input locally where that saves a round-trip, then maps every
/// provider failure onto an [`AuthError`] category.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Creates a service backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Returns a resolver sharing this service's provider.
    #[must_use]
    pub fn resolver(&self) -> SessionResolver {
        SessionResolver::new(Arc::clone(&self.provider))
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for a malformed email or empty password
    /// (without contacting the provider), or when the provider refuses.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::invalid_credentials("Invalid email format"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_credentials("Password cannot be empty"));
        }

        let mut session = self
            .provider
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| AuthError::InvalidCredentials {
                reason: e.message().to_string(),
                source: Some(e),
            })?;

        let user = match session.user.take() {
            Some(user) => user,
            None => self
                .provider
                .get_user(&session.access_token)
                .await
                .map_err(|e| AuthError::InvalidCredentials {
                    reason: "Sign in failed".to_string(),
                    source: Some(e),
                })?,
        };
        session.user = Some(user.clone());

        debug!(user_id = %user.id, "signed in");
        Ok(SignIn { user, session })
    }

    /// Looks up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` for an expired token and `InvalidToken` for any
    /// other rejection.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &AccessToken) -> Result<User, AuthError> {
        self.provider
            .get_user(access_token)
            .await
            .map_err(AuthError::from_token_rejection)
    }

    /// Exchanges a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `RefreshFailed` when the provider refuses the token.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &RefreshToken) -> Result<Session, AuthError> {
        self.provider
            .refresh_session(refresh_token)
            .await
            .map_err(|e| {
                warn!(error = %e, "token refresh failed");
                AuthError::RefreshFailed {
                    reason: format!("Failed to refresh token: {}", e.message()),
                    source: Some(e),
                }
            })
    }

    /// Signs out. With a token only that session ends; without one the
    /// scope is global. Returns the scope that was used.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the provider fails the sign-out.
    #[instrument(skip_all, fields(has_token = access_token.is_some()))]
    pub async fn sign_out(
        &self,
        access_token: Option<&AccessToken>,
    ) -> Result<SignOutScope, AuthError> {
        let scope = if access_token.is_some() {
            SignOutScope::Local
        } else {
            SignOutScope::Global
        };
        self.revoke(access_token, scope).await?;
        Ok(scope)
    }

    /// Ends every session of the token's user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the provider fails the sign-out.
    #[instrument(skip_all)]
    pub async fn sign_out_everywhere(&self, access_token: &AccessToken) -> Result<(), AuthError> {
        self.revoke(Some(access_token), SignOutScope::Global).await
    }

    async fn revoke(
        &self,
        access_token: Option<&AccessToken>,
        scope: SignOutScope,
    ) -> Result<(), AuthError> {
        self.provider
            .sign_out(access_token, scope)
            .await
            .map_err(|e| AuthError::InvalidToken {
                reason: format!("Failed to sign out: {}", e.message()),
                source: Some(e),
            })
    }

    /// Generates a magic link for the user owning `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` when the token is rejected, the user has no
    /// email, or the provider can't generate the link.
    #[instrument(skip_all)]
    pub async fn generate_magic_link(
        &self,
        access_token: &AccessToken,
    ) -> Result<MagicLink, AuthError> {
        let user = self.provider.get_user(access_token).await.map_err(|e| {
            AuthError::InvalidToken {
                reason: "Invalid user token".to_string(),
                source: Some(e),
            }
        })?;

        let email = user
            .email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::invalid_token("User email not found"))?;

        self.provider
            .generate_magic_link(email)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user.id, "magic link generation failed");
                AuthError::InvalidToken {
                    reason: "Failed to generate magic link".to_string(),
                    source: Some(e),
                }
            })
    }
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with at least one character on each side.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
