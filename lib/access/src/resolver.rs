//! Refresh-on-expiry session resolution.
//!
//! Given the tokens found on a request, decide who (if anyone) the request
//! is authenticated as. The resolver never fails: every outcome, including
//! provider errors, is a [`Resolution`] variant. At most one refresh and one
//! retried lookup happen per call.

use std::sync::Arc;
use supagate_core::{AccessToken, RefreshToken, Session, User};
use supagate_provider::IdentityProvider;
use tracing::{debug, instrument, warn};

use crate::error::AuthError;

/// Tokens located on an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTokens {
    pub access: Option<AccessToken>,
    pub refresh: Option<RefreshToken>,
}

impl CandidateTokens {
    /// Creates a candidate pair.
    #[must_use]
    pub fn new(access: Option<AccessToken>, refresh: Option<RefreshToken>) -> Self {
        Self { access, refresh }
    }
}

/// Why a request ended up unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthenticatedCause {
    /// The access or refresh token was missing; the provider wasn't asked.
    MissingTokens,
    /// The provider rejected the access token in a way refreshing can't fix.
    Rejected(AuthError),
    /// The access token was stale and the refresh attempt failed.
    RefreshFailed(AuthError),
}

/// Outcome of resolving a request's tokens.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Proceed without an identity.
    Unauthenticated(UnauthenticatedCause),
    /// The presented access token is valid.
    Authenticated(User),
    /// A new session was issued. `user` is `None` when the follow-up lookup
    /// with the new access token failed; the session is still valid and
    /// must be handed back to the client.
    Refreshed {
        session: Session,
        user: Option<User>,
    },
}

impl Resolution {
    /// The resolved identity, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Refreshed { user, .. } => user.as_ref(),
            Self::Unauthenticated(_) => None,
        }
    }
}

/// Validates an access token and refreshes it once when it went stale.
#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResolver").finish_non_exhaustive()
    }
}

impl SessionResolver {
    /// Creates a resolver backed by `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Resolves `tokens` into an identity.
    ///
    /// Both tokens must be present for the provider to be consulted.
    #[instrument(skip_all, fields(
        has_access = tokens.access.is_some(),
        has_refresh = tokens.refresh.is_some(),
    ))]
    pub async fn resolve(&self, tokens: &CandidateTokens) -> Resolution {
        let (Some(access), Some(refresh)) = (&tokens.access, &tokens.refresh) else {
            return Resolution::Unauthenticated(UnauthenticatedCause::MissingTokens);
        };

        let error = match self.provider.get_user(access).await {
            Ok(user) => return Resolution::Authenticated(user),
            Err(error) => error,
        };

        if !error.kind().is_refreshable() {
            warn!(error = %error, "access token lookup failed; continuing unauthenticated");
            return Resolution::Unauthenticated(UnauthenticatedCause::Rejected(
                AuthError::from_token_rejection(error),
            ));
        }

        debug!(kind = %error.kind(), "access token stale; refreshing");
        let session = match self.provider.refresh_session(refresh).await {
            Ok(session) => session,
            Err(error) => {
                warn!(error = %error, "session refresh failed; continuing unauthenticated");
                return Resolution::Unauthenticated(UnauthenticatedCause::RefreshFailed(
                    AuthError::RefreshFailed {
                        reason: format!("Failed to refresh token: {}", error.message()),
                        source: Some(error),
                    },
                ));
            }
        };

        let user = match self.provider.get_user(&session.access_token).await {
            Ok(user) => Some(user),
            Err(error) => {
                warn!(error = %error, "lookup with refreshed token failed");
                None
            }
        };

        Resolution::Refreshed { session, user }
    }
}
