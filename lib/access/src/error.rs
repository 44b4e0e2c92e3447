//! Error types for the access crate.
//!
//! Every failure surfaced to a client falls into one of five categories. A
//! provider failure is wrapped into the closest category and kept as the
//! error's source so logs can still show what the provider said.

use std::fmt;
use supagate_provider::{ProviderError, ProviderErrorKind};

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Sign-in refused, locally or by the provider.
    InvalidCredentials {
        reason: String,
        source: Option<ProviderError>,
    },
    /// The access token is past its expiry. Clients should refresh.
    TokenExpired { source: Option<ProviderError> },
    /// The access token (or a token-bound operation) was rejected.
    InvalidToken {
        reason: String,
        source: Option<ProviderError>,
    },
    /// No token was presented.
    MissingToken,
    /// The refresh token couldn't be exchanged for a new session.
    RefreshFailed {
        reason: String,
        source: Option<ProviderError>,
    },
}

impl AuthError {
    /// Sign-in refused before reaching the provider.
    #[must_use]
    pub fn invalid_credentials(reason: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            reason: reason.into(),
            source: None,
        }
    }

    /// Token rejected without a provider error to attach.
    #[must_use]
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
            source: None,
        }
    }

    /// Wraps a failed token lookup, keeping expiry distinct from other
    /// rejections.
    #[must_use]
    pub fn from_token_rejection(error: ProviderError) -> Self {
        match error.kind() {
            ProviderErrorKind::TokenExpired => Self::TokenExpired {
                source: Some(error),
            },
            _ => Self::InvalidToken {
                reason: "Invalid token".to_string(),
                source: Some(error),
            },
        }
    }

    /// Short category name, used as the `error` field of response bodies.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { .. } => "InvalidCredentials",
            Self::TokenExpired { .. } => "TokenExpired",
            Self::InvalidToken { .. } => "InvalidToken",
            Self::MissingToken => "MissingToken",
            Self::RefreshFailed { .. } => "RefreshFailed",
        }
    }

    /// Whether a client holding a refresh token should use it now.
    #[must_use]
    pub fn should_refresh(&self) -> bool {
        matches!(self, Self::TokenExpired { .. })
    }

    /// Kind of the wrapped provider failure, if there is one.
    #[must_use]
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        self.provider_error().map(ProviderError::kind)
    }

    /// The wrapped provider failure, if there is one.
    #[must_use]
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::InvalidCredentials { source, .. }
            | Self::TokenExpired { source }
            | Self::InvalidToken { source, .. }
            | Self::RefreshFailed { source, .. } => source.as_ref(),
            Self::MissingToken => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials { reason, .. } => write!(f, "{reason}"),
            Self::TokenExpired { .. } => write!(f, "Token has expired"),
            Self::InvalidToken { reason, .. } => write!(f, "{reason}"),
            Self::MissingToken => write!(f, "No token provided"),
            Self::RefreshFailed { reason, .. } => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.provider_error()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
