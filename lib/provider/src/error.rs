//! Error types for identity provider calls.
//!
//! Every failure carries a `ProviderErrorKind`. The kind is decided once, at
//! the point where the provider's response is decoded, and callers branch on
//! it instead of on the provider's message text.

use std::fmt;

/// Structured classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The access token was well-formed but is past its expiry.
    TokenExpired,
    /// The access token was rejected for any other reason.
    TokenInvalid,
    /// Email/password sign-in was refused.
    InvalidCredentials,
    /// The refresh token is unknown, revoked or already used.
    RefreshTokenInvalid,
    /// The operation needs configuration that is missing (e.g. service-role key).
    NotConfigured,
    /// The provider could not be reached, timed out, or failed server-side.
    Unavailable,
    /// The provider answered with something this client doesn't understand.
    Unexpected,
}

impl ProviderErrorKind {
    /// Whether a refresh attempt may recover from this failure.
    #[must_use]
    pub fn is_refreshable(self) -> bool {
        matches!(self, Self::TokenExpired | Self::TokenInvalid)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::TokenExpired => "token expired",
            Self::TokenInvalid => "token invalid",
            Self::InvalidCredentials => "invalid credentials",
            Self::RefreshTokenInvalid => "refresh token invalid",
            Self::NotConfigured => "not configured",
            Self::Unavailable => "provider unavailable",
            Self::Unexpected => "unexpected provider response",
        };
        f.write_str(label)
    }
}

/// A failed identity provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    status: Option<u16>,
}

impl ProviderError {
    /// Creates an error of the given kind.
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attaches the HTTP status the provider answered with.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the structured kind.
    #[must_use]
    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns the provider's message (or a local description).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, when the provider answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.kind, status, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_token_failures_are_refreshable() {
        assert!(ProviderErrorKind::TokenExpired.is_refreshable());
        assert!(ProviderErrorKind::TokenInvalid.is_refreshable());
        assert!(!ProviderErrorKind::Unavailable.is_refreshable());
        assert!(!ProviderErrorKind::RefreshTokenInvalid.is_refreshable());
        assert!(!ProviderErrorKind::InvalidCredentials.is_refreshable());
    }

    #[test]
    fn display_includes_status_when_known() {
        let err = ProviderError::new(ProviderErrorKind::TokenExpired, "token is expired")
            .with_status(403);
        assert_eq!(err.to_string(), "token expired (HTTP 403): token is expired");
    }

    #[test]
    fn display_without_status() {
        let err = ProviderError::new(ProviderErrorKind::Unavailable, "connection refused");
        assert_eq!(err.to_string(), "provider unavailable: connection refused");
        assert!(err.status().is_none());
    }
}
