//! Authentication module for the supagate server.
//!
//! This module provides:
//! - Token extraction from headers, query strings and cookies
//! - The refresh middleware that transparently rotates stale sessions
//! - The route guard and `RequireAuth`/`OptionalAuth` extractors
//! - Cookie policy and the `/auth/*` handlers
//!
//! Layer order matters: the refresh middleware must run before the guard so
//! that a request arriving with a stale access token is refreshed instead of
//! rejected. Session routes (sign-in and the refresh endpoint) issue their
//! own cookies and are skipped by the refresh middleware.

pub mod cookies;
pub mod extract;
pub mod middleware;
pub mod rejection;
pub mod routes;

use std::collections::BTreeSet;
use std::sync::Arc;
use supagate_access::{AuthService, SessionResolver};
use supagate_provider::IdentityProvider;

pub use cookies::{CookiePolicy, sets_session_cookie};
pub use extract::{StrategyExtractor, TokenExtractor, fn_extractor};
pub use middleware::{AuthenticatedUser, OptionalAuth, RequireAuth, refresh_session, require_auth};
pub use rejection::AuthRejection;

/// A set of request paths, matched exactly or by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSet {
    exact: BTreeSet<String>,
    prefixes: BTreeSet<String>,
}

impl RouteSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.exact.insert(path.into());
        self
    }

    /// Adds every path under `prefix`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into());
        self
    }

    /// Returns true when `path` is in the set.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Shared application state.
pub struct AppState {
    /// Authentication operations.
    pub auth: AuthService,
    /// Refresh-on-expiry resolver used by the refresh middleware.
    pub resolver: SessionResolver,
    /// Cookie flags and lifetimes.
    pub cookies: CookiePolicy,
    /// How the guard finds the access token.
    pub extractor: Arc<dyn TokenExtractor>,
    /// Routes the guard skips.
    pub public_routes: RouteSet,
    /// Routes whose handlers issue session cookies; the refresh middleware
    /// skips them.
    pub session_routes: RouteSet,
    /// Omit the refresh token from session bodies.
    pub strip_refresh_token: bool,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// Sign-in, token refresh, sign-out and the health check are public by
    /// default. Sign-out without a valid token still clears the cookies.
    pub fn new(provider: Arc<dyn IdentityProvider>, cookies: CookiePolicy) -> Self {
        let auth = AuthService::new(provider);
        Self {
            resolver: auth.resolver(),
            auth,
            cookies,
            extractor: Arc::new(StrategyExtractor),
            public_routes: RouteSet::new()
                .path("/health")
                .path("/auth/signin")
                .path("/auth/token/refresh")
                .path("/auth/signout"),
            session_routes: RouteSet::new()
                .path("/auth/signin")
                .path("/auth/token/refresh"),
            strip_refresh_token: false,
        }
    }

    /// Replaces the guard's token extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Replaces the public route set.
    #[must_use]
    pub fn with_public_routes(mut self, public_routes: RouteSet) -> Self {
        self.public_routes = public_routes;
        self
    }

    /// Replaces the routes the refresh middleware skips.
    #[must_use]
    pub fn with_session_routes(mut self, session_routes: RouteSet) -> Self {
        self.session_routes = session_routes;
        self
    }

    /// Sets whether session bodies leave out the refresh token.
    #[must_use]
    pub fn with_strip_refresh_token(mut self, strip: bool) -> Self {
        self.strip_refresh_token = strip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_set_matches_exact_and_prefix() {
        let routes = RouteSet::new().path("/health").prefix("/public/");
        assert!(routes.matches("/health"));
        assert!(!routes.matches("/health/deep"));
        assert!(routes.matches("/public/docs"));
        assert!(!routes.matches("/auth/user"));
    }

    #[test]
    fn empty_set_matches_nothing() {
        assert!(!RouteSet::new().matches("/"));
    }
}
