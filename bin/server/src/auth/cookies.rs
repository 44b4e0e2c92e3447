//! Access and refresh token cookies.

use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use supagate_core::{AccessToken, RefreshToken, Session};
use time::Duration;

use crate::config::{CookieConfig, Environment};

/// Access token cookie name.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Refresh token cookie name.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

const MIN_REFRESH_DAYS: i64 = 7;
const MAX_REFRESH_DAYS: i64 = 30;

/// Flags and lifetimes for the token cookies.
///
/// Both cookies are `HttpOnly`. In production both are `Secure`, and the
/// access cookie's `SameSite` goes from `Lax` to `Strict`. The refresh
/// cookie is always `Strict`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    production: bool,
    refresh_path: String,
    refresh_max_age: Duration,
}

impl CookiePolicy {
    /// Creates the default policy for the given environment.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            production: environment.is_production(),
            refresh_path: "/".to_string(),
            refresh_max_age: Duration::days(MIN_REFRESH_DAYS),
        }
    }

    /// Creates a policy from configuration.
    #[must_use]
    pub fn from_config(environment: Environment, config: &CookieConfig) -> Self {
        Self::new(environment)
            .with_refresh_path(config.refresh_path.clone())
            .with_refresh_max_age_days(config.refresh_max_age_days)
    }

    /// Scopes the refresh cookie to `path`.
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Sets the refresh cookie lifetime, clamped to 7..=30 days.
    #[must_use]
    pub fn with_refresh_max_age_days(mut self, days: i64) -> Self {
        self.refresh_max_age = Duration::days(days.clamp(MIN_REFRESH_DAYS, MAX_REFRESH_DAYS));
        self
    }

    fn access_same_site(&self) -> SameSite {
        if self.production {
            SameSite::Strict
        } else {
            SameSite::Lax
        }
    }

    /// Builds the access token cookie.
    #[must_use]
    pub fn access_cookie(&self, token: &AccessToken) -> Cookie<'static> {
        Cookie::build((ACCESS_TOKEN_COOKIE, token.as_str().to_string()))
            .path("/")
            .http_only(true)
            .secure(self.production)
            .same_site(self.access_same_site())
            .max_age(Duration::hours(1))
            .build()
    }

    /// Builds the refresh token cookie.
    #[must_use]
    pub fn refresh_cookie(&self, token: &RefreshToken) -> Cookie<'static> {
        Cookie::build((REFRESH_TOKEN_COOKIE, token.as_str().to_string()))
            .path(self.refresh_path.clone())
            .http_only(true)
            .secure(self.production)
            .same_site(SameSite::Strict)
            .max_age(self.refresh_max_age)
            .build()
    }

    /// Builds expired, empty versions of both cookies on their usual paths.
    #[must_use]
    pub fn clearing_cookies(&self) -> [Cookie<'static>; 2] {
        let access = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.production)
            .same_site(self.access_same_site())
            .max_age(Duration::ZERO)
            .build();
        let refresh = Cookie::build((REFRESH_TOKEN_COOKIE, ""))
            .path(self.refresh_path.clone())
            .http_only(true)
            .secure(self.production)
            .same_site(SameSite::Strict)
            .max_age(Duration::ZERO)
            .build();
        [access, refresh]
    }

    /// Adds both session cookies to `jar`.
    #[must_use]
    pub fn set_session(&self, jar: CookieJar, session: &Session) -> CookieJar {
        jar.add(self.access_cookie(&session.access_token))
            .add(self.refresh_cookie(&session.refresh_token))
    }

    /// Adds clearing cookies to `jar`.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let [access, refresh] = self.clearing_cookies();
        jar.add(access).add(refresh)
    }

    /// Appends `Set-Cookie` headers for both session cookies.
    ///
    /// Used by middleware that rotates the session after the handler has
    /// already built its response.
    pub fn append_session(&self, headers: &mut HeaderMap, session: &Session) {
        for cookie in [
            self.access_cookie(&session.access_token),
            self.refresh_cookie(&session.refresh_token),
        ] {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = cookie.name(), error = %e, "Skipping unencodable cookie");
                }
            }
        }
    }
}

/// Returns true when `headers` already set or clear a session cookie.
#[must_use]
pub fn sets_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .any(|cookie| matches!(cookie.name(), ACCESS_TOKEN_COOKIE | REFRESH_TOKEN_COOKIE))
}
