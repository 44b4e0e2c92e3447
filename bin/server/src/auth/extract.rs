//! Locating tokens on inbound requests.
//!
//! Two orders are used:
//! - The route guard's strategy: `Authorization: Bearer`, then the
//!   `access_token` query parameter, then the `access_token` cookie. A
//!   present header with the wrong scheme yields nothing.
//! - The refresh middleware: access token from `Authorization: Bearer` or
//!   the cookie; refresh token from the cookie or `x-refresh-token`.

use axum::extract::Query;
use axum::http::{HeaderMap, Uri, header::AUTHORIZATION};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use supagate_access::CandidateTokens;
use supagate_core::{AccessToken, RefreshToken};

use super::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

/// Header carrying a refresh token for clients that can't send cookies.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Finds the access token the route guard should validate.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Option<AccessToken>;
}

/// Header, then query parameter, then cookie.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyExtractor;

#[derive(Debug, Deserialize)]
struct AccessTokenQuery {
    access_token: Option<String>,
}

impl TokenExtractor for StrategyExtractor {
    fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Option<AccessToken> {
        if let Some(value) = headers.get(AUTHORIZATION) {
            let value = value.to_str().ok()?;
            let parts: Vec<&str> = value.split(' ').collect();
            return match parts.as_slice() {
                ["Bearer", token] => AccessToken::new(*token),
                _ => None,
            };
        }

        if let Some(token) = Query::<AccessTokenQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(q)| q.access_token)
        {
            return AccessToken::new(token);
        }

        cookie(headers, ACCESS_TOKEN_COOKIE).and_then(AccessToken::new)
    }
}

/// A [`TokenExtractor`] backed by a closure returning the raw token.
pub struct FnExtractor<F>(F);

/// Wraps `f` as a [`TokenExtractor`]. Empty strings count as no token.
pub fn fn_extractor<F>(f: F) -> FnExtractor<F>
where
    F: Fn(&HeaderMap, &Uri) -> Option<String> + Send + Sync,
{
    FnExtractor(f)
}

impl<F> TokenExtractor for FnExtractor<F>
where
    F: Fn(&HeaderMap, &Uri) -> Option<String> + Send + Sync,
{
    fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Option<AccessToken> {
        (self.0)(headers, uri).and_then(AccessToken::new)
    }
}

impl<F> std::fmt::Debug for FnExtractor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnExtractor")
    }
}

/// Access token for the refresh middleware: bearer header, else cookie.
pub fn access_token(headers: &HeaderMap) -> Option<AccessToken> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(AccessToken::new)
        .or_else(|| cookie(headers, ACCESS_TOKEN_COOKIE).and_then(AccessToken::new))
}

/// Refresh token for the refresh middleware: cookie, else header.
pub fn refresh_token(headers: &HeaderMap) -> Option<RefreshToken> {
    cookie(headers, REFRESH_TOKEN_COOKIE)
        .and_then(RefreshToken::new)
        .or_else(|| {
            headers
                .get(REFRESH_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(RefreshToken::new)
        })
}

/// Both tokens as the refresh middleware sees them.
pub fn candidate_tokens(headers: &HeaderMap) -> CandidateTokens {
    CandidateTokens::new(access_token(headers), refresh_token(headers))
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|c| c.value().to_string())
}
