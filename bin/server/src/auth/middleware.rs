//! Authentication middleware and extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, Uri, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use supagate_access::{AuthError, Resolution};
use supagate_core::{AccessToken, User};

use super::{AppState, cookies, extract, rejection::AuthRejection};

/// Identity attached to a request once its access token has been accepted.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user the provider reported for the token.
    pub user: User,
    /// The access token that was accepted (the new one after a refresh).
    pub access_token: AccessToken,
}

/// Refresh-on-expiry middleware.
///
/// Never rejects. When both tokens are present it validates the access
/// token, refreshes once if the provider reports it stale, rewrites the
/// request's `Authorization` header and attaches the identity. The rotated
/// cookies are set on the way out unless the handler already set or cleared
/// the session cookies itself. Session routes pass straight through.
pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.session_routes.matches(request.uri().path()) {
        return next.run(request).await;
    }

    let tokens = extract::candidate_tokens(request.headers());
    let mut rotated = None;

    match state.resolver.resolve(&tokens).await {
        Resolution::Authenticated(user) => {
            if let Some(access_token) = tokens.access {
                request
                    .extensions_mut()
                    .insert(AuthenticatedUser { user, access_token });
            }
        }
        Resolution::Refreshed { session, user } => {
            match HeaderValue::from_str(&format!("Bearer {}", session.access_token.as_str())) {
                Ok(value) => {
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(e) => tracing::warn!(error = %e, "Refreshed access token is not a valid header"),
            }
            if let Some(user) = user {
                request.extensions_mut().insert(AuthenticatedUser {
                    user,
                    access_token: session.access_token.clone(),
                });
            }
            rotated = Some(session);
        }
        Resolution::Unauthenticated(cause) => {
            tracing::trace!(?cause, "Continuing without identity");
        }
    }

    let mut response = next.run(request).await;
    if let Some(session) = rotated {
        if cookies::sets_session_cookie(response.headers()) {
            tracing::debug!("Handler set session cookies; dropping rotated pair");
        } else {
            state.cookies.append_session(response.headers_mut(), &session);
        }
    }
    response
}

/// Route guard.
///
/// Public routes and requests already carrying an identity pass through.
/// Everything else needs an access token the provider accepts.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if state.public_routes.matches(request.uri().path())
        || request.extensions().get::<AuthenticatedUser>().is_some()
    {
        return next.run(request).await;
    }

    match authenticate(&state, request.headers(), request.uri()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<AuthenticatedUser, AuthRejection> {
    let access_token = state
        .extractor
        .extract(headers, uri)
        .ok_or_else(|| AuthRejection::new(AuthError::MissingToken, uri.path()))?;

    let user = state
        .auth
        .get_user(&access_token)
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    Ok(AuthenticatedUser { user, access_token })
}

/// Extractor for requiring an authenticated user.
///
/// Uses the identity attached by the middleware when there is one, and
/// otherwise validates the request's token itself.
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(RequireAuth(identity.clone()));
        }

        let app_state = Arc::<AppState>::from_ref(state);
        authenticate(&app_state, &parts.headers, &parts.uri)
            .await
            .map(RequireAuth)
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Returns None if the user is not authenticated.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// The access token a request presents, without validating it.
///
/// Prefers the token of an attached identity, which is the rotated one
/// after a refresh.
pub struct PresentedToken(pub Option<AccessToken>);

impl<S> FromRequestParts<S> for PresentedToken
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(PresentedToken(Some(identity.access_token.clone())));
        }

        let app_state = Arc::<AppState>::from_ref(state);
        Ok(PresentedToken(
            app_state.extractor.extract(&parts.headers, &parts.uri),
        ))
    }
}
