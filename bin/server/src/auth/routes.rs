//! Authentication routes: sign-in, token refresh, current user, sign-out
//! and magic links.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::Uri,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use supagate_access::AuthError;
use supagate_core::{RefreshToken, Session};

use super::{
    AppState,
    cookies::REFRESH_TOKEN_COOKIE,
    middleware::{PresentedToken, RequireAuth},
    rejection::AuthRejection,
};

/// Body of `POST /auth/signin`.
///
/// Missing fields deserialize as empty strings so they fail local
/// validation with a 401 like any other bad credential.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Body of `POST /auth/token/refresh`.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Session as exposed in response bodies.
#[derive(Debug, Serialize)]
pub struct SessionBody {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in_ms: Option<i64>,
}

impl SessionBody {
    /// Shapes `session` for a response body.
    ///
    /// With `strip_refresh_token` the refresh token only travels in its
    /// cookie.
    #[must_use]
    pub fn new(session: &Session, strip_refresh_token: bool, now_ms: i64) -> Self {
        Self {
            access_token: session.access_token.as_str().to_string(),
            refresh_token: (!strip_refresh_token)
                .then(|| session.refresh_token.as_str().to_string()),
            expires_in: session.expires_in,
            expires_at: session.expires_at,
            expires_in_ms: session.expires_in_ms(now_ms),
        }
    }

    fn for_state(state: &AppState, session: &Session) -> Self {
        Self::new(
            session,
            state.strip_refresh_token,
            chrono::Utc::now().timestamp_millis(),
        )
    }
}

/// Signs in with email and password and sets both session cookies.
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
    Json(body): Json<SignInRequest>,
) -> Result<impl IntoResponse, AuthRejection> {
    let signed_in = state
        .auth
        .sign_in(&body.email, &body.password)
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    tracing::info!(user_id = %signed_in.user.id, "User signed in");

    let jar = state.cookies.set_session(jar, &signed_in.session);
    Ok((
        jar,
        Json(json!({
            "message": "Login successful",
            "user": signed_in.user,
            "tokens": SessionBody::for_state(&state, &signed_in.session),
        })),
    ))
}

/// Exchanges a refresh token for a new session and rotates the cookies.
///
/// The token comes from the JSON body, falling back to the cookie.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AuthRejection> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|request| request.refresh_token)
    };

    let refresh_token = from_body
        .and_then(RefreshToken::new)
        .or_else(|| {
            jar.get(REFRESH_TOKEN_COOKIE)
                .and_then(|cookie| RefreshToken::new(cookie.value()))
        })
        .ok_or_else(|| {
            AuthRejection::new(
                AuthError::RefreshFailed {
                    reason: "No refresh token provided".to_string(),
                    source: None,
                },
                uri.path(),
            )
        })?;

    let session = state
        .auth
        .refresh_session(&refresh_token)
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    let jar = state.cookies.set_session(jar, &session);
    Ok((
        jar,
        Json(json!({
            "message": "Token refreshed successfully",
            "tokens": SessionBody::for_state(&state, &session),
        })),
    ))
}

/// Returns the authenticated user.
pub async fn current_user(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
    Json(json!({ "user": identity.user }))
}

/// Signs out the presented session (or globally without a token) and
/// clears both cookies.
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
    PresentedToken(access_token): PresentedToken,
) -> Result<impl IntoResponse, AuthRejection> {
    let scope = state
        .auth
        .sign_out(access_token.as_ref())
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    tracing::info!(%scope, "User signed out");

    Ok((
        state.cookies.clear(jar),
        Json(json!({ "message": "Signed out successfully" })),
    ))
}

/// Ends every session of the authenticated user and clears both cookies.
pub async fn sign_out_all(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    jar: CookieJar,
    RequireAuth(identity): RequireAuth,
) -> Result<impl IntoResponse, AuthRejection> {
    state
        .auth
        .sign_out_everywhere(&identity.access_token)
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    tracing::info!(user_id = %identity.user.id, "User signed out of all sessions");

    Ok((
        state.cookies.clear(jar),
        Json(json!({ "message": "Signed out from all sessions successfully" })),
    ))
}

/// Generates a magic link for the authenticated user.
pub async fn magic_link(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    RequireAuth(identity): RequireAuth,
) -> Result<impl IntoResponse, AuthRejection> {
    let link = state
        .auth
        .generate_magic_link(&identity.access_token)
        .await
        .map_err(|e| AuthRejection::new(e, uri.path()))?;

    Ok(Json(json!({ "hashed_token": link.hashed_token })))
}
