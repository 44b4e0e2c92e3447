//! JSON error responses for authentication failures.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use supagate_access::AuthError;

/// Rejection returned by the guard, extractors and auth routes.
///
/// Every category answers `401` with a body like:
///
/// ```json
/// {
///   "statusCode": 401,
///   "message": "Token has expired",
///   "error": "TokenExpired",
///   "timestamp": "2026-01-01T00:00:00.000Z",
///   "path": "/auth/user",
///   "shouldRefresh": true
/// }
/// ```
#[derive(Debug)]
pub struct AuthRejection {
    error: AuthError,
    path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionBody<'a> {
    status_code: u16,
    message: String,
    error: &'a str,
    timestamp: String,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    should_refresh: Option<bool>,
}

impl AuthRejection {
    /// Creates a rejection for a request to `path`.
    #[must_use]
    pub fn new(error: AuthError, path: impl Into<String>) -> Self {
        Self {
            error,
            path: path.into(),
        }
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn error(&self) -> &AuthError {
        &self.error
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self.error.provider_error() {
            Some(source) => tracing::debug!(
                path = %self.path,
                error = %self.error,
                source = %source,
                "Rejecting request"
            ),
            None => tracing::debug!(path = %self.path, error = %self.error, "Rejecting request"),
        }

        let status = StatusCode::UNAUTHORIZED;
        let body = RejectionBody {
            status_code: status.as_u16(),
            message: self.error.to_string(),
            error: self.error.name(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            path: &self.path,
            should_refresh: self.error.should_refresh().then_some(true),
        };

        (status, Json(body)).into_response()
    }
}
