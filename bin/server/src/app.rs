//! Router assembly.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState, routes};

/// Builds the application router.
///
/// Layers run outermost first: tracing, then the refresh middleware, then
/// the guard.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/signin", post(routes::sign_in))
        .route("/auth/token/refresh", post(routes::refresh_token))
        .route("/auth/user", get(routes::current_user))
        .route("/auth/signout", post(routes::sign_out))
        .route("/auth/signout/all", post(routes::sign_out_all))
        .route("/auth/magic-link", post(routes::magic_link))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_auth))
        .layer(middleware::from_fn_with_state(state.clone(), auth::refresh_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CookiePolicy;
    use crate::config::Environment;
    use supagate_access::testing::{MockProvider, session};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use supagate_core::User;
    use supagate_provider::SignOutScope;
    use tower::ServiceExt;

    fn alice() -> User {
        User::new("usr-1").with_email("alice@example.com")
    }

    fn app_with(provider: Arc<MockProvider>, environment: Environment) -> Router {
        router(Arc::new(AppState::new(
            provider,
            CookiePolicy::new(environment),
        )))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let provider = Arc::new(MockProvider::new());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn sign_in_sets_cookies_and_returns_tokens() {
        let provider =
            Arc::new(MockProvider::new().with_account(
                "alice@example.com",
                "secret",
                session("a1", "r1", Some(alice())),
            ));
        let req = post_json(
            "/auth/signin",
            serde_json::json!({"email": "alice@example.com", "password": "secret"}),
        );

        let resp = app_with(provider, Environment::Production)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let cookies = set_cookies(&resp);
        let access = cookies
            .iter()
            .find(|c| c.starts_with("access_token=a1"))
            .expect("access cookie");
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("Max-Age=3600"));
        let refresh = cookies
            .iter()
            .find(|c| c.starts_with("refresh_token=r1"))
            .expect("refresh cookie");
        assert!(refresh.contains("HttpOnly"));
        assert!(refresh.contains("Secure"));
        assert!(refresh.contains("SameSite=Strict"));

        let body = json_body(resp).await;
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["id"], "usr-1");
        assert_eq!(body["tokens"]["access_token"], "a1");
        assert_eq!(body["tokens"]["refresh_token"], "r1");
        assert!(body["tokens"]["expires_in_ms"].is_i64());
    }

    #[tokio::test]
    async fn sign_in_with_bad_email_never_reaches_provider() {
        let provider = Arc::new(MockProvider::new());
        let req = post_json(
            "/auth/signin",
            serde_json::json!({"email": "not-an-email", "password": "secret"}),
        );

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "InvalidCredentials");
        assert_eq!(body["message"], "Invalid email format");
        assert_eq!(body["path"], "/auth/signin");
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_is_unauthorized() {
        let provider =
            Arc::new(MockProvider::new().with_account(
                "alice@example.com",
                "secret",
                session("a1", "r1", Some(alice())),
            ));
        let req = post_json(
            "/auth/signin",
            serde_json::json!({"email": "alice@example.com", "password": "guess"}),
        );

        let resp = app_with(provider, Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&resp).is_empty());
        assert_eq!(json_body(resp).await["error"], "InvalidCredentials");
    }

    #[tokio::test]
    async fn refresh_endpoint_uses_body_token() {
        let provider = Arc::new(MockProvider::new().with_refresh("r1", session("a2", "r2", None)));
        let req = post_json(
            "/auth/token/refresh",
            serde_json::json!({"refresh_token": "r1"}),
        );

        let resp = app_with(provider.clone(), Environment::Production)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        let refresh = cookies
            .iter()
            .find(|c| c.starts_with("refresh_token=r2"))
            .expect("refresh cookie");
        assert!(refresh.contains("HttpOnly"));
        assert!(refresh.contains("Secure"));

        let body = json_body(resp).await;
        assert_eq!(body["message"], "Token refreshed successfully");
        assert_eq!(body["tokens"]["access_token"], "a2");
        assert_eq!(provider.calls().refresh, 1);
    }

    #[tokio::test]
    async fn refresh_endpoint_falls_back_to_cookie() {
        let provider = Arc::new(MockProvider::new().with_refresh("r1", session("a2", "r2", None)));
        let req = Request::builder()
            .method("POST")
            .uri("/auth/token/refresh")
            .header("cookie", "refresh_token=r1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider, Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["tokens"]["refresh_token"], "r2");
    }

    #[tokio::test]
    async fn refresh_endpoint_without_token_is_refresh_failed() {
        let provider = Arc::new(MockProvider::new());
        let req = Request::builder()
            .method("POST")
            .uri("/auth/token/refresh")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "RefreshFailed");
        assert_eq!(body["message"], "No refresh token provided");
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn strip_refresh_token_keeps_it_out_of_body() {
        let provider = Arc::new(MockProvider::new().with_refresh("r1", session("a2", "r2", None)));
        let state = AppState::new(provider, CookiePolicy::new(Environment::Development))
            .with_strip_refresh_token(true);
        let req = post_json(
            "/auth/token/refresh",
            serde_json::json!({"refresh_token": "r1"}),
        );

        let resp = router(Arc::new(state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            set_cookies(&resp)
                .iter()
                .any(|c| c.starts_with("refresh_token=r2"))
        );
        let body = json_body(resp).await;
        assert!(body["tokens"].get("refresh_token").is_none());
    }

    #[tokio::test]
    async fn current_user_requires_token() {
        let provider = Arc::new(MockProvider::new());
        let req = Request::builder()
            .uri("/auth/user")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider, Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(resp).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "MissingToken");
    }

    #[tokio::test]
    async fn current_user_with_bearer_token() {
        let provider = Arc::new(MockProvider::new().with_user("a1", alice()));
        let req = Request::builder()
            .uri("/auth/user")
            .header("authorization", "Bearer a1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider, Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["user"]["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn sign_out_is_local_and_clears_cookies() {
        let provider = Arc::new(MockProvider::new().with_user("a1", alice()));
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout")
            .header("cookie", "access_token=a1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(
            provider.calls().sign_out,
            vec![(Some("a1".to_string()), SignOutScope::Local)]
        );
    }

    #[tokio::test]
    async fn sign_out_all_is_global() {
        let provider = Arc::new(MockProvider::new().with_user("a1", alice()));
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout/all")
            .header("authorization", "Bearer a1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await["message"],
            "Signed out from all sessions successfully"
        );
        assert_eq!(
            provider.calls().sign_out,
            vec![(Some("a1".to_string()), SignOutScope::Global)]
        );
    }

    #[tokio::test]
    async fn magic_link_for_authenticated_user() {
        let provider = Arc::new(
            MockProvider::new()
                .with_user("a1", alice())
                .with_magic_link("hashed-1"),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/auth/magic-link")
            .header("authorization", "Bearer a1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["hashed_token"], "hashed-1");
        assert_eq!(
            provider.calls().magic_link,
            vec!["alice@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn expired_cookie_session_is_refreshed_before_handler() {
        let provider = Arc::new(
            MockProvider::new()
                .with_expired("stale")
                .with_refresh("r1", session("a2", "r2", None))
                .with_user("a2", alice()),
        );
        let req = Request::builder()
            .uri("/auth/user")
            .header("cookie", "access_token=stale; refresh_token=r1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Production)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=a2")));
        let refresh = cookies
            .iter()
            .find(|c| c.starts_with("refresh_token=r2"))
            .expect("refresh cookie");
        assert!(refresh.contains("HttpOnly") && refresh.contains("Secure"));
        assert_eq!(json_body(resp).await["user"]["id"], "usr-1");

        let calls = provider.calls();
        assert_eq!(calls.refresh, 1);
        assert_eq!(calls.get_user, 2);
    }

    #[tokio::test]
    async fn sign_out_with_stale_session_leaves_cookies_cleared() {
        let provider = Arc::new(
            MockProvider::new()
                .with_expired("stale")
                .with_refresh("r1", session("a2", "r2", None))
                .with_user("a2", alice()),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout")
            .header("cookie", "access_token=stale; refresh_token=r1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        let last_refresh = cookies
            .iter()
            .rev()
            .find(|c| c.starts_with("refresh_token="))
            .expect("refresh cookie");
        assert!(last_refresh.contains("Max-Age=0"));

        let calls = provider.calls();
        assert_eq!(calls.refresh, 1);
        assert_eq!(
            calls.sign_out,
            vec![(Some("a2".to_string()), SignOutScope::Local)]
        );
    }

    #[tokio::test]
    async fn sign_out_with_dead_token_still_clears_cookies() {
        let provider = Arc::new(MockProvider::new());
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout")
            .header("cookie", "access_token=revoked")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn sign_out_without_token_is_global() {
        let provider = Arc::new(MockProvider::new());
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(set_cookies(&resp).iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(json_body(resp).await["message"], "Signed out successfully");
        assert_eq!(provider.calls().sign_out, vec![(None, SignOutScope::Global)]);
    }

    #[tokio::test]
    async fn sign_out_all_with_stale_session_clears_rotated_cookies() {
        let provider = Arc::new(
            MockProvider::new()
                .with_expired("stale")
                .with_refresh("r1", session("a2", "r2", None))
                .with_user("a2", alice()),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/auth/signout/all")
            .header("cookie", "access_token=stale; refresh_token=r1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(
            provider.calls().sign_out,
            vec![(Some("a2".to_string()), SignOutScope::Global)]
        );
    }

    #[tokio::test]
    async fn refresh_endpoint_with_stale_cookies_refreshes_once() {
        let provider = Arc::new(
            MockProvider::new()
                .with_expired("stale")
                .with_refresh("r1", session("a2", "r2", None))
                .with_user("a2", alice()),
        );
        let req = Request::builder()
            .method("POST")
            .uri("/auth/token/refresh")
            .header("cookie", "access_token=stale; refresh_token=r1")
            .body(Body::empty())
            .unwrap();

        let resp = app_with(provider.clone(), Environment::Development)
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookies = set_cookies(&resp);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=a2")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=r2")));
        assert_eq!(json_body(resp).await["tokens"]["access_token"], "a2");

        let calls = provider.calls();
        assert_eq!(calls.refresh, 1);
        assert_eq!(calls.get_user, 0);
    }
}
