//! REST client for Supabase Auth (GoTrue).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use supagate_core::{AccessToken, RefreshToken, Session, User};
use tracing::{debug, instrument};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::jwt;
use crate::provider::{IdentityProvider, MagicLink, SignOutScope};

/// Error payload returned by GoTrue.
///
/// Newer releases send `error_code` + `msg`; older ones send the OAuth-style
/// `error` + `error_description`. Both are accepted.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// Which call a failed response belongs to. Classification depends on it:
/// a 400 from the password grant means bad credentials, from the refresh
/// grant it means a dead refresh token.
#[derive(Debug, Clone, Copy)]
enum Call<'a> {
    PasswordGrant,
    RefreshGrant,
    UserToken(&'a str),
    Admin,
}

impl Call<'_> {
    fn classify(self, status: StatusCode, body: &ErrorBody) -> ProviderErrorKind {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return ProviderErrorKind::Unavailable;
        }

        match self {
            Self::PasswordGrant => ProviderErrorKind::InvalidCredentials,
            Self::RefreshGrant => ProviderErrorKind::RefreshTokenInvalid,
            Self::UserToken(token) => {
                if body.error_code.as_deref() == Some("session_expired")
                    || jwt::is_expired(token, chrono::Utc::now().timestamp())
                {
                    ProviderErrorKind::TokenExpired
                } else {
                    ProviderErrorKind::TokenInvalid
                }
            }
            Self::Admin => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderErrorKind::NotConfigured
                }
                _ => ProviderErrorKind::Unexpected,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateLinkResponse {
    #[serde(default)]
    hashed_token: Option<String>,
    #[serde(default)]
    properties: Option<GenerateLinkProperties>,
}

#[derive(Debug, Deserialize)]
struct GenerateLinkProperties {
    #[serde(default)]
    hashed_token: Option<String>,
}

/// GoTrue REST client.
///
/// Holds one pooled `reqwest::Client`; clone the surrounding `Arc` rather
/// than building a client per request.
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl GoTrueClient {
    /// Creates a new client.
    ///
    /// Every request made by the client is bounded by the configured timeout.
    pub fn new(config: ProviderConfig) -> supagate_core::Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                ProviderError::new(
                    ProviderErrorKind::NotConfigured,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self { http, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.auth_url(), path)
    }

    /// Request authenticated with the public key only.
    fn anonymous(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", self.config.api_key())
            .bearer_auth(self.config.api_key())
    }

    /// Request authenticated as the user owning `token`.
    fn as_user(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &AccessToken,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", self.config.api_key())
            .bearer_auth(token.as_str())
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
        request.send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                format!("request timed out: {e}")
            } else {
                format!("request failed: {e}")
            };
            ProviderError::new(ProviderErrorKind::Unavailable, reason)
        })
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        call: Call<'_>,
    ) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(response, call).await);
        }

        response.json::<T>().await.map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::Unexpected,
                format!("failed to decode provider response: {e}"),
            )
            .with_status(status.as_u16())
        })
    }

    async fn failure(response: reqwest::Response, call: Call<'_>) -> ProviderError {
        let status = response.status();
        let body: ErrorBody = response.json().await.unwrap_or_default();
        let kind = call.classify(status, &body);
        let message = body
            .text()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string());

        debug!(
            status = status.as_u16(),
            error_code = body.error_code.as_deref().unwrap_or_default(),
            kind = %kind,
            "identity provider rejected request"
        );

        ProviderError::new(kind, message).with_status(status.as_u16())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let request = self
            .anonymous(reqwest::Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));

        let response = Self::send(request).await?;
        Self::decode(response, Call::PasswordGrant).await
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &AccessToken) -> Result<User, ProviderError> {
        let request = self.as_user(reqwest::Method::GET, "user", access_token);
        let response = Self::send(request).await?;
        Self::decode(response, Call::UserToken(access_token.as_str())).await
    }

    #[instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<Session, ProviderError> {
        let request = self
            .anonymous(reqwest::Method::POST, "token")
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token.as_str() }));

        let response = Self::send(request).await?;
        Self::decode(response, Call::RefreshGrant).await
    }

    #[instrument(skip(self, access_token, scope), fields(scope = %scope))]
    async fn sign_out(
        &self,
        access_token: Option<&AccessToken>,
        scope: SignOutScope,
    ) -> Result<(), ProviderError> {
        // Without a user token there is no server-side session to revoke.
        let Some(token) = access_token else {
            debug!("sign-out without access token; nothing to revoke");
            return Ok(());
        };

        let request = self
            .as_user(reqwest::Method::POST, "logout", token)
            .query(&[("scope", scope.as_str())]);
        let response = Self::send(request).await?;

        let status = response.status();
        // A token that is already gone counts as signed out.
        if status.is_success()
            || matches!(
                status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            )
        {
            return Ok(());
        }

        Err(Self::failure(response, Call::UserToken(token.as_str())).await)
    }

    #[instrument(skip(self, email))]
    async fn generate_magic_link(&self, email: &str) -> Result<MagicLink, ProviderError> {
        let service_key = self.config.service_role_key().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::NotConfigured,
                "service-role key is required to generate magic links",
            )
        })?;

        let request = self
            .http
            .post(self.endpoint("admin/generate_link"))
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .json(&serde_json::json!({ "type": "magiclink", "email": email }));

        let response = Self::send(request).await?;
        let link: GenerateLinkResponse = Self::decode(response, Call::Admin).await?;

        link.hashed_token
            .or_else(|| link.properties.and_then(|p| p.hashed_token))
            .map(|hashed_token| MagicLink { hashed_token })
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::Unexpected,
                    "generated link did not include a hashed token",
                )
            })
    }
}
