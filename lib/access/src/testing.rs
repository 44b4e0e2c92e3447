//! In-memory identity provider for tests.
//!
//! Built for this crate's own tests and, with the `test-util` feature, for
//! downstream crates that exercise `AuthService` without a network.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use supagate_core::{AccessToken, RefreshToken, Session, User};
use supagate_provider::{
    IdentityProvider, MagicLink, ProviderError, ProviderErrorKind, SignOutScope,
};

#[derive(Debug, Default)]
pub struct Calls {
    pub sign_in: usize,
    pub get_user: usize,
    pub refresh: usize,
    pub sign_out: Vec<(Option<String>, SignOutScope)>,
    pub magic_link: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MockProvider {
    accounts: HashMap<(String, String), Session>,
    users: HashMap<String, User>,
    expired: HashSet<String>,
    refreshes: HashMap<String, Session>,
    magic_link: Option<String>,
    unavailable: bool,
    calls: Mutex<Calls>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account. Signing in with `email`/`password` issues
    /// `session`.
    pub fn with_account(mut self, email: &str, password: &str, session: Session) -> Self {
        self.accounts
            .insert((email.to_string(), password.to_string()), session);
        self
    }

    pub fn with_user(mut self, access_token: &str, user: User) -> Self {
        self.users.insert(access_token.to_string(), user);
        self
    }

    pub fn with_expired(mut self, access_token: &str) -> Self {
        self.expired.insert(access_token.to_string());
        self
    }

    pub fn with_refresh(mut self, refresh_token: &str, session: Session) -> Self {
        self.refreshes.insert(refresh_token.to_string(), session);
        self
    }

    pub fn with_magic_link(mut self, hashed_token: &str) -> Self {
        self.magic_link = Some(hashed_token.to_string());
        self
    }

    /// Makes every user lookup fail as if the provider were unreachable.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().expect("calls lock")
    }

    pub fn total_calls(&self) -> usize {
        let calls = self.calls();
        calls.sign_in
            + calls.get_user
            + calls.refresh
            + calls.sign_out.len()
            + calls.magic_link.len()
    }
}

/// A one-hour session expiring at a fixed instant.
pub fn session(access: &str, refresh: &str, user: Option<User>) -> Session {
    Session {
        access_token: AccessToken::new(access).expect("access"),
        refresh_token: RefreshToken::new(refresh).expect("refresh"),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: Some(1_900_000_000),
        user,
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        self.calls().sign_in += 1;
        self.accounts
            .get(&(email.to_string(), password.to_string()))
            .cloned()
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::InvalidCredentials,
                    "Invalid login credentials",
                )
                .with_status(400)
            })
    }

    async fn get_user(&self, access_token: &AccessToken) -> Result<User, ProviderError> {
        self.calls().get_user += 1;
        if self.unavailable {
            return Err(ProviderError::new(
                ProviderErrorKind::Unavailable,
                "connection refused",
            ));
        }
        if let Some(user) = self.users.get(access_token.as_str()) {
            return Ok(user.clone());
        }
        let kind = if self.expired.contains(access_token.as_str()) {
            ProviderErrorKind::TokenExpired
        } else {
            ProviderErrorKind::TokenInvalid
        };
        Err(ProviderError::new(kind, "invalid JWT").with_status(403))
    }

    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<Session, ProviderError> {
        self.calls().refresh += 1;
        self.refreshes
            .get(refresh_token.as_str())
            .cloned()
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorKind::RefreshTokenInvalid,
                    "Invalid Refresh Token: Refresh Token Not Found",
                )
                .with_status(400)
            })
    }

    async fn sign_out(
        &self,
        access_token: Option<&AccessToken>,
        scope: SignOutScope,
    ) -> Result<(), ProviderError> {
        self.calls()
            .sign_out
            .push((access_token.map(|t| t.as_str().to_string()), scope));
        Ok(())
    }

    async fn generate_magic_link(&self, email: &str) -> Result<MagicLink, ProviderError> {
        self.calls().magic_link.push(email.to_string());
        self.magic_link
            .clone()
            .map(|hashed_token| MagicLink { hashed_token })
            .ok_or_else(|| {
                ProviderError::new(ProviderErrorKind::NotConfigured, "no service-role key")
            })
    }
}
