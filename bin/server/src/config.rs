//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`ProviderConfig`](supagate_provider::ProviderConfig) for the identity
//! provider settings (`SUPABASE__URL`, `SUPABASE__API_KEY`, ...).

use serde::Deserialize;
use supagate_provider::ProviderConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Deployment environment. Production tightens cookie flags.
    #[serde(default)]
    pub environment: Environment,

    /// Identity provider configuration.
    pub supabase: ProviderConfig,

    /// Cookie and session body configuration.
    #[serde(default)]
    pub cookies: CookieConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Returns true in production.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Cookie-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    /// Lifetime of the refresh token cookie in days, between 7 and 30.
    #[serde(default = "default_refresh_max_age_days")]
    pub refresh_max_age_days: i64,

    /// Path the refresh token cookie is scoped to.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Deliver the refresh token only as a cookie, never in response bodies.
    #[serde(default)]
    pub strip_refresh_token: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_refresh_max_age_days() -> i64 {
    7
}

fn default_refresh_path() -> String {
    "/".to_string()
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            refresh_max_age_days: default_refresh_max_age_days(),
            refresh_path: default_refresh_path(),
            strip_refresh_token: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
