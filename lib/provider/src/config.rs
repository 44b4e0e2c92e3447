//! Identity provider connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the hosted identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Project URL (e.g., "https://abcd.supabase.co"). The auth API lives
    /// under `/auth/v1` of this URL.
    url: String,
    /// Public (anon) API key sent with every request.
    api_key: String,
    /// Service-role key for admin calls such as magic-link generation.
    #[serde(default)]
    service_role_key: Option<String>,
    /// Per-request timeout in seconds.
    /// Default: 10
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl ProviderConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            url,
            api_key,
            service_role_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Sets the service-role key used for admin operations.
    #[must_use]
    pub fn with_service_role_key(mut self, key: String) -> Self {
        self.service_role_key = Some(key);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Returns the project URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the public API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the service-role key, if one is configured and non-empty.
    #[must_use]
    pub fn service_role_key(&self) -> Option<&str> {
        self.service_role_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the base URL of the auth API (`<url>/auth/v1`).
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_omitted() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{"url": "https://abcd.supabase.co", "api_key": "anon"}"#,
        )
        .expect("deserialize");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.service_role_key().is_none());
    }

    #[test]
    fn auth_url_trims_trailing_slash() {
        let config = ProviderConfig::new("https://abcd.supabase.co/".to_string(), "k".to_string());
        assert_eq!(config.auth_url(), "https://abcd.supabase.co/auth/v1");
    }

    #[test]
    fn blank_service_role_key_counts_as_missing() {
        let config = ProviderConfig::new("https://x".to_string(), "k".to_string())
            .with_service_role_key("  ".to_string());
        assert!(config.service_role_key().is_none());
    }
}
