//! Identity provider client for supagate.
//!
//! This crate is the only place that talks to the hosted identity provider.
//! It provides:
//! - The `IdentityProvider` trait that the rest of the workspace depends on
//! - `GoTrueClient`, a REST implementation for Supabase Auth
//! - `ProviderError` with a structured `ProviderErrorKind`, so callers branch
//!   on "expired" versus "invalid" without reading human-readable messages
//!
//! # Example
//!
//! ```no_run
//! use supagate_provider::{GoTrueClient, IdentityProvider, ProviderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::new(
//!     "https://project.supabase.co".to_string(),
//!     "anon-key".to_string(),
//! );
//! let client = GoTrueClient::new(config).map_err(|e| e.to_string())?;
//! let session = client
//!     .sign_in_with_password("alice@example.com", "hunter2")
//!     .await?;
//! println!("expires in {}s", session.expires_in);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod gotrue;
pub mod jwt;
pub mod provider;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderErrorKind};
pub use gotrue::GoTrueClient;
pub use provider::{IdentityProvider, MagicLink, SignOutScope};
