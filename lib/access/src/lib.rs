//! Authentication operations and request session resolution for supagate.
//!
//! This crate provides:
//! - `AuthService`: sign-in, user lookup, refresh, sign-out and magic links
//! - `SessionResolver`: the refresh-on-expiry decision for inbound requests
//! - `AuthError`: the categories every failure is reported as
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use supagate_access::{AuthService, CandidateTokens, Resolution};
//! use supagate_core::{AccessToken, RefreshToken};
//! use supagate_provider::{GoTrueClient, ProviderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::new(
//!     "https://abcd.supabase.co".to_string(),
//!     "anon-key".to_string(),
//! );
//! let client = GoTrueClient::new(config).map_err(|e| e.to_string())?;
//! let service = AuthService::new(Arc::new(client));
//!
//! let tokens = CandidateTokens::new(AccessToken::new("stale"), RefreshToken::new("r1"));
//! match service.resolver().resolve(&tokens).await {
//!     Resolution::Refreshed { session, .. } => println!("rotated: {:?}", session.expires_at),
//!     Resolution::Authenticated(user) => println!("hello {}", user.id),
//!     Resolution::Unauthenticated(cause) => println!("anonymous: {cause:?}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod resolver;
pub mod service;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::AuthError;
pub use resolver::{CandidateTokens, Resolution, SessionResolver, UnauthenticatedCause};
pub use service::{AuthService, SignIn};
