//! Core value types shared by every supagate crate.
//!
//! The identity provider owns all session state. The types here only carry
//! what the provider hands back so it can be relayed between HTTP cookies,
//! headers and response bodies:
//! - Bearer credentials (`AccessToken`, `RefreshToken`) that are never empty
//! - `Session` and `User` as returned by the provider
//! - The `Result` alias used for fallible construction

pub mod error;
pub mod session;
pub mod token;
pub mod user;

pub use error::Result;
pub use session::Session;
pub use token::{AccessToken, EmptyTokenError, RefreshToken};
pub use user::User;
