//! Bearer credential newtypes.
//!
//! Tokens are opaque to this crate: nothing here parses, verifies or encodes
//! them. The only rule enforced locally is that a token is never empty, so a
//! blank cookie or header can't turn into a provider round trip.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error returned when constructing a token from an empty or blank string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTokenError {
    /// The kind of token that was rejected.
    pub token_type: &'static str,
}

impl fmt::Display for EmptyTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} must not be empty", self.token_type)
    }
}

impl std::error::Error for EmptyTokenError {}

/// Macro to generate a non-empty, redacted bearer credential wrapper.
macro_rules! define_token {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw token, returning `None` when it is empty or blank.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Option<Self> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    None
                } else {
                    Some(Self(raw))
                }
            }

            /// Returns the raw token for sending to the provider or a cookie.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the raw token.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(<redacted>)"))
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyTokenError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw).ok_or(EmptyTokenError { token_type: $label })
            }
        }

        impl From<$name> for String {
            fn from(token: $name) -> Self {
                token.0
            }
        }
    };
}

define_token!(
    /// Short-lived bearer credential proving current authentication.
    AccessToken,
    "access token"
);

define_token!(
    /// Longer-lived credential used to obtain a new access token.
    RefreshToken,
    "refresh token"
);
