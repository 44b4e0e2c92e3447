//! Unverified peek at a JWT's expiry claim.
//!
//! The signature is NOT checked here; the provider does that. Reading `exp`
//! only lets the client tell an expired token apart from a bad one when the
//! provider reports both with the same error code.

use base64::Engine;

/// Returns the `exp` claim (unix seconds) of a JWT, if it can be read.
#[must_use]
pub fn expires_at(token: &str) -> Option<i64> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&payload).ok()?;

    claims.get("exp").and_then(serde_json::Value::as_i64)
}

/// Whether the token's `exp` claim is at or before `now_secs`.
///
/// Unreadable tokens are reported as not expired.
#[must_use]
pub fn is_expired(token: &str, now_secs: i64) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now_secs)
}

#[cfg(test)]
pub(crate) fn unsigned_token(exp: i64) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = engine.encode(format!(r#"{{"sub":"usr-1","exp":{exp}}}"#));
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_exp_claim() {
        let token = unsigned_token(1_700_000_000);
        assert_eq!(expires_at(&token), Some(1_700_000_000));
    }

    #[test]
    fn expired_when_exp_in_past() {
        let token = unsigned_token(1_000);
        assert!(is_expired(&token, 2_000));
        assert!(!is_expired(&token, 500));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        assert_eq!(expires_at("not-a-jwt"), None);
        assert!(!is_expired("not-a-jwt", i64::MAX));
    }

    #[test]
    fn garbage_payload_is_ignored() {
        assert_eq!(expires_at("a.!!!.c"), None);
    }
}
