//! Unverified JWT claim decoding
//!
//! Used only to show who is signed in. The signature is NOT checked; never
//! base an authorization decision on these claims.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

/// Decode the payload segment of a three-part JWT.
///
/// Returns `None` for anything that is not `header.payload.signature` with
/// a base64 JSON payload.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).or_else(|_| STANDARD_NO_PAD.decode(payload)).ok()?;
    serde_json::from_slice::<Value>(&bytes).ok().filter(Value::is_object)
}

/// Login name carried by the token: `preferred_username`, `username`, the
/// local part of `email`, then `sub`.
#[must_use]
pub fn username_from_claims(claims: &Value) -> Option<String> {
    let field = |key: &str| {
        claims.get(key).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    field("preferred_username")
        .or_else(|| field("username"))
        .or_else(|| field("email").and_then(|e| e.split('@').next().map(str::to_string)))
        .filter(|s| !s.is_empty())
        .or_else(|| field("sub"))
}
