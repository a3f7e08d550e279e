// Session token codec: stateless HMAC-SHA256 tokens.
//
// Token format: {timestamp_ms}:{nonce_hex}:{hmac_hex}
//
// The HMAC covers "{timestamp_ms}:{nonce_hex}" and is keyed by a secret
// derived from HOMEPAGE_PASSWORD, so changing the password invalidates
// every token issued under the old one. Tokens are valid for
// TOKEN_TTL_MS (7 days); there is no server-side session table.

use std::fmt;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::auth::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime: 7 days, in milliseconds.
pub const TOKEN_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// How far into the future an issue timestamp may sit before the token is
/// rejected. Covers small clock steps on the host.
pub const MAX_CLOCK_SKEW_MS: i64 = 60 * 1000;

const NONCE_BYTES: usize = 16;

/// HMAC key derived from the configured password.
///
/// The key is the lowercase hex SHA-256 of `"{password}-secret-key"`.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(String);

impl SigningSecret {
    pub fn derive(password: &str) -> Self {
        let digest = Sha256::digest(format!("{password}-secret-key").as_bytes());
        Self(hex::encode(digest))
    }

    fn key(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Mint a fresh session token signed with `secret`.
pub fn mint(secret: &SigningSecret) -> Result<String, AuthError> {
    mint_at(secret, now_ms())
}

/// Mint a token stamped with `now_ms` instead of the wall clock.
pub fn mint_at(secret: &SigningSecret, now_ms: i64) -> Result<String, AuthError> {
    let mut nonce_bytes = [0u8; NONCE_BYTES];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    let nonce = hex::encode(nonce_bytes);

    let payload = format!("{now_ms}:{nonce}");
    let sig = sign(secret, &payload).ok_or_else(|| {
        AuthError::Signing("HMAC rejected the derived key".to_string())
    })?;

    Ok(format!("{payload}:{sig}"))
}

/// Verify a session token against the wall clock.
pub fn verify(secret: &SigningSecret, token: &str) -> bool {
    verify_at(secret, token, now_ms())
}

/// Verify a session token as of `now_ms`.
///
/// Returns `false` for anything malformed, expired, issued too far in the
/// future, or carrying a signature that doesn't match. Never panics.
pub fn verify_at(secret: &SigningSecret, token: &str, now_ms: i64) -> bool {
    let parts: Vec<&str> = token.split(':').collect();
    let [timestamp_str, nonce, provided_sig] = parts[..] else {
        return false;
    };

    let Ok(timestamp) = timestamp_str.parse::<i64>() else {
        return false;
    };
    let Some(age) = now_ms.checked_sub(timestamp) else {
        return false;
    };
    if age > TOKEN_TTL_MS || age < -MAX_CLOCK_SKEW_MS {
        return false;
    }

    let payload = format!("{timestamp_str}:{nonce}");
    let Some(expected_sig) = sign(secret, &payload) else {
        return false;
    };
    provided_sig.as_bytes().ct_eq(expected_sig.as_bytes()).into()
}

/// Issue timestamp of a token, without checking its signature.
///
/// Only meaningful for a token that already passed `verify`.
pub fn issued_at(token: &str) -> Option<i64> {
    token.split(':').next()?.parse().ok()
}

fn sign(secret: &SigningSecret, payload: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.key()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}
