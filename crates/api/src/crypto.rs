//! Cryptographic helpers for authentication.
//!
//! - PBKDF2-SHA256 password hashing (600k iterations)
//! - HMAC-SHA256 JWT signing/verification for `GET /api/me`
//! - random reset tokens, stored only as SHA-256 digests

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};

use crate::ServiceError;

const PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

/// Access token lifetime: 1 hour in seconds.
pub const JWT_EXPIRY_SECS: u64 = 3600;

/// Password reset token lifetime: 1 hour in seconds.
pub const RESET_TOKEN_EXPIRY_SECS: u64 = 3600;

const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

// ── Password hashing ────────────────────────────────────────────────────────

/// Hash a password with a fresh salt. Returns `(hash_hex, salt_hex)`.
pub fn hash_password(password: &str) -> Result<(String, String), ServiceError> {
    let salt = random_bytes::<SALT_LEN>()?;
    Ok((hex::encode(derive(password, &salt)), hex::encode(salt)))
}

/// Check a password against a stored hash and salt (both hex-encoded).
pub fn verify_password(password: &str, hash_hex: &str, salt_hex: &str) -> bool {
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(hash_hex)) else {
        return false;
    };
    ct_eq(&derive(password, &salt), &expected)
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

// ── JWT (HMAC-SHA256) ───────────────────────────────────────────────────────

/// Sign an access token whose `sub` is the user id.
pub fn sign_jwt(user_id: &str, secret: &str, now_unix: u64) -> String {
    let payload = serde_json::json!({
        "sub": user_id,
        "iat": now_unix,
        "exp": now_unix + JWT_EXPIRY_SECS,
    });
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(JWT_HEADER),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
    );
    let sig = URL_SAFE_NO_PAD.encode(hmac_sha256(secret.as_bytes(), signing_input.as_bytes()));
    format!("{signing_input}.{sig}")
}

/// Verify an access token and return its `sub`.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<String, ServiceError> {
    let unauthorized = |m: &str| ServiceError::Unauthorized(m.to_string());

    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(unauthorized("invalid token format"));
    };

    let expected = hmac_sha256(secret.as_bytes(), format!("{header}.{payload}").as_bytes());
    let actual = URL_SAFE_NO_PAD
        .decode(sig)
        .map_err(|_| unauthorized("invalid token signature"))?;
    if !ct_eq(&expected, &actual) {
        return Err(unauthorized("invalid token signature"));
    }

    let claims: serde_json::Value = URL_SAFE_NO_PAD
        .decode(payload)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(|| unauthorized("invalid token payload"))?;

    let exp = claims["exp"]
        .as_u64()
        .ok_or_else(|| unauthorized("missing exp claim"))?;
    if now_unix > exp {
        return Err(unauthorized("token expired"));
    }

    claims["sub"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unauthorized("missing sub claim"))
}

// ── Opaque tokens ───────────────────────────────────────────────────────────

/// Generate a random hex token (for password reset links).
pub fn generate_token() -> Result<String, ServiceError> {
    Ok(hex::encode(random_bytes::<TOKEN_LEN>()?))
}

/// SHA-256 a token for storage and lookup. Returns hex.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

// ── Internal ────────────────────────────────────────────────────────────────

fn random_bytes<const N: usize>() -> Result<[u8; N], ServiceError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf)
        .map_err(|e| ServiceError::Internal(format!("RNG failure: {e}")))?;
    Ok(buf)
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison.
fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let (hash, salt) = hash_password("password1").unwrap();
        assert!(verify_password("password1", &hash, &salt));
        assert!(!verify_password("password2", &hash, &salt));
        assert!(!verify_password("password1", "zz", &salt));
    }

    #[test]
    fn jwt_round_trip_and_expiry() {
        let token = sign_jwt("user-1", "secret", 1_000);
        assert_eq!(verify_jwt(&token, "secret", 1_000).unwrap(), "user-1");
        assert!(verify_jwt(&token, "other", 1_000).is_err());
        assert!(verify_jwt(&token, "secret", 1_000 + JWT_EXPIRY_SECS + 1).is_err());
        assert!(verify_jwt("a.b", "secret", 1_000).is_err());
    }

    #[test]
    fn tokens_are_random_and_hash_stably() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_LEN * 2);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_ne!(hash_token(&a), a);
    }
}
