//! Authenticator (C5): API-key + HMAC signature verification, and admin
//! bearer-token verification. Both comparisons are constant-time.

pub mod extractors;
pub mod raw_body;

use crate::database::TenantRecord;
use crate::errors::AuthError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub use extractors::{AdminAuth, ApiAuth};
pub use raw_body::RawBody;

type HmacSha256 = Hmac<Sha256>;

/// `SHA-256(project_key)` in lowercase hex — never store the plaintext key.
pub fn hash_api_key(plaintext_key: &str) -> String {
    let digest = Sha256::digest(plaintext_key.as_bytes());
    hex::encode(digest)
}

/// `HMAC-SHA-256(raw_body, hmac_secret)` in lowercase hex.
pub fn compute_signature(raw_body: &[u8], hmac_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(hmac_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time comparison of two hex-encoded signatures (or any two
/// secrets). Mismatched lengths short-circuit to `false` without leaking
/// timing information proportional to the correct prefix.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

pub fn verify_signature(raw_body: &[u8], hmac_secret: &str, provided_signature: &str) -> bool {
    let expected = compute_signature(raw_body, hmac_secret);
    constant_time_eq(&expected, provided_signature)
}

pub fn verify_admin_token(provided: &str, configured: &str) -> bool {
    constant_time_eq(provided, configured)
}

/// Resolves a tenant from its plaintext API key via the registry, wrapping
/// the "not found" vs "lookup failed" distinction from §4.2.
pub async fn resolve_tenant(
    store: &crate::database::Store,
    plaintext_key: &str,
) -> Result<TenantRecord, AuthError> {
    let hash = hash_api_key(plaintext_key);

    let lookup = tokio::time::timeout(
        crate::constants::timeouts::TENANT_LOOKUP,
        store.find_tenant_by_key_hash(&hash),
    )
    .await;

    match lookup {
        Ok(Ok(Some(tenant))) => Ok(tenant),
        Ok(Ok(None)) => Err(AuthError::ProjectNotFound),
        Ok(Err(e)) => {
            tracing::error!("tenant lookup failed: {e}");
            Err(AuthError::DatabaseError)
        }
        Err(_) => {
            tracing::error!("tenant lookup timed out");
            Err(AuthError::DatabaseError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_round_trips_for_matching_body_and_secret() {
        let secret = "a".repeat(32);
        let body = b"{\"events\":[]}";
        let signature = compute_signature(body, &secret);
        assert!(verify_signature(body, &secret, &signature));
    }

    #[test]
    fn hmac_rejects_any_modified_body() {
        let secret = "a".repeat(32);
        let body = b"{\"events\":[]}";
        let signature = compute_signature(body, &secret);
        let tampered = b"{\"events\":[] }";
        assert!(!verify_signature(tampered, &secret, &signature));
    }

    #[test]
    fn hash_api_key_is_deterministic_and_is_not_the_plaintext() {
        let key = "super-secret-project-key";
        let hash = hash_api_key(key);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, key);
        assert_eq!(hash, hash_api_key(key));
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch_and_content_mismatch() {
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(constant_time_eq("abc", "abc"));
    }
}
