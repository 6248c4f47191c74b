/// Password-reset token utilities
///
/// Reset tokens are single-use opaque strings emailed to the account owner.
/// Only the SHA-256 hash is stored, so a database leak never exposes a
/// usable token. These work in conjunction with the `models::user` module
/// for the database side.
///
/// # Security
///
/// - **Format**: 32 random alphanumeric chars (base62: [A-Za-z0-9])
/// - **Storage**: Tokens are hashed with SHA-256 before storage
/// - **Validation**: Constant-time comparison to prevent timing attacks
/// - **Lifetime**: 10 minutes from issuance
///
/// # Example
///
/// ```
/// use trailbook_shared::auth::reset_token::{generate_reset_token, hash_reset_token};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 32);
/// assert_eq!(hash, hash_reset_token(&token));
/// ```

use chrono::Duration;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a reset token (characters)
pub const RESET_TOKEN_LENGTH: usize = 32;

/// How long a reset token stays valid
pub fn reset_token_lifetime() -> Duration {
    Duration::minutes(10)
}

/// Generates a new password-reset token
///
/// Creates a cryptographically random token along with the SHA-256 hash for
/// database storage. The plaintext goes into the reset email and is never
/// persisted.
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hash)
pub fn generate_reset_token() -> (String, String) {
    let token = generate_random_string(RESET_TOKEN_LENGTH);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Generates a random alphanumeric string
///
/// Uses base62 encoding (A-Z, a-z, 0-9) for URL-safe tokens.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a reset token using SHA-256
///
/// Returns the hex-encoded hash (64 characters). Lookups run against this
/// hash, never the plaintext.
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validates a reset token against a stored hash
///
/// Uses constant-time comparison to prevent timing side-channel attacks.
pub fn verify_reset_token(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_reset_token(token);
    constant_time_compare(&computed_hash, stored_hash)
}

/// Constant-time string comparison
///
/// Always compares the full length and accumulates differences with bitwise
/// OR, so comparison time does not leak where the strings diverge.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut result = 0u8;
    for i in 0..a_bytes.len() {
        result |= a_bytes[i] ^ b_bytes[i];
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token() {
        let (token1, hash1) = generate_reset_token();
        let (token2, hash2) = generate_reset_token();

        assert_eq!(token1.len(), RESET_TOKEN_LENGTH);
        assert!(token1.chars().all(|c| c.is_alphanumeric()));

        // Check randomness
        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);

        // SHA-256 hex is 64 chars
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_reset_token_deterministic() {
        let hash = hash_reset_token("some-token");
        assert_eq!(hash, hash_reset_token("some-token"));
        assert_ne!(hash, hash_reset_token("other-token"));
    }

    #[test]
    fn test_verify_reset_token() {
        let (token, hash) = generate_reset_token();

        assert!(verify_reset_token(&token, &hash));
        assert!(!verify_reset_token("wrong-token-wrong-token-wrong-to", &hash));
        assert!(!verify_reset_token("", &hash));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));

        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello2"));
        assert!(!constant_time_compare("short", "longer string"));
    }

    #[test]
    fn test_lifetime_is_ten_minutes() {
        assert_eq!(reset_token_lifetime(), Duration::minutes(10));
    }
}
