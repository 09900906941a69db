/// Opaque refresh tokens.
///
/// A refresh token is a 64-character random string, not a signed
/// structure. Only its SHA-256 hash is persisted; the plaintext exists in
/// the client's hands and nowhere else. Rotation (handled in the store)
/// makes each value single-use.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// Generate a fresh refresh token (~380 bits of entropy).
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh token for storage and lookup.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_expected_shape() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generation_is_not_deterministic() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[test]
    fn hashing_is_stable_and_one_way() {
        let token = generate_refresh_token();
        let hash = hash_refresh_token(&token);

        assert_eq!(hash, hash_refresh_token(&token));
        assert_ne!(hash, token);
        assert_eq!(hash.len(), 64); // SHA-256 hex
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(
            hash_refresh_token(&generate_refresh_token()),
            hash_refresh_token(&generate_refresh_token())
        );
    }
}
