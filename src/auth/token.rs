use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of an issued plaintext token, in characters.
pub const TOKEN_LENGTH: usize = 32;

/// Generate a fresh plaintext service token.
///
/// The caller must hand the value to the administrator immediately; only
/// `hash_token(..)` of it is ever persisted.
pub fn generate_token() -> String {
    rand::rngs::OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hex-encoded SHA-256 of a plaintext token. This is the stored form and
/// the only form ever compared against.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_32_alphanumeric_chars() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_not_repeated() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_is_deterministic_hex_sha256() {
        let h1 = hash_token("abc123");
        let h2 = hash_token("abc123");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h1, hash_token("abc124"));
    }
}
