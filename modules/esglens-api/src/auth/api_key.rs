use rand::RngCore;
use sha2::{Digest, Sha256};

pub const KEY_PREFIX_LEN: usize = 8;

/// Mint a new API key. Returns `(full_key, key_hash, key_prefix)`; only the
/// hash and the prefix are ever persisted, the full key is shown once.
pub fn generate_api_key() -> (String, String, String) {
    let mut raw = [0u8; 32];
    rand::rng().fill_bytes(&mut raw);
    let full_key = hex::encode(raw);
    let key_hash = hash_key(&full_key);
    let key_prefix = full_key[..KEY_PREFIX_LEN].to_string();
    (full_key, key_hash, key_prefix)
}

/// SHA-256 hex digest of a presented key.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_shape() {
        let (full_key, key_hash, key_prefix) = generate_api_key();
        assert_eq!(full_key.len(), 64);
        assert_eq!(key_hash.len(), 64);
        assert_eq!(key_prefix.len(), KEY_PREFIX_LEN);
        assert!(full_key.starts_with(&key_prefix));
    }

    #[test]
    fn hash_is_never_the_key() {
        let (full_key, key_hash, _) = generate_api_key();
        assert_ne!(full_key, key_hash);
        assert_eq!(hash_key(&full_key), key_hash);
    }

    #[test]
    fn keys_are_unique() {
        let (a, _, _) = generate_api_key();
        let (b, _, _) = generate_api_key();
        assert_ne!(a, b);
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"same", b"same"));
        assert!(!constant_time_eq(b"same", b"sane"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
