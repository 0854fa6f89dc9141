//! SHA-256/HMAC primitives used for session salts, date-shift offsets, and
//! the optional provenance-hook fingerprint hash.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

fn sha256_digest(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256_digest(bytes))
}

pub fn sha256_hex_string(text: &str) -> String {
    hex::encode(sha256_digest(text.as_bytes()))
}

/// HMAC-SHA256 over `message` keyed by `key`, returned as lowercase hex. Both
/// inputs are zeroized once the MAC is finalized.
pub fn hmac_sha256_hex(key: &str, message: &str) -> Result<String, String> {
    let mut key_bytes = key.as_bytes().to_vec();
    let mut message_bytes = message.as_bytes().to_vec();

    let mut mac = HmacSha256::new_from_slice(&key_bytes).map_err(|e| e.to_string())?;
    mac.update(&message_bytes);
    let result = hex::encode(mac.finalize().into_bytes());

    key_bytes.zeroize();
    message_bytes.zeroize();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_string_is_deterministic() {
        assert_eq!(sha256_hex_string("hello"), sha256_hex_string("hello"));
        assert_ne!(sha256_hex_string("hello"), sha256_hex_string("world"));
    }

    #[test]
    fn hmac_is_keyed() {
        let a = hmac_sha256_hex("key-a", "message").unwrap();
        let b = hmac_sha256_hex("key-b", "message").unwrap();
        assert_ne!(a, b);
    }
}
