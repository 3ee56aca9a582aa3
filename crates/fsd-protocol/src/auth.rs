//! Authentication primitives (component B).
//!
//! `generate_auth_response` and `generate_auth_challenge` are supplied by a
//! vendor key exchange external to this crate; this module treats them as
//! opaque 32-hex-digit functions and never interprets their output beyond
//! composing and comparing strings. The implementation below is a
//! placeholder keyed the same way the vendor routine is: a challenge, the
//! numeric client id, and a private key all feed an MD5 digest. Replace
//! with the real vendor routine at link time if its exact bit-for-bit
//! behavior matters (e.g. against a production FSD server).

use md5::{Digest, Md5};

/// `md5(bytes) -> 32-hex`, used directly by the rolling-challenge key
/// derivation and indirectly inside the vendor routines.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Derive the 32-hex response to a challenge, keyed by client id and a
/// private/session key. Vendor-supplied in production; see module docs.
pub fn generate_auth_response(challenge: &str, client_id: u16, key: &str) -> String {
    md5_hex(format!("{challenge}{client_id}{key}").as_bytes())
}

/// Produce a fresh 32-hex challenge string. Vendor-supplied in production.
pub fn generate_auth_challenge(seed: u64) -> String {
    md5_hex(format!("xpilot-rs-challenge-{seed}").as_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_hex_is_32_chars_lowercase_hex() {
        let h = md5_hex(b"hello world");
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn response_is_deterministic() {
        let a = generate_auth_response("abcd1234", 1234, "session-key");
        let b = generate_auth_response("abcd1234", 1234, "session-key");
        assert_eq!(a, b);
    }

    #[test]
    fn response_varies_with_key() {
        let a = generate_auth_response("abcd1234", 1234, "session-key-1");
        let b = generate_auth_response("abcd1234", 1234, "session-key-2");
        assert_ne!(a, b, "rolling key must never be reused across responses");
    }
}
