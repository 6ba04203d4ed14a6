// SPDX-License-Identifier: MIT

//! Opaque identifier and token generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

/// Bytes of entropy in a document ID (128 bits).
const DOC_ID_BYTES: usize = 16;
/// Bytes of entropy in an invitation token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Generate a random URL-safe document ID.
pub fn new_doc_id() -> String {
    random_urlsafe(DOC_ID_BYTES)
}

/// Generate a random invitation token (the raw secret placed in the link).
pub fn new_invite_token() -> String {
    random_urlsafe(TOKEN_BYTES)
}

/// SHA-256 hex of a raw token; invitations are stored under this key so a
/// database leak does not leak live invite links.
pub fn token_hash(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    hex::encode(hasher.finalize())
}

fn random_urlsafe(len: usize) -> String {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    // SystemRandom::fill only fails if the OS RNG is unavailable
    rng.fill(&mut bytes)
        .expect("system random number generator unavailable");
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_are_unique_and_urlsafe() {
        let a = new_doc_id();
        let b = new_doc_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_stable_hex() {
        let h1 = token_hash("some-token");
        let h2 = token_hash("some-token");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, token_hash("other-token"));
    }

    #[test]
    fn invite_tokens_are_longer_than_doc_ids() {
        assert!(new_invite_token().len() > new_doc_id().len());
    }
}
