//! OAuth token values
//!
//! Tokens are 32 random bytes encoded as unpadded base64url (43 characters).
//! Only their SHA-256 digest is persisted.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;
const TOKEN_HASH_PREFIX: &str = "sha256:";

/// Generate a new random token value
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest stored in place of a token value
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", TOKEN_HASH_PREFIX, URL_SAFE_NO_PAD.encode(digest))
}
