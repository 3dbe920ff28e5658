/// Opaque one-time tokens for password reset and email verification.
///
/// Tokens are cryptographically random 64-character strings handed to the
/// delivery collaborator in plaintext; only the SHA-256 digest is stored, so
/// a leaked credential store cannot be replayed into resets.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

pub fn generate_opaque_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Digest used for at-rest storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
