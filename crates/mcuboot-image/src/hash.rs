//! Image content hashing.

use sha2::{Digest, Sha256};

/// Size of an image hash in bytes.
pub const HASH_SIZE: usize = 32;

/// A SHA-256 image hash.
pub type ImageHash = [u8; HASH_SIZE];

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> ImageHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
