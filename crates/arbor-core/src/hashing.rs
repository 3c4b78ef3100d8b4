//! Merkle hashing.
//!
//! Rule: an interior node's hash is SHA-256 over the raw 64-byte
//! concatenation of its children, left then right. No length prefix, no
//! domain separator, no leaf/interior distinction. An absent child
//! contributes the empty hash, so `H(empty, empty)` is itself a real,
//! non-empty value and the tree does not self-prune at the hash layer.

use crate::constants::HASH32_LEN;
use crate::types::Hash32;
use sha2::{Digest, Sha256};

/// Combine two child hashes into their parent's Merkle hash.
pub fn merkle_hash(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let out = hasher.finalize();
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(&out);
    Hash32(arr)
}

/// Hash arbitrary bytes with SHA-256 and return 32 bytes.
///
/// Used by the driver and tests to derive leaf addresses and data hashes.
pub fn hash_bytes(bytes: &[u8]) -> Hash32 {
    let out = Sha256::digest(bytes);
    let mut arr = [0u8; HASH32_LEN];
    arr.copy_from_slice(&out);
    Hash32(arr)
}
