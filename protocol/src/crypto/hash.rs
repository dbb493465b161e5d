//! # Hashing Utilities
//!
//! Three hash functions, each with a clear job:
//!
//! - **BLAKE2b-256**: the network hash. Sector Merkle roots, registry entry
//!   IDs, and registry signature digests are all BLAKE2b with a 32-byte
//!   output, because that's what skyd computes. Not negotiable.
//!
//! - **SHA-512**: key derivation from the root seed. The first 32 bytes of
//!   the digest become an Ed25519 seed or a data key. This matches the
//!   existing MySky derivation, so changing it would orphan every entry a
//!   user has ever written.
//!
//! - **BLAKE3**: an alternative Merkle hasher for local tooling. Never
//!   sent to a portal.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sha2::Sha512;

/// BLAKE2b with a 256-bit output.
pub type Blake2b256 = Blake2b<U32>;

/// Compute the BLAKE2b-256 hash of the input.
///
/// # Example
///
/// ```
/// use skytrust_protocol::crypto::blake2b_hash;
///
/// let hash = blake2b_hash(b"skynet");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake2b_hash(data: &[u8]) -> [u8; 32] {
    blake2b_hash_multi(&[data])
}

/// Hash several byte slices as if they were concatenated, without building
/// the concatenation. Most of the protocol's preimages are tag ∥ a ∥ b
/// constructions, so this is the form callers actually want.
pub fn blake2b_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute SHA-512 over the concatenation of `parts`.
pub fn sha512_multi(parts: &[&[u8]]) -> [u8; 64] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 64];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// BLAKE3 over the concatenation of `parts`.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
