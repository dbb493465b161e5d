//! Pluggable hash functions for the Merkle engine.
//!
//! The tree shape and domain separation (0x00 for leaves, 0x01 for nodes) are
//! fixed. Only the compression function varies.

use crate::config::HASH_SIZE;
use crate::crypto::{blake2b_hash_multi, blake3_hash_multi};

const LEAF_PREFIX: [u8; 1] = [0x00];
const NODE_PREFIX: [u8; 1] = [0x01];

/// A hash function that can build a sector Merkle tree.
pub trait MerkleHasher {
    /// Hash the concatenation of `parts`.
    fn hash(parts: &[&[u8]]) -> [u8; HASH_SIZE];

    fn leaf_hash(leaf: &[u8]) -> [u8; HASH_SIZE] {
        Self::hash(&[&LEAF_PREFIX, leaf])
    }

    fn node_hash(left: &[u8; HASH_SIZE], right: &[u8; HASH_SIZE]) -> [u8; HASH_SIZE] {
        Self::hash(&[&NODE_PREFIX, left, right])
    }
}

/// BLAKE2b-256. This is the hasher portals use; sector roots computed with
/// anything else will not match a link.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bHasher;

impl MerkleHasher for Blake2bHasher {
    fn hash(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
        blake2b_hash_multi(parts)
    }
}

/// BLAKE3, for local integrity checks where network compatibility is not
/// required.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl MerkleHasher for Blake3Hasher {
    fn hash(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
        blake3_hash_multi(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::blake2b_hash;

    #[test]
    fn test_leaf_hash_is_prefixed() {
        let leaf = [0x42u8; 64];
        let mut tagged = vec![0u8];
        tagged.extend_from_slice(&leaf);
        assert_eq!(Blake2bHasher::leaf_hash(&leaf), blake2b_hash(&tagged));
    }

    #[test]
    fn test_node_hash_is_prefixed_and_ordered() {
        let (a, b) = ([1u8; 32], [2u8; 32]);
        let mut tagged = vec![1u8];
        tagged.extend_from_slice(&a);
        tagged.extend_from_slice(&b);
        assert_eq!(Blake2bHasher::node_hash(&a, &b), blake2b_hash(&tagged));
        assert_ne!(Blake2bHasher::node_hash(&a, &b), Blake2bHasher::node_hash(&b, &a));
    }

    #[test]
    fn leaf_and_node_domains_are_separate() {
        // 65 bytes either way, but the prefixes differ.
        let bytes = [3u8; 64];
        let mut halves = ([0u8; 32], [0u8; 32]);
        halves.0.copy_from_slice(&bytes[..32]);
        halves.1.copy_from_slice(&bytes[32..]);
        assert_ne!(
            Blake2bHasher::leaf_hash(&bytes),
            Blake2bHasher::node_hash(&halves.0, &halves.1)
        );
    }

    #[test]
    fn test_blake3_hasher_differs() {
        let leaf = [0u8; 64];
        assert_ne!(Blake2bHasher::leaf_hash(&leaf), Blake3Hasher::leaf_hash(&leaf));
    }
}
