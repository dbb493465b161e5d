//! # Merkle Engine
//!
//! Sector Merkle trees with 64-byte leaves.
//!
//! ```text
//!   leaf root  = H(0x00 ∥ leaf)
//!   node root  = H(0x01 ∥ left ∥ right)
//! ```
//!
//! This is where a portal's claim that "these bytes belong to that link"
//! gets checked. [`ProofStack`] builds roots incrementally,
//! [`verify_range_proof`] checks a slice of a sector against its root, and
//! [`build_range_proof`] produces the proofs the verifier expects.
//!
//! `H` defaults to BLAKE2b-256, the network hash. Any [`MerkleHasher`] can
//! be plugged in through the `_with` variants.

pub mod hasher;
pub mod range;
pub mod stack;

use thiserror::Error;

use crate::config::{HASH_SIZE, LEAF_SIZE};

pub use hasher::{Blake2bHasher, Blake3Hasher, MerkleHasher};
pub use range::{
    build_range_proof, build_range_proof_with, ideal_and_max_subtree, verify_range_proof,
    verify_range_proof_with,
};
pub use stack::ProofStack;

/// Errors from the Merkle engine.
///
/// Everything except [`MerkleError::RootMismatch`] means the inputs were
/// malformed. `RootMismatch` means they were well-formed and wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot compute the Merkle root of an empty data set")]
    EmptyStack,

    #[error("cannot push a subtree of height {height} onto a stack whose top has height {top}")]
    SubtreeTooTall { height: u32, top: u32 },

    #[error("leaves must be exactly 64 bytes, got {0}")]
    LeafSize(usize),

    #[error("data length {0} is not a multiple of 64 bytes")]
    DataNotAligned(usize),

    #[error("subtree range end ({end}) must be strictly larger than start ({start})")]
    InvalidSubtreeRange { start: u64, end: u64 },

    #[error("range proof covers no data")]
    EmptyRange,

    #[error("range [{offset}, +{fetch_size}) is outside the sector")]
    RangeOutOfBounds { offset: u64, fetch_size: u64 },

    #[error("range [{offset}, +{fetch_size}) is not aligned to 64-byte leaves")]
    Misaligned { offset: u64, fetch_size: u64 },

    #[error("data length does not match range: expected {expected}, got {got}")]
    DataLength { expected: u64, got: usize },

    #[error("merkle proof has invalid length: expected {expected} bytes, got {got}")]
    ProofLength { expected: usize, got: usize },

    #[error("merkle proof does not match root")]
    RootMismatch,
}

/// Merkle root of `data` with the network hasher.
pub fn merkle_root(data: &[u8]) -> Result<[u8; HASH_SIZE], MerkleError> {
    merkle_root_with::<Blake2bHasher>(data)
}

/// Merkle root of `data` with an explicit hasher. `data` must be a
/// non-empty multiple of 64 bytes.
pub fn merkle_root_with<H: MerkleHasher>(data: &[u8]) -> Result<[u8; HASH_SIZE], MerkleError> {
    if data.len() as u64 % LEAF_SIZE != 0 {
        return Err(MerkleError::DataNotAligned(data.len()));
    }
    let mut stack = ProofStack::<H>::new();
    for leaf in data.chunks_exact(LEAF_SIZE as usize) {
        stack.push_leaf(leaf)?;
    }
    stack.root()
}
