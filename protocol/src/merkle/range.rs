//! Range proofs over a single sector.
//!
//! A range proof for `[offset, offset + fetch_size)` is the list of subtree
//! roots covering everything in the sector *except* that range: first the
//! prefix `[0, offset)` and then the suffix up to the end of the sector. Both
//! sides are split into the canonical sequence of aligned power-of-two
//! subtrees picked by [`ideal_and_max_subtree`], so prover and verifier agree
//! on exactly which hashes appear and in what order.

use super::hasher::{Blake2bHasher, MerkleHasher};
use super::stack::ProofStack;
use super::{merkle_root_with, MerkleError};
use crate::config::{HASH_SIZE, LEAF_SIZE, LEAVES_PER_SECTOR, MAX_SUBTREE_HEIGHT, SECTOR_SIZE};

/// Height and leaf count of the largest subtree that starts at leaf `start`
/// and ends at or before leaf `end`.
///
/// The ideal height is set by how aligned `start` is (its trailing zero
/// bits, capped so that `start == 0` terminates); the max height by the
/// largest power of two fitting in the range. The smaller of the two wins.
pub fn ideal_and_max_subtree(start: u64, end: u64) -> Result<(u32, u64), MerkleError> {
    if end <= start {
        return Err(MerkleError::InvalidSubtreeRange { start, end });
    }

    let mut ideal_height = 1u32;
    let mut ideal_size = 1u64;
    while ideal_height < MAX_SUBTREE_HEIGHT && start % (ideal_size * 2) == 0 {
        ideal_height += 1;
        ideal_size *= 2;
    }

    let range = end - start;
    let max_size = 1u64 << (63 - range.leading_zeros());
    let max_height = max_size.trailing_zeros() + 1;

    if ideal_height < max_height {
        Ok((ideal_height, ideal_size))
    } else {
        Ok((max_height, max_size))
    }
}

/// The canonical subtree decomposition of leaves `[start, end)`.
fn subtrees_between(start: u64, end: u64) -> Result<Vec<(u32, u64)>, MerkleError> {
    let mut subtrees = Vec::new();
    let mut current = start;
    while current < end {
        let (height, size) = ideal_and_max_subtree(current, end)?;
        subtrees.push((height, size));
        current += size;
    }
    Ok(subtrees)
}

/// Checks shared by the prover and the verifier. Returns the leaf range.
fn check_range(offset: u64, fetch_size: u64) -> Result<(u64, u64), MerkleError> {
    if fetch_size == 0 {
        return Err(MerkleError::EmptyRange);
    }
    let end = offset
        .checked_add(fetch_size)
        .filter(|end| *end <= SECTOR_SIZE)
        .ok_or(MerkleError::RangeOutOfBounds { offset, fetch_size })?;
    if offset % LEAF_SIZE != 0 || fetch_size % LEAF_SIZE != 0 {
        return Err(MerkleError::Misaligned { offset, fetch_size });
    }
    Ok((offset / LEAF_SIZE, end / LEAF_SIZE))
}

/// Verify that `data` is the content of `[offset, offset + fetch_size)` in the
/// sector with Merkle root `root`, using the network hasher.
pub fn verify_range_proof(
    root: &[u8; HASH_SIZE],
    offset: u64,
    fetch_size: u64,
    data: &[u8],
    proof: &[u8],
) -> Result<(), MerkleError> {
    verify_range_proof_with::<Blake2bHasher>(root, offset, fetch_size, data, proof)
}

/// [`verify_range_proof`] with an explicit hasher.
///
/// Every length and bounds problem is reported before any hashing happens.
/// Once hashing starts, the only possible failure is [`MerkleError::RootMismatch`].
pub fn verify_range_proof_with<H: MerkleHasher>(
    root: &[u8; HASH_SIZE],
    offset: u64,
    fetch_size: u64,
    data: &[u8],
    proof: &[u8],
) -> Result<(), MerkleError> {
    let (first_leaf, end_leaf) = check_range(offset, fetch_size)?;
    if data.len() as u64 != fetch_size {
        return Err(MerkleError::DataLength {
            expected: fetch_size,
            got: data.len(),
        });
    }

    let prefix = subtrees_between(0, first_leaf)?;
    let suffix = subtrees_between(end_leaf, LEAVES_PER_SECTOR)?;
    let expected_proof = (prefix.len() + suffix.len()) * HASH_SIZE;
    if proof.len() != expected_proof {
        return Err(MerkleError::ProofLength {
            expected: expected_proof,
            got: proof.len(),
        });
    }

    let mut stack = ProofStack::<H>::new();
    let mut proof_hashes = proof.chunks_exact(HASH_SIZE);

    let mut push_from_proof = |stack: &mut ProofStack<H>, height: u32| -> Result<(), MerkleError> {
        let mut subtree_root = [0u8; HASH_SIZE];
        if let Some(hash) = proof_hashes.next() {
            subtree_root.copy_from_slice(hash);
        }
        stack.push_subtree(subtree_root, height)
    };

    for (height, _) in &prefix {
        push_from_proof(&mut stack, *height)?;
    }
    for leaf in data.chunks_exact(LEAF_SIZE as usize) {
        stack.push_leaf(leaf)?;
    }
    for (height, _) in &suffix {
        push_from_proof(&mut stack, *height)?;
    }

    if stack.root()? != *root {
        return Err(MerkleError::RootMismatch);
    }
    Ok(())
}

/// Build the proof for `[offset, offset + fetch_size)` of a full sector.
pub fn build_range_proof(sector: &[u8], offset: u64, fetch_size: u64) -> Result<Vec<u8>, MerkleError> {
    build_range_proof_with::<Blake2bHasher>(sector, offset, fetch_size)
}

/// [`build_range_proof`] with an explicit hasher.
pub fn build_range_proof_with<H: MerkleHasher>(
    sector: &[u8],
    offset: u64,
    fetch_size: u64,
) -> Result<Vec<u8>, MerkleError> {
    if sector.len() as u64 != SECTOR_SIZE {
        return Err(MerkleError::DataLength {
            expected: SECTOR_SIZE,
            got: sector.len(),
        });
    }
    let (first_leaf, end_leaf) = check_range(offset, fetch_size)?;

    let mut proof = Vec::new();
    let mut append = |start_leaf: u64, end_leaf: u64| -> Result<(), MerkleError> {
        let mut current = start_leaf;
        for (_, size) in subtrees_between(start_leaf, end_leaf)? {
            let from = (current * LEAF_SIZE) as usize;
            let to = ((current + size) * LEAF_SIZE) as usize;
            proof.extend_from_slice(&merkle_root_with::<H>(&sector[from..to])?);
            current += size;
        }
        Ok(())
    };
    append(0, first_leaf)?;
    append(end_leaf, LEAVES_PER_SECTOR)?;
    Ok(proof)
}
