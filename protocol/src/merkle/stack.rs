//! Incremental Merkle root computation.
//!
//! A [`ProofStack`] holds at most one subtree per height, tallest at the
//! bottom. Pushing a subtree of the same height as the top is a carry: the
//! two are joined and the result is pushed one level up, exactly like adding
//! one to a binary counter. Memory stays logarithmic in the amount of data.

use std::marker::PhantomData;

use super::hasher::{Blake2bHasher, MerkleHasher};
use super::MerkleError;
use crate::config::{HASH_SIZE, LEAF_SIZE};

/// A partially combined Merkle tree.
#[derive(Debug, Clone)]
pub struct ProofStack<H: MerkleHasher = Blake2bHasher> {
    /// `(subtree root, height)`, heights strictly decreasing.
    subtrees: Vec<([u8; HASH_SIZE], u32)>,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> Default for ProofStack<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: MerkleHasher> ProofStack<H> {
    pub fn new() -> Self {
        Self {
            subtrees: Vec::new(),
            _hasher: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    /// Push a subtree root of the given height (a single leaf has height 1).
    ///
    /// Fails if the subtree is taller than the current top of the stack,
    /// since that data would have had to come before what is already here.
    pub fn push_subtree(&mut self, root: [u8; HASH_SIZE], height: u32) -> Result<(), MerkleError> {
        let mut root = root;
        let mut height = height;
        loop {
            let Some(&(top_root, top_height)) = self.subtrees.last() else {
                self.subtrees.push((root, height));
                return Ok(());
            };
            if height > top_height {
                return Err(MerkleError::SubtreeTooTall {
                    height,
                    top: top_height,
                });
            }
            if height < top_height {
                self.subtrees.push((root, height));
                return Ok(());
            }
            // Carry.
            self.subtrees.pop();
            root = H::node_hash(&top_root, &root);
            height += 1;
        }
    }

    /// Hash a 64-byte leaf and push it at height 1.
    pub fn push_leaf(&mut self, leaf: &[u8]) -> Result<(), MerkleError> {
        if leaf.len() as u64 != LEAF_SIZE {
            return Err(MerkleError::LeafSize(leaf.len()));
        }
        self.push_subtree(H::leaf_hash(leaf), 1)
    }

    /// Collapse the stack into a single root.
    ///
    /// Starting from the smallest subtree, each older (taller) subtree is
    /// joined on the left of the accumulator.
    pub fn root(&self) -> Result<[u8; HASH_SIZE], MerkleError> {
        let mut iter = self.subtrees.iter().rev();
        let Some(&(mut acc, _)) = iter.next() else {
            return Err(MerkleError::EmptyStack);
        };
        for (older, _) in iter {
            acc = H::node_hash(older, &acc);
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Stack = ProofStack<Blake2bHasher>;

    fn leaf(byte: u8) -> [u8; 64] {
        [byte; 64]
    }

    #[test]
    fn test_single_leaf_root() {
        let mut ps = Stack::new();
        ps.push_leaf(&leaf(1)).unwrap();
        assert_eq!(ps.root().unwrap(), Blake2bHasher::leaf_hash(&leaf(1)));
    }

    #[test]
    fn test_two_leaves_carry() {
        let mut ps = Stack::new();
        ps.push_leaf(&leaf(1)).unwrap();
        ps.push_leaf(&leaf(2)).unwrap();
        assert_eq!(ps.len(), 1);

        let expected = Blake2bHasher::node_hash(
            &Blake2bHasher::leaf_hash(&leaf(1)),
            &Blake2bHasher::leaf_hash(&leaf(2)),
        );
        assert_eq!(ps.root().unwrap(), expected);
    }

    #[test]
    fn carry_propagates_like_a_counter() {
        let mut ps = Stack::new();
        for i in 0..7u8 {
            ps.push_leaf(&leaf(i)).unwrap();
        }
        // 7 = 0b111: one subtree each of 4, 2 and 1 leaves.
        assert_eq!(ps.len(), 3);
        ps.push_leaf(&leaf(7)).unwrap();
        assert_eq!(ps.len(), 1);
    }

    #[test]
    fn test_uneven_root_joins_older_on_left() {
        let mut ps = Stack::new();
        for i in 0..3u8 {
            ps.push_leaf(&leaf(i)).unwrap();
        }
        let left = Blake2bHasher::node_hash(
            &Blake2bHasher::leaf_hash(&leaf(0)),
            &Blake2bHasher::leaf_hash(&leaf(1)),
        );
        let expected = Blake2bHasher::node_hash(&left, &Blake2bHasher::leaf_hash(&leaf(2)));
        assert_eq!(ps.root().unwrap(), expected);
    }

    #[test]
    fn test_taller_subtree_is_rejected() {
        let mut ps = Stack::new();
        ps.push_subtree([0u8; 32], 2).unwrap();
        assert_eq!(
            ps.push_subtree([0u8; 32], 3),
            Err(MerkleError::SubtreeTooTall { height: 3, top: 2 })
        );
    }

    #[test]
    fn test_empty_root_is_an_error() {
        assert_eq!(Stack::new().root(), Err(MerkleError::EmptyStack));
    }

    #[test]
    fn test_wrong_leaf_size() {
        let mut ps = Stack::new();
        assert_eq!(ps.push_leaf(&[0u8; 63]), Err(MerkleError::LeafSize(63)));
        assert!(ps.is_empty());
    }

    #[test]
    fn subtree_push_matches_leaf_push() {
        let mut by_leaf = Stack::new();
        for i in 0..4u8 {
            by_leaf.push_leaf(&leaf(i)).unwrap();
        }

        let mut by_subtree = Stack::new();
        by_subtree.push_leaf(&leaf(0)).unwrap();
        by_subtree.push_leaf(&leaf(1)).unwrap();
        let right = Blake2bHasher::node_hash(
            &Blake2bHasher::leaf_hash(&leaf(2)),
            &Blake2bHasher::leaf_hash(&leaf(3)),
        );
        by_subtree.push_subtree(right, 2).unwrap();

        assert_eq!(by_leaf.root().unwrap(), by_subtree.root().unwrap());
    }
}
