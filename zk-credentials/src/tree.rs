//! Native Poseidon Merkle tree over commit leaves.
//!
//! The host builds the tree once per repository, then extracts one sibling
//! path per committed leaf for the circuit witness. Leaves beyond the real
//! commit count are the zero sentinel, which no domain-tagged input hashes
//! to.

use crate::constants::DOMAIN_MERKLE_NODE;
use crate::error::CircuitError;
use crate::gadgets::hash::hash_elems;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;

/// Sibling path for one leaf.
///
/// `is_right[level]` is true when the running node is the *right* child at
/// that level, i.e. the sibling sits on the left.
#[derive(Clone, Debug)]
pub struct MerklePath {
    pub siblings: Vec<Fr>,
    pub is_right: Vec<bool>,
}

impl MerklePath {
    /// All-zero path used for inactive commit slots.
    pub fn empty(depth: usize) -> Self {
        Self {
            siblings: vec![Fr::from(0u64); depth],
            is_right: vec![false; depth],
        }
    }
}

/// Fixed-depth binary Poseidon tree, fully materialized.
pub struct MerkleTree {
    depth: usize,
    /// levels[0] = leaves (2^depth of them), last level = [root].
    levels: Vec<Vec<Fr>>,
}

impl MerkleTree {
    /// Build a tree of `2^depth` leaves from `leaves`, zero-padded.
    ///
    /// More leaves than the capacity is a hard error; truncation would
    /// silently drop commits from the committed history.
    pub fn from_leaves(
        cfg: &PoseidonConfig<Fr>,
        leaves: &[Fr],
        depth: usize,
    ) -> Result<Self, CircuitError> {
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(CircuitError::CapacityExceeded {
                capacity,
                got: leaves.len(),
            });
        }

        let mut level = Vec::with_capacity(capacity);
        level.extend_from_slice(leaves);
        level.resize(capacity, Fr::from(0u64));

        let mut levels = vec![level];
        for _ in 0..depth {
            let prev = levels.last().expect("at least the leaf level");
            let mut next = Vec::with_capacity(prev.len() / 2);
            for pair in prev.chunks(2) {
                next.push(hash_elems(cfg, DOMAIN_MERKLE_NODE, &[pair[0], pair[1]]));
            }
            levels.push(next);
        }

        Ok(Self { depth, levels })
    }

    pub fn root(&self) -> Fr {
        self.levels[self.depth][0]
    }

    /// Sibling path for the leaf at `index`.
    pub fn path(&self, index: usize) -> MerklePath {
        let mut siblings = Vec::with_capacity(self.depth);
        let mut is_right = Vec::with_capacity(self.depth);

        let mut pos = index;
        for level in 0..self.depth {
            let right_child = pos % 2 == 1;
            let sibling_pos = if right_child { pos - 1 } else { pos + 1 };
            siblings.push(self.levels[level][sibling_pos]);
            is_right.push(right_child);
            pos /= 2;
        }

        MerklePath { siblings, is_right }
    }
}

/// Native path verification; MUST match the in-circuit gadget.
pub fn verify_path(cfg: &PoseidonConfig<Fr>, leaf: Fr, root: Fr, path: &MerklePath) -> bool {
    let mut current = leaf;
    for (sibling, right_child) in path.siblings.iter().zip(&path.is_right) {
        let (left, right) = if *right_child {
            (*sibling, current)
        } else {
            (current, *sibling)
        };
        current = hash_elems(cfg, DOMAIN_MERKLE_NODE, &[left, right]);
    }
    current == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::poseidon_config;

    #[test]
    fn every_leaf_verifies() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=5u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.path(i);
            assert!(verify_path(&cfg, *leaf, tree.root(), &path), "leaf {i}");
        }
    }

    #[test]
    fn tampered_sibling_fails() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let mut path = tree.path(3);
        path.siblings[1] += Fr::from(1u64);
        assert!(!verify_path(&cfg, leaves[3], tree.root(), &path));
    }

    #[test]
    fn flipped_direction_fails() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (1..=8u64).map(Fr::from).collect();
        let tree = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap();

        let mut path = tree.path(3);
        path.is_right[0] = !path.is_right[0];
        assert!(!verify_path(&cfg, leaves[3], tree.root(), &path));
    }

    #[test]
    fn overflow_is_rejected_not_truncated() {
        let cfg = poseidon_config();
        let leaves: Vec<Fr> = (0..9u64).map(Fr::from).collect();
        let err = MerkleTree::from_leaves(&cfg, &leaves, 3).unwrap_err();
        assert!(matches!(
            err,
            CircuitError::CapacityExceeded { capacity: 8, got: 9 }
        ));
    }
}
