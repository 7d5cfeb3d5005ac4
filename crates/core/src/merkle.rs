//! Binary Merkle tree over transaction hashes.
//!
//! Leaves are transaction content hashes in block order. Each parent is the
//! digest of `left || right`; a level with an odd count pairs its last node
//! with itself.

use crate::hash::{digest_concat, Hash};

fn parent_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            digest_concat(&[left.as_ref(), right.as_ref()])
        })
        .collect()
}

/// Compute the merkle root of a list of hashes.
///
/// Returns the zero hash if the list is empty.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = parent_level(&level);
    }
    level.first().copied().unwrap_or(Hash::ZERO)
}

/// A fully materialised tree, kept around to produce inclusion proofs.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Leaves first, root level last. Never empty.
    levels: Vec<Vec<Hash>>,
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: Hash,
    /// `(sibling, sibling_is_right)` from the leaf level upwards.
    pub path: Vec<(Hash, bool)>,
}

impl MerkleTree {
    pub fn new(leaves: &[Hash]) -> Self {
        let mut levels = vec![if leaves.is_empty() {
            vec![Hash::ZERO]
        } else {
            leaves.to_vec()
        }];
        while let Some(top) = levels.last().filter(|l| l.len() > 1) {
            let next = parent_level(top);
            levels.push(next);
        }
        Self { levels }
    }

    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Build the proof for leaf `index`, or `None` when out of range.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = *self.levels[0].get(index)?;
        let mut path = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_is_right = idx % 2 == 0;
            let sibling_idx = if sibling_is_right { idx + 1 } else { idx - 1 };
            let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);
            path.push((sibling, sibling_is_right));
            idx /= 2;
        }

        Some(MerkleProof { leaf, path })
    }
}

/// Fold a proof up to a root and compare.
pub fn verify_proof(root: &Hash, proof: &MerkleProof) -> bool {
    let computed = proof
        .path
        .iter()
        .fold(proof.leaf, |acc, (sibling, sibling_is_right)| {
            if *sibling_is_right {
                digest_concat(&[acc.as_ref(), sibling.as_ref()])
            } else {
                digest_concat(&[sibling.as_ref(), acc.as_ref()])
            }
        });
    computed == *root
}
