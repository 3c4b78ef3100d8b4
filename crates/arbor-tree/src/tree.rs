//! The sparse Merkle tree and its insertion engine.
//!
//! The dense form of a 257-level tree would hold 2^257 - 1 nodes; only
//! materialized nodes are stored, one hashbrown map per level keyed by the
//! node's 32-byte local index. Insertion walks from the leaf to the root,
//! materializing missing ancestors and recomputing each ancestor's hash
//! from its two children (an absent child contributes the empty hash).

use arbor_core::{merkle_hash, Hash32, LeafIndex, NodeIndex, LEAF_LEVEL, NODE_INDEX_LEN, TREE_LEVELS};
use num_bigint::BigUint;

use crate::error::TreeError;
use crate::level::{NodeRecord, TreeLevel};
use crate::path::{index_to_key, PathWalk};
use crate::proof::ProofTree;

/// A 257-level sparse Merkle prefix tree over a 256-bit leaf address space.
#[derive(Clone, Debug)]
pub struct SparseTree {
    levels: Vec<TreeLevel>,
}

impl SparseTree {
    /// Create an empty tree with `num_levels` levels.
    ///
    /// Only 257 levels are supported: the 32-byte index keys, the walk
    /// geometry, and the test vectors all assume a 256-bit leaf space.
    pub fn new(num_levels: usize) -> Self {
        assert_eq!(
            num_levels, TREE_LEVELS,
            "only {TREE_LEVELS}-level trees are supported"
        );
        Self {
            levels: (0..num_levels).map(TreeLevel::new).collect(),
        }
    }

    /// Look up a node record.
    pub fn get(&self, level: usize, index: &NodeIndex) -> Option<&NodeRecord> {
        self.level(level).get(index.as_bytes())
    }

    /// Insert or overwrite a node record.
    ///
    /// Panics when storing an empty hash at a non-leaf level; absence is the
    /// only representation of emptiness in the main tree.
    pub fn put(&mut self, level: usize, index: NodeIndex, record: NodeRecord) {
        assert!(
            level == LEAF_LEVEL || !record.hash.is_zero(),
            "empty hash stored at non-leaf level {level}"
        );
        self.level_mut(level).insert(*index.as_bytes(), record);
    }

    /// Remove a node record, returning it if present.
    pub fn remove(&mut self, level: usize, index: &NodeIndex) -> Option<NodeRecord> {
        self.level_mut(level).remove(index.as_bytes())
    }

    /// Total number of materialized nodes across all levels.
    pub fn node_count(&self) -> u64 {
        self.levels.iter().map(|l| l.len() as u64).sum()
    }

    /// Number of materialized nodes on one level.
    pub fn level_len(&self, level: usize) -> usize {
        self.level(level).len()
    }

    /// Enumerate the `(index key, record)` pairs of one level.
    ///
    /// Iteration order is unspecified.
    pub fn iter_level(
        &self,
        level: usize,
    ) -> impl Iterator<Item = (&[u8; NODE_INDEX_LEN], &NodeRecord)> {
        self.level(level).iter()
    }

    /// The root's Merkle hash.
    ///
    /// Fails with [`TreeError::EmptyTree`] before the first insertion.
    pub fn root_hash(&self) -> Result<Hash32, TreeError> {
        debug_assert!(
            self.levels[0].len() <= 1,
            "level 0 holds more than one node"
        );
        match self.levels[0].get(&[0u8; NODE_INDEX_LEN]) {
            Some(root) => Ok(root.hash),
            None => Err(TreeError::EmptyTree),
        }
    }

    /// Grow per-level map capacity ahead of a batch of `expected` insertions.
    ///
    /// Each insertion touches at most one node per level, so `expected` is
    /// an upper bound per level; levels near the root are capped at their
    /// width.
    pub fn reserve_batch(&mut self, expected: usize) {
        for level in self.levels.iter_mut() {
            let width_cap = if level.num() < usize::BITS as usize - 1 {
                1usize << level.num()
            } else {
                usize::MAX
            };
            level.reserve(expected.min(width_cap).saturating_sub(level.len()));
        }
    }

    /// Insert `data_hash` at leaf address `leaf`.
    ///
    /// Fails with [`TreeError::DuplicateLeaf`] (before any mutation) if the
    /// address is occupied. On success every ancestor on the path to the
    /// root exists and carries the Merkle combination of its children.
    ///
    /// When `proof` is supplied, nodes first materialized by this insertion
    /// are flagged new and the proof tree is extended incrementally after
    /// the hash walk completes. Returns the number of newly materialized
    /// nodes (at least 1, at most 257).
    pub fn insert(
        &mut self,
        leaf: LeafIndex,
        data_hash: Hash32,
        proof: Option<&mut ProofTree>,
    ) -> Result<usize, TreeError> {
        let leaf_key = *leaf.as_bytes();
        if self.levels[LEAF_LEVEL].contains(&leaf_key) {
            return Err(TreeError::DuplicateLeaf(leaf));
        }

        let proof_active = proof.is_some();
        let mut created = 0usize;

        // Carry state from the previous (lower) level: the just-written
        // hash, the sibling's hash if materialized, and which side the
        // written node was on. The leaf step overwrites all three.
        let mut carry_hash = Hash32::zero();
        let mut carry_sibling: Option<Hash32> = None;
        let mut carry_is_left = true;

        for step in PathWalk::from_key(LEAF_LEVEL, &leaf_key) {
            let hash = if step.level == LEAF_LEVEL {
                data_hash
            } else {
                let sibling_hash = carry_sibling.unwrap_or(Hash32::zero());
                let (left, right) = if carry_is_left {
                    (carry_hash, sibling_hash)
                } else {
                    (sibling_hash, carry_hash)
                };
                merkle_hash(&left, &right)
            };

            let key = index_to_key(&step.index);
            let node = self.levels[step.level].get_or_insert_with(key, || {
                created += 1;
                NodeRecord {
                    hash: Hash32::zero(),
                    is_new: proof_active,
                }
            });
            node.hash = hash;

            carry_hash = hash;
            carry_sibling = self.levels[step.level]
                .get(&index_to_key(&step.sibling))
                .map(|sibling| sibling.hash);
            carry_is_left = step.is_left;
        }

        if let Some(proof) = proof {
            proof.record_insert(self, &leaf);
        }

        Ok(created)
    }

    /// Clear the new-node flags after a batch's proof has been computed.
    ///
    /// Re-walks every materialized leaf's path to the root. Panics if an
    /// ancestor on a known leaf's path is missing; that would mean the tree
    /// invariants were already broken.
    pub fn clear_new_flags(&mut self) {
        let leaves: Vec<[u8; NODE_INDEX_LEN]> = self.levels[LEAF_LEVEL]
            .iter()
            .map(|(key, _)| *key)
            .collect();
        for leaf_key in leaves {
            for step in PathWalk::from_key(LEAF_LEVEL, &leaf_key) {
                let key = index_to_key(&step.index);
                match self.levels[step.level].get_mut(&key) {
                    Some(node) => node.is_new = false,
                    None => panic!(
                        "missing ancestor at level {} on the path of a known leaf",
                        step.level
                    ),
                }
            }
        }
    }

    fn level(&self, level: usize) -> &TreeLevel {
        assert!(level < TREE_LEVELS, "level {level} out of range");
        &self.levels[level]
    }

    fn level_mut(&mut self, level: usize) -> &mut TreeLevel {
        assert!(level < TREE_LEVELS, "level {level} out of range");
        &mut self.levels[level]
    }

    pub(crate) fn record_by_uint(&self, level: usize, index: &BigUint) -> Option<&NodeRecord> {
        self.level(level).get(&index_to_key(index))
    }

    pub(crate) fn insert_raw(
        &mut self,
        level: usize,
        key: [u8; NODE_INDEX_LEN],
        record: NodeRecord,
    ) {
        self.level_mut(level).insert(key, record);
    }

    pub(crate) fn record_mut_by_key(
        &mut self,
        level: usize,
        key: &[u8; NODE_INDEX_LEN],
    ) -> Option<&mut NodeRecord> {
        self.level_mut(level).get_mut(key)
    }

    pub(crate) fn remove_by_uint(&mut self, level: usize, index: &BigUint) -> Option<NodeRecord> {
        self.level_mut(level).remove(&index_to_key(index))
    }
}

impl Default for SparseTree {
    fn default() -> Self {
        Self::new(TREE_LEVELS)
    }
}
