//! Append-only proof construction, compression, and verification.
//!
//! A proof tree is a second sparse tree with the same geometry as the main
//! tree. It stores exactly those nodes a verifier needs to recompute *both*
//! the pre-batch and post-batch root hashes: for every intersection node
//! (the lowest ancestor of a new leaf whose sibling predates the batch) its
//! old child and new child, plus the sibling hashes proving those nodes up
//! to the root. In a proof tree `is_new` means "absent from the main tree
//! at the batch's start"; folding the proof with new nodes replaced by the
//! empty hash yields the old root, folding it verbatim yields the new root.

use arbor_core::{merkle_hash, Hash32, LeafIndex, LEAF_LEVEL, NODE_INDEX_LEN, TREE_LEVELS};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::level::NodeRecord;
use crate::path::{child_indices, index_to_key, PathWalk};
use crate::tree::SparseTree;

/// The append-only proof for one batch of insertions.
///
/// Created empty at batch start, filled incrementally by each insertion,
/// compressed once the batch completes, and discarded after verification.
/// A proof tree is owned by exactly one batch.
#[derive(Clone, Debug, Default)]
pub struct ProofTree {
    tree: SparseTree,
}

impl ProofTree {
    /// Create an empty proof tree.
    pub fn new() -> Self {
        Self {
            tree: SparseTree::new(TREE_LEVELS),
        }
    }

    /// Total number of nodes in the proof: the proof size being measured.
    pub fn node_count(&self) -> u64 {
        self.tree.node_count()
    }

    /// Number of proof nodes carrying the empty hash (absent siblings).
    pub fn empty_sibling_count(&self) -> u64 {
        let mut count = 0u64;
        for level in (0..TREE_LEVELS).rev() {
            count += self
                .tree
                .iter_level(level)
                .filter(|(_, node)| node.hash.is_zero())
                .count() as u64;
        }
        count
    }

    /// The underlying sparse tree, for inspection.
    pub fn as_tree(&self) -> &SparseTree {
        &self.tree
    }

    /// Mutable access to the underlying sparse tree.
    ///
    /// Exists so tests can perturb recorded hashes; production code never
    /// edits a proof by hand.
    pub fn as_tree_mut(&mut self) -> &mut SparseTree {
        &mut self.tree
    }

    /// Extend the proof for one just-inserted leaf.
    ///
    /// Must run after the insertion's hash walk so intersection ancestors
    /// are recorded with their freshest main-tree hashes. Walks the leaf's
    /// path upward looking for the intersection: the lowest ancestor whose
    /// sibling exists in the main tree and predates the batch. Below the
    /// intersection nothing is recorded (whole new subtrees are proven by
    /// their topmost node); at it, the old sibling and the new ancestor are
    /// recorded; above it, every sibling is recorded unconditionally, an
    /// absent sibling as an empty-hash old node.
    pub(crate) fn record_insert(&mut self, main: &SparseTree, leaf: &LeafIndex) {
        let mut found_intersection = false;

        for step in PathWalk::from_key(LEAF_LEVEL, leaf.as_bytes()) {
            // The root has no sibling; nothing to record at level 0.
            if step.level == 0 {
                continue;
            }

            let sibling = main.record_by_uint(step.level, &step.sibling);

            if !found_intersection {
                // An absent sibling can never be the intersection, only a
                // materialized pre-batch one.
                if let Some(sibling) = sibling {
                    if !sibling.is_new {
                        self.include(step.level, &step.sibling, Some(sibling), false);
                        let ancestor = main.record_by_uint(step.level, &step.index);
                        self.include(step.level, &step.index, ancestor, true);
                        found_intersection = true;
                    }
                }
            } else {
                match sibling {
                    // Absent sibling: an empty-hash node, and empty hashes
                    // are never marked new.
                    None => self.include(step.level, &step.sibling, None, false),
                    // Present sibling: old or new, recorded verbatim.
                    Some(sibling) => {
                        self.include(step.level, &step.sibling, Some(sibling), sibling.is_new)
                    }
                }
            }
        }
    }

    /// Add one main-tree node (or an absent placeholder) to the proof.
    ///
    /// Re-adding an already-recorded node refreshes its hash, since later
    /// insertions in the batch move ancestor hashes. The `is_new` flag only
    /// promotes from old to new, and only an empty-hash placeholder may be
    /// promoted: that is the absent sibling of an earlier insertion being
    /// materialized by a later one.
    fn include(
        &mut self,
        level: usize,
        index: &BigUint,
        node: Option<&NodeRecord>,
        is_new: bool,
    ) {
        let node_hash = match node {
            Some(node) => {
                assert!(
                    !node.hash.is_zero(),
                    "main-tree node at level {level} carries the empty hash"
                );
                node.hash
            }
            None => Hash32::zero(),
        };

        let key = index_to_key(index);
        match self.tree.record_mut_by_key(level, &key) {
            Some(prev) => {
                if !prev.is_new && is_new {
                    assert!(
                        prev.hash.is_zero(),
                        "non-empty proof node at level {level} promoted to new"
                    );
                    prev.is_new = true;
                }
                prev.hash = node_hash;
            }
            None => {
                assert!(
                    !(node.is_none() && is_new),
                    "absent node added to the proof as new"
                );
                assert!(
                    !(node_hash.is_zero() && is_new),
                    "empty-hash node added to the proof as new"
                );
                self.tree.insert_raw(
                    level,
                    key,
                    NodeRecord {
                        hash: node_hash,
                        is_new,
                    },
                );
            }
        }
    }

    /// Remove ancestors made redundant by their recorded descendants.
    ///
    /// Incremental recording adds siblings uniformly above each insertion's
    /// intersection, so across a batch the proof accumulates nodes whose
    /// value a verifier can recompute from other recorded nodes below them.
    /// For every node, every strict ancestor is deleted; what survives is an
    /// antichain under the ancestor relation. Deletions only ever touch
    /// levels above the node being walked, so the leaves of each walk stay
    /// intact. Panics if compression empties the proof.
    pub fn compress(&mut self) {
        for level in (0..TREE_LEVELS).rev() {
            let starts: Vec<[u8; NODE_INDEX_LEN]> =
                self.tree.iter_level(level).map(|(key, _)| *key).collect();
            for key in starts {
                for step in PathWalk::from_key(level, &key) {
                    if step.level == level {
                        continue;
                    }
                    self.tree.remove_by_uint(step.level, &step.index);
                }
            }
        }

        assert!(
            self.node_count() > 0,
            "compression emptied the proof tree"
        );
    }

    /// Check this proof against the root hashes captured before and after
    /// the batch.
    ///
    /// Folds the proof twice: once with new nodes treated as empty (must
    /// reproduce `old_root`) and once verbatim (must reproduce `new_root`).
    pub fn verify(&self, old_root: &Hash32, new_root: &Hash32) -> bool {
        let h_old = self.fold(0, &BigUint::zero(), true);
        if h_old != *old_root {
            log::debug!("append-only proof rejected: old root mismatch ({h_old} != {old_root})");
            return false;
        }

        let h_new = self.fold(0, &BigUint::zero(), false);
        if h_new != *new_root {
            log::debug!("append-only proof rejected: new root mismatch ({h_new} != {new_root})");
            return false;
        }

        true
    }

    /// Recursively reduce the proof subtree at `(level, index)` to a hash.
    ///
    /// A recorded node terminates the descent: its pre-batch value (the
    /// empty hash if it is new) or its recorded hash, depending on the
    /// fold. An unrecorded interior position recurses into both children.
    /// Reaching the leaf level on an unrecorded position means the proof
    /// lost a node the descent depends on; compression guarantees a
    /// well-formed proof terminates earlier, so that is fatal.
    fn fold(&self, level: usize, index: &BigUint, treat_new_as_empty: bool) -> Hash32 {
        if let Some(node) = self.tree.record_by_uint(level, index) {
            if treat_new_as_empty && node.is_new {
                return Hash32::zero();
            }
            return node.hash;
        }

        assert!(
            level < LEAF_LEVEL,
            "proof descent reached an unrecorded leaf position"
        );

        let (left, right) = child_indices(index);
        let left_hash = self.fold(level + 1, &left, treat_new_as_empty);
        let right_hash = self.fold(level + 1, &right, treat_new_as_empty);
        merkle_hash(&left_hash, &right_hash)
    }
}

/// Check an append-only proof against the two root hashes.
///
/// Free-function form of [`ProofTree::verify`].
pub fn verify_append_only_proof(
    proof: &ProofTree,
    old_root: &Hash32,
    new_root: &Hash32,
) -> bool {
    proof.verify(old_root, new_root)
}
