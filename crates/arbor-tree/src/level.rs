//! Per-level sparse node storage.
//!
//! Each level maps a node's fixed-width 32-byte local index to its record.
//! A missing key *is* the representation of an empty subtree; entries that
//! would carry the empty hash are never stored in the main tree. Iteration
//! order is unspecified and callers must not depend on it.

use arbor_core::{Hash32, NODE_INDEX_LEN};
use hashbrown::HashMap;

/// One materialized node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    /// The node's Merkle hash: `H(left, right)` at interior levels, the
    /// supplied data hash at the leaf level.
    pub hash: Hash32,
    /// In the main tree: first materialized during the current batch while
    /// proof construction is active. In a proof tree: absent from the main
    /// tree at the batch's start.
    pub is_new: bool,
}

impl NodeRecord {
    /// A record carrying `hash` with the `is_new` flag clear.
    pub fn existing(hash: Hash32) -> Self {
        Self {
            hash,
            is_new: false,
        }
    }
}

/// Sparse storage for one tree level.
#[derive(Clone, Debug)]
pub(crate) struct TreeLevel {
    num: usize,
    nodes: HashMap<[u8; NODE_INDEX_LEN], NodeRecord>,
}

impl TreeLevel {
    pub(crate) fn new(num: usize) -> Self {
        Self {
            num,
            nodes: HashMap::new(),
        }
    }

    pub(crate) fn num(&self) -> usize {
        self.num
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains(&self, key: &[u8; NODE_INDEX_LEN]) -> bool {
        self.nodes.contains_key(key)
    }

    pub(crate) fn get(&self, key: &[u8; NODE_INDEX_LEN]) -> Option<&NodeRecord> {
        self.nodes.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &[u8; NODE_INDEX_LEN]) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(key)
    }

    pub(crate) fn insert(&mut self, key: [u8; NODE_INDEX_LEN], record: NodeRecord) {
        self.nodes.insert(key, record);
    }

    pub(crate) fn get_or_insert_with(
        &mut self,
        key: [u8; NODE_INDEX_LEN],
        default: impl FnOnce() -> NodeRecord,
    ) -> &mut NodeRecord {
        self.nodes.entry(key).or_insert_with(default)
    }

    pub(crate) fn remove(&mut self, key: &[u8; NODE_INDEX_LEN]) -> Option<NodeRecord> {
        self.nodes.remove(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&[u8; NODE_INDEX_LEN], &NodeRecord)> {
        self.nodes.iter()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }
}
