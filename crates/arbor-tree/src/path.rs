//! Path arithmetic over level-local node indices.
//!
//! Ancestry in a fixed-height binary tree is pure arithmetic: for a node
//! with local number `n` at level `l > 0`, the parent's local number at
//! level `l - 1` is `n / 2`, the sibling's is `n ^ 1`, and `n` is a left
//! child iff its least significant bit is 0. No parent pointers are stored
//! anywhere; the leaf-to-root walk below is the only traversal the
//! algorithms need.

use arbor_core::{NODE_INDEX_LEN, TREE_LEVELS};
use num_bigint::BigUint;

/// Parent's local index at the level above: `n / 2`.
pub fn parent_index(n: &BigUint) -> BigUint {
    n >> 1u32
}

/// Sibling's local index at the same level, plus whether `n` is a left
/// child.
pub fn sibling_index(n: &BigUint) -> (BigUint, bool) {
    let is_left = !n.bit(0);
    let sibling = if is_left { n + 1u32 } else { n - 1u32 };
    (sibling, is_left)
}

/// Local indices of the two children at the level below: `(2n, 2n + 1)`.
pub fn child_indices(n: &BigUint) -> (BigUint, BigUint) {
    let left = n << 1u32;
    let right = &left + 1u32;
    (left, right)
}

/// Encode a local index as a fixed-width 32-byte big-endian key.
///
/// Panics if the integer does not fit in 32 bytes; local indices never
/// exceed 2^256 - 1 in a 257-level tree.
pub fn index_to_key(n: &BigUint) -> [u8; NODE_INDEX_LEN] {
    let bytes = n.to_bytes_be();
    assert!(
        bytes.len() <= NODE_INDEX_LEN,
        "local node index wider than {NODE_INDEX_LEN} bytes: {} bytes",
        bytes.len()
    );
    let mut key = [0u8; NODE_INDEX_LEN];
    key[NODE_INDEX_LEN - bytes.len()..].copy_from_slice(&bytes);
    key
}

/// Decode a fixed-width 32-byte big-endian key back into a local index.
pub fn key_to_index(key: &[u8; NODE_INDEX_LEN]) -> BigUint {
    BigUint::from_bytes_be(key)
}

/// One step of a leaf-to-root walk.
#[derive(Clone, Debug)]
pub struct PathStep {
    /// Level of the visited node.
    pub level: usize,
    /// The visited node's local index.
    pub index: BigUint,
    /// The sibling's local index at the same level.
    pub sibling: BigUint,
    /// Whether the visited node is a left child. At level 0 this reports on
    /// the root's LSB and is not meaningful.
    pub is_left: bool,
}

/// Iterator walking from a node up to the root, one level at a time.
///
/// Yields [`PathStep`]s in strict ascending order toward level 0; a walk
/// started at the leaf level yields exactly [`TREE_LEVELS`] steps. The
/// strict order is a correctness requirement for insertion: each interior
/// hash is computed from already-updated children.
pub struct PathWalk {
    level: usize,
    index: BigUint,
    exhausted: bool,
}

impl PathWalk {
    /// Start a walk at `(level, index)`.
    ///
    /// Panics if `level` lies below the leaf level.
    pub fn new(level: usize, index: BigUint) -> Self {
        assert!(level < TREE_LEVELS, "walk started below the leaf level: {level}");
        Self {
            level,
            index,
            exhausted: false,
        }
    }

    /// Start a walk from a 32-byte index key.
    pub fn from_key(level: usize, key: &[u8; NODE_INDEX_LEN]) -> Self {
        Self::new(level, key_to_index(key))
    }
}

impl Iterator for PathWalk {
    type Item = PathStep;

    fn next(&mut self) -> Option<PathStep> {
        if self.exhausted {
            return None;
        }
        let index = self.index.clone();
        let (sibling, is_left) = sibling_index(&index);
        let step = PathStep {
            level: self.level,
            index,
            sibling,
            is_left,
        };
        if self.level == 0 {
            self.exhausted = true;
        } else {
            self.level -= 1;
            self.index = parent_index(&self.index);
        }
        Some(step)
    }
}
