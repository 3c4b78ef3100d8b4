//! Tree-geometry constants.

/// Number of levels in the tree, root (level 0) through leaves (level 256).
///
/// The leaf address space is the output space of SHA-256, so the geometry is
/// fixed: 2^256 logical leaves require exactly this many levels.
pub const TREE_LEVELS: usize = 257;

/// Level number of the leaf layer.
pub const LEAF_LEVEL: usize = TREE_LEVELS - 1;

/// Length in bytes of a 32-byte hash.
pub const HASH32_LEN: usize = 32;

/// Length in bytes of a level-local node index.
///
/// Levels near the root need far fewer bits, but indices are stored at a
/// fixed width so one key type covers every level.
pub const NODE_INDEX_LEN: usize = 32;
