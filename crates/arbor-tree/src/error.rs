//! Tree operation errors.

use arbor_core::LeafIndex;
use thiserror::Error;

/// Errors returned by tree operations.
///
/// Internal invariant violations are not represented here; they panic, which
/// is fatal by design. Verification failure is likewise not an error but a
/// `false` return from the verifier.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Insertion of a leaf address that is already occupied.
    ///
    /// Detected before any mutation; the tree is unchanged when this is
    /// returned.
    #[error("leaf {0} already present at the leaf level")]
    DuplicateLeaf(LeafIndex),

    /// Root hash requested from a tree with no materialized root.
    #[error("tree has no root node")]
    EmptyTree,
}
