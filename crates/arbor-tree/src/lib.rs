#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Arbor tree: the append-only sparse Merkle prefix tree.
//!
//! Responsibilities:
//! - Path arithmetic over 256-bit local node indices
//! - Sparse per-level node storage (absence = emptiness)
//! - Batched insertion with leaf-to-root hash recomputation
//! - Incremental append-only proof construction, compression, verification
//!
//! The tree has 257 levels (root at level 0, leaves at level 256) and 2^256
//! logical leaves; only materialized nodes consume memory. All internal
//! invariants are asserted and violations are fatal, as befits an
//! experimental measurement tool. The only recoverable errors are
//! [`TreeError::DuplicateLeaf`] and [`TreeError::EmptyTree`].

pub mod error;
pub mod level;
pub mod path;
pub mod proof;
pub mod tree;

pub use error::*;
pub use level::*;
pub use path::*;
pub use proof::*;
pub use tree::*;
