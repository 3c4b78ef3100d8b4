//! Canonical value types for arbor.
//!
//! This module defines the two 32-byte primitives the whole system is built
//! on: `Hash32` (a SHA-256 digest) and `NodeIndex` (a level-local node
//! number). They share a representation but not a meaning, so they are kept
//! as distinct newtypes.

use crate::constants::*;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors related to parsing or construction of core value types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Hex string had an unexpected byte length.
    #[error("invalid hex length: expected {expected} bytes, got {got} bytes")]
    InvalidHexLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        got: usize,
    },

    /// Hex decoding failed.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Fixed-size 32-byte hash used throughout the tree.
///
/// The all-zero value is the *empty hash*: the sentinel for a non-existent
/// subtree. It is never produced by SHA-256 on any known input, which is the
/// same collision-resistance assumption the dictionary already makes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hash32(pub [u8; HASH32_LEN]);

impl Hash32 {
    /// Returns the empty hash (all zeros).
    pub const fn zero() -> Self {
        Self([0u8; HASH32_LEN])
    }

    /// Returns the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; HASH32_LEN] {
        &self.0
    }

    /// Returns `true` if this is the empty hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH32_LEN]
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; HASH32_LEN]> for Hash32 {
    fn from(value: [u8; HASH32_LEN]) -> Self {
        Self(value)
    }
}

impl From<Hash32> for [u8; HASH32_LEN] {
    fn from(value: Hash32) -> Self {
        value.0
    }
}

impl FromStr for Hash32 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != HASH32_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: HASH32_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH32_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// A node's level-local number (LN) as a big-endian 256-bit integer.
///
/// At level `l` the valid range is `0..2^l`; the width is fixed at 32 bytes
/// so one key type covers every level, padded with leading zeros. At the
/// leaf level the index *is* the 256-bit leaf address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeIndex(pub [u8; NODE_INDEX_LEN]);

impl NodeIndex {
    /// Returns the all-zero index: the root's LN, also the leftmost leaf.
    pub const fn zero() -> Self {
        Self([0u8; NODE_INDEX_LEN])
    }

    /// Returns the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; NODE_INDEX_LEN] {
        &self.0
    }
}

impl fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeIndex({})", hex::encode(self.0))
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; NODE_INDEX_LEN]> for NodeIndex {
    fn from(value: [u8; NODE_INDEX_LEN]) -> Self {
        Self(value)
    }
}

impl From<NodeIndex> for [u8; NODE_INDEX_LEN] {
    fn from(value: NodeIndex) -> Self {
        value.0
    }
}

impl FromStr for NodeIndex {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != NODE_INDEX_LEN {
            return Err(CoreError::InvalidHexLength {
                expected: NODE_INDEX_LEN,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; NODE_INDEX_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

/// A leaf's 256-bit address is its LN at the leaf level.
pub type LeafIndex = NodeIndex;
