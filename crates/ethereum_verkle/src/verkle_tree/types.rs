use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::types::Scalar;
use crate::verkle_tree::errors::VerkleTrieError;

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

pub const KEY_BYTES: usize = 32;
pub const STEM_BYTES: usize = 31;
pub const VALUE_BYTES: usize = 32;
pub const ADDRESS_BYTES: usize = 20;

/// A full 32-byte trie key: a 31-byte [`Stem`] followed by a one-byte suffix
/// selecting a slot within the stem.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct TrieKey(pub [u8; KEY_BYTES]);

impl TrieKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerkleTrieError> {
        let bytes: [u8; KEY_BYTES] =
            bytes.try_into().map_err(|_| VerkleTrieError::KeyLengthInvalid(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn from_stem_and_suffix(stem: &Stem, suffix: u8) -> Self {
        let mut bytes = [0; KEY_BYTES];
        bytes[..STEM_BYTES].copy_from_slice(&stem.0);
        bytes[STEM_BYTES] = suffix;
        Self(bytes)
    }

    pub fn stem(&self) -> Stem {
        let mut stem = [0; STEM_BYTES];
        stem.copy_from_slice(&self.0[..STEM_BYTES]);
        Stem(stem)
    }

    pub fn suffix(&self) -> u8 {
        self.0[STEM_BYTES]
    }

    pub fn byte(&self, depth: usize) -> u8 {
        self.0[depth]
    }
}

impl fmt::Debug for TrieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrieKey(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for TrieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A 32-byte trie value.
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct TrieValue(pub [u8; VALUE_BYTES]);

impl TrieValue {
    pub const ZERO: Self = Self([0; VALUE_BYTES]);

    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerkleTrieError> {
        let bytes: [u8; VALUE_BYTES] =
            bytes.try_into().map_err(|_| VerkleTrieError::ValueLengthInvalid(bytes.len()))?;
        Ok(Self(bytes))
    }

    /// Little-endian widening of a small integer, handy in tests and leaf
    /// field packing.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0; VALUE_BYTES];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for TrieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrieValue(0x{})", hex::encode(self.0))
    }
}

/// The 31-byte key prefix identifying a group of up to 256 sibling leaves.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct Stem(pub [u8; STEM_BYTES]);

impl Stem {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        Some(Self(bytes.try_into().ok()?))
    }

    pub fn byte(&self, depth: usize) -> u8 {
        self.0[depth]
    }

    /// The first byte index at which the two stems differ, or `None` for
    /// equal stems.
    pub fn first_divergence(&self, other: &Stem) -> Option<usize> {
        self.0.iter().zip(other.0.iter()).position(|(own, others)| own != others)
    }

    /// The location of a node holding this stem at the given depth.
    pub fn prefix(&self, depth: usize) -> NodeLocation {
        NodeLocation::new(self.0[..depth].to_vec())
    }

    /// The stem interpreted as a little-endian scalar.
    pub fn to_scalar(&self) -> Scalar {
        let mut bytes = [0; 32];
        bytes[..STEM_BYTES].copy_from_slice(&self.0);
        Scalar(bytes)
    }
}

impl fmt::Debug for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stem(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A 20-byte Ethereum account address.
#[derive(
    Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct Address(pub [u8; ADDRESS_BYTES]);

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(self.0))
    }
}

/// A 32-byte locator within an account's storage, input to stem derivation.
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct TreeIndex(pub [u8; 32]);

impl TreeIndex {
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeIndex(0x{})", hex::encode(self.0))
    }
}

/// A node's position in the trie: the first `depth` bytes of the stems below
/// it. Empty for the root.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeLocation(Vec<u8>);

impl NodeLocation {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// The location of the child at the given slot.
    pub fn child(&self, slot: u8) -> Self {
        let mut bytes = Vec::with_capacity(self.0.len() + 1);
        bytes.extend_from_slice(&self.0);
        bytes.push(slot);
        Self(bytes)
    }
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "0x{}", hex::encode(&self.0))
        }
    }
}

impl From<&[u8]> for NodeLocation {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}
