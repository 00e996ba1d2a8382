use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::errors::{CryptoError, CryptoResult};

/// Fan-out of the trie and width of the committed vectors.
pub const VERKLE_NODE_WIDTH: usize = 256;

pub const SCALAR_BYTES: usize = 32;
pub const COMMITMENT_BYTES: usize = 64;
pub const COMPRESSED_COMMITMENT_BYTES: usize = 32;

/// A 32-byte little-endian scalar-field element.
#[derive(
    Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct Scalar(pub [u8; SCALAR_BYTES]);

impl Scalar {
    pub const ZERO: Self = Self([0; SCALAR_BYTES]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0; SCALAR_BYTES]
    }

    /// Widens up to 32 little-endian bytes into a scalar, zero-padding the
    /// high-order bytes.
    pub fn from_le_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() > SCALAR_BYTES {
            return Err(CryptoError::InvalidLength {
                kind: "scalar",
                expected: SCALAR_BYTES,
                actual: bytes.len(),
            });
        }
        let mut out = [0; SCALAR_BYTES];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(out))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        let mut out = [0; SCALAR_BYTES];
        out[..8].copy_from_slice(&value.to_le_bytes());
        Self(out)
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A 64-byte uncompressed curve point binding a vector of
/// [`VERKLE_NODE_WIDTH`] scalars.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Commitment(pub [u8; COMMITMENT_BYTES]);

impl Commitment {
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; COMMITMENT_BYTES] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                kind: "commitment",
                expected: COMMITMENT_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl Default for Commitment {
    fn default() -> Self {
        Self([0; COMMITMENT_BYTES])
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment(0x{})", hex::encode(self.0))
    }
}

/// The 32-byte compressed form of a [`Commitment`].
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CompressedCommitment(pub [u8; COMPRESSED_COMMITMENT_BYTES]);

impl fmt::Debug for CompressedCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedCommitment(0x{})", hex::encode(self.0))
    }
}

/// A single-slot commitment adjustment: the scalar previously committed at
/// `index` and the scalar replacing it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CommitmentDelta {
    pub index: u8,
    pub old: Scalar,
    pub new: Scalar,
}
