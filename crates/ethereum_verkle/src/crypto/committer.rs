use std::fmt::Debug;

use crate::crypto::errors::CryptoResult;
use crate::crypto::types::{
    Commitment, CommitmentDelta, CompressedCommitment, Scalar, VERKLE_NODE_WIDTH,
};

#[cfg(test)]
#[path = "committer_test.rs"]
mod committer_test;

/// Witness arrays for pre-state proof verification, in the shape the
/// primitive's ABI expects. Absent current values are empty byte strings.
#[derive(Clone, Debug, Default)]
pub struct PreStateWitness {
    pub keys: Vec<[u8; 32]>,
    pub current_values: Vec<Vec<u8>>,
    pub commitments_by_path: Vec<Commitment>,
    pub cl: Vec<Commitment>,
    pub cr: Vec<Commitment>,
    pub other_stems: Vec<[u8; 31]>,
    pub d: Commitment,
    pub depths_extension_present: Vec<u8>,
    pub final_evaluation: Scalar,
    pub pre_state_root: Commitment,
}

/// Typed facade over the external banderwagon/IPA vector-commitment
/// primitive. All byte strings are little-endian; commitments are 64 bytes
/// uncompressed and 32 bytes compressed, scalars 32 bytes.
///
/// Errors surface as [`crate::crypto::errors::CryptoError`] and are never
/// recovered inside this crate.
pub trait VectorCommitter: Debug {
    /// Vector commitment over a dense vector of [`VERKLE_NODE_WIDTH`]
    /// scalars.
    fn commit(&self, scalars: &[Scalar; VERKLE_NODE_WIDTH]) -> CryptoResult<Commitment>;

    /// Sparse form of [`Self::commit`]: indices not supplied commit to zero.
    fn commit_sparse(&self, pairs: &[(u8, Scalar)]) -> CryptoResult<Commitment>;

    /// Adjusts a commitment by per-index scalar deltas, returning
    /// `C + Σ (new - old)·gᵢ`.
    fn commit_update(
        &self,
        commitment: &Commitment,
        deltas: &[CommitmentDelta],
    ) -> CryptoResult<Commitment>;

    /// Projects a curve point to its scalar-field hash. Not injective.
    fn scalar_of(&self, commitment: &Commitment) -> CryptoResult<Scalar>;

    /// Batched form of [`Self::scalar_of`].
    fn scalars_of(&self, commitments: &[Commitment]) -> CryptoResult<Vec<Scalar>> {
        commitments.iter().map(|commitment| self.scalar_of(commitment)).collect()
    }

    fn compress(&self, commitment: &Commitment) -> CryptoResult<CompressedCommitment>;

    fn decompress(&self, compressed: &CompressedCommitment) -> CryptoResult<Commitment>;

    /// Verifies a pre-state proof against the given witness arrays.
    fn verify_pre_state(&self, witness: &PreStateWitness) -> CryptoResult<bool>;
}
