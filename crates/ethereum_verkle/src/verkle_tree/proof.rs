//! Stateless facade over the primitive's pre-state proof verification.

use crate::crypto::committer::{PreStateWitness, VectorCommitter};
use crate::crypto::errors::CryptoResult;
use crate::crypto::types::{Commitment, Scalar};
use crate::verkle_tree::types::{Stem, TrieKey, TrieValue};

#[cfg(test)]
#[path = "proof_test.rs"]
mod proof_test;

/// Trie-level view of a pre-state proof, before marshalling to the
/// primitive's ABI.
#[derive(Clone, Debug, Default)]
pub struct PreStateProof {
    pub keys: Vec<TrieKey>,
    pub current_values: Vec<Option<TrieValue>>,
    pub commitments_by_path: Vec<Commitment>,
    pub cl: Vec<Commitment>,
    pub cr: Vec<Commitment>,
    pub other_stems: Vec<Stem>,
    pub d: Commitment,
    pub depths_extension_present: Vec<u8>,
    pub final_evaluation: Scalar,
}

/// Marshals the witness arrays and forwards them to the primitive. Absent
/// current values are rendered as empty byte strings per the ABI.
pub fn verify_pre_state<C: VectorCommitter>(
    committer: &C,
    proof: &PreStateProof,
    pre_state_root: &Commitment,
) -> CryptoResult<bool> {
    let witness = PreStateWitness {
        keys: proof.keys.iter().map(|key| key.0).collect(),
        current_values: proof
            .current_values
            .iter()
            .map(|value| value.map_or_else(Vec::new, |value| value.0.to_vec()))
            .collect(),
        commitments_by_path: proof.commitments_by_path.clone(),
        cl: proof.cl.clone(),
        cr: proof.cr.clone(),
        other_stems: proof.other_stems.iter().map(|stem| stem.0).collect(),
        d: proof.d,
        depths_extension_present: proof.depths_extension_present.clone(),
        final_evaluation: proof.final_evaluation,
        pre_state_root: *pre_state_root,
    };
    committer.verify_pre_state(&witness)
}
