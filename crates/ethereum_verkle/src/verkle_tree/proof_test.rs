use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::crypto::committer::VectorCommitter;
use crate::crypto::errors::CryptoError;
use crate::test_utils::{key_of, MockCommitter};
use crate::verkle_tree::proof::{verify_pre_state, PreStateProof};
use crate::verkle_tree::types::TrieValue;

#[test]
fn forwards_the_witness_to_the_primitive() {
    let committer = MockCommitter;
    let root = committer.commit_sparse(&[]).unwrap();
    let proof = PreStateProof {
        keys: vec![key_of(&[1], 0), key_of(&[1], 1)],
        current_values: vec![Some(TrieValue::from_u64(5)), None],
        ..Default::default()
    };

    assert_eq!(verify_pre_state(&committer, &proof, &root), Ok(true));
}

#[test]
fn mismatched_witness_arrays_fail_verification() {
    let committer = MockCommitter;
    let root = committer.commit_sparse(&[]).unwrap();
    let proof = PreStateProof {
        keys: vec![key_of(&[1], 0)],
        current_values: Vec::new(),
        ..Default::default()
    };

    assert_eq!(verify_pre_state(&committer, &proof, &root), Ok(false));
}

#[test]
fn a_corrupt_pre_state_root_is_a_crypto_error() {
    let committer = MockCommitter;
    let mut root = committer.commit_sparse(&[]).unwrap();
    root.0[63] ^= 1;

    assert_matches!(
        verify_pre_state(&committer, &PreStateProof::default(), &root),
        Err(CryptoError::NotOnCurve)
    );
}
