//! Test doubles and fixtures.
//!
//! [`MockCommitter`] stands in for the external banderwagon/IPA primitive
//! with additively homomorphic arithmetic in Z/2^256 over fixed
//! index-derived generators. Every algebraic identity the engine relies on
//! holds exactly: delta updates agree with full recommits, disjoint deltas
//! commute, and sparse commits agree with dense ones.

use ethereum_verkle_storage::map_storage::MapStorage;
use ethnum::U256;

use crate::crypto::committer::{PreStateWitness, VectorCommitter};
use crate::crypto::errors::{CryptoError, CryptoResult};
use crate::crypto::types::{
    Commitment, CommitmentDelta, CompressedCommitment, Scalar, COMPRESSED_COMMITMENT_BYTES,
    VERKLE_NODE_WIDTH,
};
use crate::verkle_tree::trie::VerkleTrie;
use crate::verkle_tree::types::{Stem, TrieKey, STEM_BYTES};

const TAG_MULTIPLIER: U256 =
    U256::from_words(0x9E3779B97F4A7C15_D1B54A32D192ED03, 0x8CB92BA72F3D8DD7_C2B2AE3D4F9D55F5);
const TAG_TWEAK: U256 =
    U256::from_words(0x2545F4914F6CDD1D_27D4EB2F165667C5, 0x9E3779B97F4A7C15_85EBCA6B27D4EB2F);
const PROJECTION_MULTIPLIER: U256 =
    U256::from_words(0xC2B2AE3D27D4EB4F_165667B19E3779F9, 0x85EBCA77C2B2AE63_27D4EB2F165667C5);
const PROJECTION_TWEAK: U256 =
    U256::from_words(0x165667B19E3779F9_85EBCA77C2B2AE63, 0xD1B54A32D192ED03_2545F4914F6CDD1D);

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9E3779B97F4A7C15);
    state = (state ^ (state >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    state = (state ^ (state >> 27)).wrapping_mul(0x94D049BB133111EB);
    state ^ (state >> 31)
}

/// A fixed generator per vector index; odd, so scalar multiples are
/// collision-free per slot.
fn generator(index: u8) -> U256 {
    let seed = u64::from(index);
    let low = u128::from(splitmix64(seed.wrapping_mul(4))) << 64
        | u128::from(splitmix64(seed.wrapping_mul(4).wrapping_add(1)));
    let high = u128::from(splitmix64(seed.wrapping_mul(4).wrapping_add(2))) << 64
        | u128::from(splitmix64(seed.wrapping_mul(4).wrapping_add(3)));
    U256::from_words(high, low) | U256::ONE
}

fn tag_of(accumulator: U256) -> U256 {
    accumulator.wrapping_mul(TAG_MULTIPLIER) ^ TAG_TWEAK
}

fn commitment_of(accumulator: U256) -> Commitment {
    let mut bytes = [0; 64];
    bytes[..32].copy_from_slice(&accumulator.to_le_bytes());
    bytes[32..].copy_from_slice(&tag_of(accumulator).to_le_bytes());
    Commitment(bytes)
}

/// Recovers the accumulator, rejecting byte strings that were never
/// produced by the committer.
fn accumulator_of(commitment: &Commitment) -> CryptoResult<U256> {
    let mut accumulator_bytes = [0; 32];
    accumulator_bytes.copy_from_slice(&commitment.0[..32]);
    let mut tag_bytes = [0; 32];
    tag_bytes.copy_from_slice(&commitment.0[32..]);
    let accumulator = U256::from_le_bytes(accumulator_bytes);
    if tag_of(accumulator) != U256::from_le_bytes(tag_bytes) {
        return Err(CryptoError::NotOnCurve);
    }
    Ok(accumulator)
}

fn scalar_term(scalar: &Scalar, index: u8) -> U256 {
    U256::from_le_bytes(scalar.0).wrapping_mul(generator(index))
}

/// Deterministic stand-in for the banderwagon/IPA primitive.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockCommitter;

impl VectorCommitter for MockCommitter {
    fn commit(&self, scalars: &[Scalar; VERKLE_NODE_WIDTH]) -> CryptoResult<Commitment> {
        let mut accumulator = U256::ZERO;
        for (index, scalar) in (0..=u8::MAX).zip(scalars.iter()) {
            accumulator = accumulator.wrapping_add(scalar_term(scalar, index));
        }
        Ok(commitment_of(accumulator))
    }

    fn commit_sparse(&self, pairs: &[(u8, Scalar)]) -> CryptoResult<Commitment> {
        let mut accumulator = U256::ZERO;
        for (index, scalar) in pairs {
            accumulator = accumulator.wrapping_add(scalar_term(scalar, *index));
        }
        Ok(commitment_of(accumulator))
    }

    fn commit_update(
        &self,
        commitment: &Commitment,
        deltas: &[CommitmentDelta],
    ) -> CryptoResult<Commitment> {
        let mut accumulator = accumulator_of(commitment)?;
        for delta in deltas {
            let difference = U256::from_le_bytes(delta.new.0)
                .wrapping_sub(U256::from_le_bytes(delta.old.0));
            accumulator = accumulator.wrapping_add(difference.wrapping_mul(generator(delta.index)));
        }
        Ok(commitment_of(accumulator))
    }

    fn scalar_of(&self, commitment: &Commitment) -> CryptoResult<Scalar> {
        let accumulator = accumulator_of(commitment)?;
        let projected = accumulator.wrapping_mul(PROJECTION_MULTIPLIER) ^ PROJECTION_TWEAK;
        Ok(Scalar(projected.to_le_bytes()))
    }

    fn compress(&self, commitment: &Commitment) -> CryptoResult<CompressedCommitment> {
        let accumulator = accumulator_of(commitment)?;
        let mut bytes = [0; COMPRESSED_COMMITMENT_BYTES];
        bytes.copy_from_slice(&accumulator.to_le_bytes());
        Ok(CompressedCommitment(bytes))
    }

    fn decompress(&self, compressed: &CompressedCommitment) -> CryptoResult<Commitment> {
        Ok(commitment_of(U256::from_le_bytes(compressed.0)))
    }

    fn verify_pre_state(&self, witness: &PreStateWitness) -> CryptoResult<bool> {
        accumulator_of(&witness.pre_state_root)?;
        Ok(witness.keys.len() == witness.current_values.len())
    }
}

/// A stem whose leading bytes are `prefix` and whose tail is zero.
pub fn stem_with_prefix(prefix: &[u8]) -> Stem {
    let mut bytes = [0; STEM_BYTES];
    bytes[..prefix.len()].copy_from_slice(prefix);
    Stem(bytes)
}

/// A key under [`stem_with_prefix`]'s stem.
pub fn key_of(stem_prefix: &[u8], suffix: u8) -> TrieKey {
    TrieKey::from_stem_and_suffix(&stem_with_prefix(stem_prefix), suffix)
}

pub fn new_test_trie() -> VerkleTrie<MapStorage, MockCommitter> {
    VerkleTrie::new(MapStorage::default(), MockCommitter)
        .expect("the mock committer cannot fail to commit")
}
