//! Stem derivation: maps an (address, tree index) pair to the 31-byte stem
//! its keys live under.
//!
//! The derivation commits the 5-scalar vector
//! `[domain, address_low, address_high, index_low, index_high]` and takes
//! the first 31 bytes of the commitment's scalar projection. Two caches make
//! this tractable at block-processing rates: a stem cache over the full
//! input pair, and an address cache holding the partial commitment of the 3
//! address-dependent scalars, so a fresh index costs one 2-slot
//! `commit_update`.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use ethereum_verkle_storage::cache::{ComputeCache, LruComputeCache, NoOpCache};

use crate::config::VerkleTrieConfig;
use crate::crypto::committer::VectorCommitter;
use crate::crypto::errors::{CryptoError, CryptoResult};
use crate::crypto::types::{Commitment, CommitmentDelta, Scalar};
use crate::verkle_tree::types::{Address, Stem, TreeIndex, STEM_BYTES};

#[cfg(test)]
#[path = "stem_hasher_test.rs"]
mod stem_hasher_test;

/// Domain separator committed at slot 0 of the derivation vector.
pub const STEM_DOMAIN_SCALAR: u64 = 2 + 256 * 64;

const DOMAIN_SLOT: u8 = 0;
const ADDRESS_LOW_SLOT: u8 = 1;
const ADDRESS_HIGH_SLOT: u8 = 2;
const INDEX_LOW_SLOT: u8 = 3;
const INDEX_HIGH_SLOT: u8 = 4;

pub type StemCacheKey = (Address, TreeIndex);

/// Cache over full (address, index) derivations. The hot path.
pub type StemCache = dyn ComputeCache<StemCacheKey, Stem, CryptoError>;

/// Cache over the address-dependent partial commitment.
pub type AddressCommitmentCache = dyn ComputeCache<Address, Commitment, CryptoError>;

#[derive(Debug)]
pub struct StemHasher<C: VectorCommitter> {
    committer: C,
    stem_cache: Box<StemCache>,
    address_cache: Box<AddressCommitmentCache>,
}

impl<C: VectorCommitter> StemHasher<C> {
    /// Builds a hasher with per-instance LRU caches sized by the config; a
    /// zero capacity disables that cache.
    pub fn new(committer: C, config: &VerkleTrieConfig) -> Self {
        let stem_cache: Box<StemCache> = match NonZeroUsize::new(config.stem_cache_capacity) {
            Some(capacity) => Box::new(LruComputeCache::new(capacity)),
            None => Box::new(NoOpCache),
        };
        let address_cache: Box<AddressCommitmentCache> =
            match NonZeroUsize::new(config.address_cache_capacity) {
                Some(capacity) => Box::new(LruComputeCache::new(capacity)),
                None => Box::new(NoOpCache),
            };
        Self::with_caches(committer, stem_cache, address_cache)
    }

    /// Builds a hasher over caller-supplied caches, e.g. shared ones.
    pub fn with_caches(
        committer: C,
        stem_cache: Box<StemCache>,
        address_cache: Box<AddressCommitmentCache>,
    ) -> Self {
        Self { committer, stem_cache, address_cache }
    }

    pub fn committer(&self) -> &C {
        &self.committer
    }

    /// The 31-byte stem for one (address, tree index) pair. Warm and cold
    /// caches produce identical results.
    pub fn stem(&self, address: &Address, index: &TreeIndex) -> CryptoResult<Stem> {
        self.stem_cache.get_or_compute(&(*address, *index), &mut |(address, index)| {
            self.compute_stem(address, index)
        })
    }

    /// Fans the per-address work out across many indices.
    pub fn many_stems(
        &self,
        requests: &BTreeMap<Address, Vec<TreeIndex>>,
    ) -> CryptoResult<BTreeMap<Address, Vec<Stem>>> {
        let mut stems = BTreeMap::new();
        for (address, indices) in requests {
            let per_address = indices
                .iter()
                .map(|index| self.stem(address, index))
                .collect::<CryptoResult<Vec<_>>>()?;
            stems.insert(*address, per_address);
        }
        Ok(stems)
    }

    fn compute_stem(&self, address: &Address, index: &TreeIndex) -> CryptoResult<Stem> {
        let partial = self
            .address_cache
            .get_or_compute(address, &mut |address| self.address_commitment(address))?;
        let (index_low, index_high) = index_scalars(index);
        let commitment = self.committer.commit_update(
            &partial,
            &[
                CommitmentDelta { index: INDEX_LOW_SLOT, old: Scalar::ZERO, new: index_low },
                CommitmentDelta { index: INDEX_HIGH_SLOT, old: Scalar::ZERO, new: index_high },
            ],
        )?;
        let scalar = self.committer.scalar_of(&commitment)?;
        let mut stem = [0; STEM_BYTES];
        stem.copy_from_slice(&scalar.0[..STEM_BYTES]);
        Ok(Stem(stem))
    }

    /// The contribution of the 3 address-dependent scalars, with both index
    /// slots still zero.
    fn address_commitment(&self, address: &Address) -> CryptoResult<Commitment> {
        let (address_low, address_high) = address_scalars(address);
        self.committer.commit_sparse(&[
            (DOMAIN_SLOT, Scalar::from(STEM_DOMAIN_SCALAR)),
            (ADDRESS_LOW_SLOT, address_low),
            (ADDRESS_HIGH_SLOT, address_high),
        ])
    }
}

/// Widens a 16-byte half into a little-endian scalar.
fn half_scalar(bytes: &[u8]) -> Scalar {
    let mut out = [0; 32];
    out[..bytes.len()].copy_from_slice(bytes);
    Scalar(out)
}

/// The address zero-extended to 32 bytes and split into 16-byte halves.
pub(crate) fn address_scalars(address: &Address) -> (Scalar, Scalar) {
    let mut widened = [0; 32];
    widened[..address.0.len()].copy_from_slice(&address.0);
    (half_scalar(&widened[..16]), half_scalar(&widened[16..]))
}

/// The tree index split into its low and high 16-byte halves.
pub(crate) fn index_scalars(index: &TreeIndex) -> (Scalar, Scalar) {
    (half_scalar(&index.0[..16]), half_scalar(&index.0[16..]))
}
