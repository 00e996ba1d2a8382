//! The Ethereum account key schedule: where each piece of account state
//! lives in the unified trie.
//!
//! Every account's header fields share the stem of tree index 0; storage
//! slots below the code offset pack into that header stem too, while larger
//! slots and code chunks spread across further tree indices.

use ethnum::U256;

use crate::crypto::committer::VectorCommitter;
use crate::crypto::errors::CryptoResult;
use crate::verkle_tree::stem_hasher::StemHasher;
use crate::verkle_tree::types::{Address, TreeIndex, TrieKey};

#[cfg(test)]
#[path = "trie_key_test.rs"]
mod trie_key_test;

pub const VERSION_LEAF_KEY: u8 = 0;
pub const BALANCE_LEAF_KEY: u8 = 1;
pub const NONCE_LEAF_KEY: u8 = 2;
pub const CODE_KECCAK_LEAF_KEY: u8 = 3;
pub const CODE_SIZE_LEAF_KEY: u8 = 4;

/// First header suffix reserved for small storage slots.
pub const HEADER_STORAGE_OFFSET: u64 = 64;
/// First tree position of code chunks.
pub const CODE_OFFSET: u64 = 128;

/// First tree position of main (non-header) storage: 256^31.
pub fn main_storage_offset() -> U256 {
    U256::ONE << 248
}

/// Derives complete 32-byte trie keys for an account's state.
#[derive(Debug)]
pub struct TrieKeyAdapter<C: VectorCommitter> {
    hasher: StemHasher<C>,
}

impl<C: VectorCommitter> TrieKeyAdapter<C> {
    pub fn new(hasher: StemHasher<C>) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &StemHasher<C> {
        &self.hasher
    }

    pub fn version_key(&self, address: &Address) -> CryptoResult<TrieKey> {
        self.header_key(address, VERSION_LEAF_KEY)
    }

    pub fn balance_key(&self, address: &Address) -> CryptoResult<TrieKey> {
        self.header_key(address, BALANCE_LEAF_KEY)
    }

    pub fn nonce_key(&self, address: &Address) -> CryptoResult<TrieKey> {
        self.header_key(address, NONCE_LEAF_KEY)
    }

    pub fn code_keccak_key(&self, address: &Address) -> CryptoResult<TrieKey> {
        self.header_key(address, CODE_KECCAK_LEAF_KEY)
    }

    pub fn code_size_key(&self, address: &Address) -> CryptoResult<TrieKey> {
        self.header_key(address, CODE_SIZE_LEAF_KEY)
    }

    /// The key of a contract storage slot. Slots below
    /// `CODE_OFFSET - HEADER_STORAGE_OFFSET` pack into the account header;
    /// the rest live past the main storage offset.
    pub fn storage_key(&self, address: &Address, slot: U256) -> CryptoResult<TrieKey> {
        let header_span = U256::from(CODE_OFFSET - HEADER_STORAGE_OFFSET);
        let position = if slot < header_span {
            U256::from(HEADER_STORAGE_OFFSET) + slot
        } else {
            main_storage_offset() + slot
        };
        self.key_at_position(address, position)
    }

    /// The key of the `chunk`-th 31-byte code chunk.
    pub fn code_chunk_key(&self, address: &Address, chunk: U256) -> CryptoResult<TrieKey> {
        self.key_at_position(address, U256::from(CODE_OFFSET) + chunk)
    }

    fn header_key(&self, address: &Address, suffix: u8) -> CryptoResult<TrieKey> {
        let stem = self.hasher.stem(address, &TreeIndex::default())?;
        Ok(TrieKey::from_stem_and_suffix(&stem, suffix))
    }

    /// Splits an absolute tree position into (tree index, suffix) and
    /// derives the key.
    fn key_at_position(&self, address: &Address, position: U256) -> CryptoResult<TrieKey> {
        let suffix = position.to_le_bytes()[0];
        let index = TreeIndex((position >> 8u32).to_le_bytes());
        let stem = self.hasher.stem(address, &index)?;
        Ok(TrieKey::from_stem_and_suffix(&stem, suffix))
    }
}
