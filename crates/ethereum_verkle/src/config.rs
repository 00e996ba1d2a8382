use serde::{Deserialize, Serialize};

/// Tuning knobs for trie construction. The cache capacities bound the stem
/// hasher's two LRU caches; a capacity of zero disables that cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct VerkleTrieConfig {
    pub stem_cache_capacity: usize,
    pub address_cache_capacity: usize,
}

impl Default for VerkleTrieConfig {
    fn default() -> Self {
        Self { stem_cache_capacity: 1 << 16, address_cache_capacity: 1 << 12 }
    }
}
