use crate::verkle_tree::types::{TrieKey, TrieValue};

/// A single key-value pair. The key's first 31 bytes equal the parent stem;
/// its last byte equals the leaf's slot in the stem.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LeafNode {
    pub key: TrieKey,
    pub value: TrieValue,
}

impl LeafNode {
    pub fn new(key: TrieKey, value: TrieValue) -> Self {
        Self { key, value }
    }
}
