use std::fmt;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::errors::StorageResult;

/// Storage key of a stored trie node: the node's location bytes. Internal
/// nodes are keyed by their location prefix, stem nodes by their full 31-byte
/// stem, the root by the empty key.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DbKey(pub Vec<u8>);

impl fmt::Display for DbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DbValue(pub Vec<u8>);

/// Integrity cross-check accompanying a node read or write. Redundant to the
/// location in a consistent store; implementations may ignore it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeHash(pub [u8; 32]);

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Node-loader and node-writer over the backing key-value store.
pub trait Storage: Debug {
    /// Returns the encoded node stored at `location`, or `None` when the
    /// store has no entry for it. A miss is not an error.
    fn get_node(&self, location: &DbKey, hash: Option<&NodeHash>)
    -> StorageResult<Option<DbValue>>;

    /// Writes the encoded node under its location.
    fn put_node(&mut self, location: DbKey, hash: NodeHash, value: DbValue) -> StorageResult<()>;
}
