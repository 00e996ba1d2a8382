use ethereum_verkle_storage::storage_trait::{DbKey, DbValue, NodeHash, Storage};
use tracing::debug;

use crate::crypto::types::Scalar;
use crate::verkle_tree::errors::{VerkleTrieError, VerkleTrieResult};
use crate::verkle_tree::node::{
    InternalNode, StemNode, StoredInternalNode, StoredStemNode, VerkleNode,
};
use crate::verkle_tree::node_serde;
use crate::verkle_tree::types::{NodeLocation, Stem, KEY_BYTES, STEM_BYTES};

#[cfg(test)]
#[path = "node_factory_test.rs"]
mod node_factory_test;

/// Reads and writes trie nodes through the backing store, identifying the
/// node kind by location length: empty for the root, 1..=30 bytes for
/// internal nodes, 31 (the full stem) for stems, 32 (the full key) for
/// leaves.
#[derive(Debug)]
pub struct NodeFactory<S: Storage> {
    storage: S,
}

impl<S: Storage> NodeFactory<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Reconstructs the node stored at `location`. A miss in the backing
    /// store is `Ok(None)`, not an error. `hash` is the scalar the parent
    /// committed for the node; it doubles as the storage integrity
    /// cross-check.
    pub fn retrieve(
        &self,
        location: &NodeLocation,
        hash: Option<&Scalar>,
    ) -> VerkleTrieResult<Option<VerkleNode>> {
        let db_key = DbKey(location.as_slice().to_vec());
        let db_hash = hash.map(|hash| NodeHash(hash.0));
        let Some(DbValue(bytes)) = self.storage.get_node(&db_key, db_hash.as_ref())? else {
            return Ok(None);
        };

        let node = match location.len() {
            0 => VerkleNode::Root(Box::new(node_serde::decode_root(location, &bytes)?)),
            len if len <= node_serde::MAX_INTERNAL_LOCATION => {
                let hash = self.required_hash(location, hash)?;
                VerkleNode::Internal(Box::new(node_serde::decode_internal(
                    location, hash, &bytes,
                )?))
            }
            STEM_BYTES => {
                let stem = Stem::from_slice(location.as_slice()).ok_or_else(|| {
                    VerkleTrieError::MalformedNode {
                        location: location.clone(),
                        reason: "stem location is not 31 bytes".to_string(),
                    }
                })?;
                let hash = self.required_hash(location, hash)?;
                VerkleNode::Stem(Box::new(node_serde::decode_stem(&stem, hash, &bytes)?))
            }
            KEY_BYTES => VerkleNode::Leaf(node_serde::decode_leaf(location, &bytes)?),
            len => return Err(VerkleTrieError::UnknownLocationLength(len)),
        };
        debug!(location = %location, kind = node.kind(), "materialized node from storage");
        Ok(Some(node))
    }

    /// Forces a stored internal placeholder. A miss is fatal here: the
    /// parent's commitment references this node.
    pub fn load_internal(&self, stored: &StoredInternalNode) -> VerkleTrieResult<InternalNode> {
        match self.retrieve(stored.location(), stored.hash().as_ref())? {
            Some(VerkleNode::Internal(node)) => Ok(*node),
            Some(node) => Err(VerkleTrieError::MalformedNode {
                location: stored.location().clone(),
                reason: format!("expected an internal node, found {}", node.kind()),
            }),
            None => Err(VerkleTrieError::StorageMiss { location: stored.location().clone() }),
        }
    }

    /// Forces a stored stem placeholder; stems are keyed by their full stem.
    pub fn load_stem(&self, stored: &StoredStemNode) -> VerkleTrieResult<StemNode> {
        let stem_location = NodeLocation::from(stored.stem().0.as_slice());
        match self.retrieve(&stem_location, stored.hash().as_ref())? {
            Some(VerkleNode::Stem(node)) => Ok(*node),
            Some(node) => Err(VerkleTrieError::MalformedNode {
                location: stem_location,
                reason: format!("expected a stem node, found {}", node.kind()),
            }),
            None => Err(VerkleTrieError::StorageMiss { location: stored.location().clone() }),
        }
    }

    pub fn persist_internal(
        &mut self,
        node: &InternalNode,
        is_root: bool,
    ) -> VerkleTrieResult<()> {
        let bytes = node_serde::encode_internal(node, is_root)?;
        self.storage.put_node(
            DbKey(node.location().as_slice().to_vec()),
            NodeHash(node.hash().0),
            DbValue(bytes),
        )?;
        Ok(())
    }

    pub fn persist_stem(&mut self, node: &StemNode) -> VerkleTrieResult<()> {
        let bytes = node_serde::encode_stem(node)?;
        self.storage.put_node(
            DbKey(node.stem().0.to_vec()),
            NodeHash(node.hash().0),
            DbValue(bytes),
        )?;
        Ok(())
    }

    fn required_hash(
        &self,
        location: &NodeLocation,
        hash: Option<&Scalar>,
    ) -> VerkleTrieResult<Scalar> {
        hash.copied().ok_or_else(|| VerkleTrieError::MalformedNode {
            location: location.clone(),
            reason: "node hash is required to reconstruct a non-root node".to_string(),
        })
    }
}
