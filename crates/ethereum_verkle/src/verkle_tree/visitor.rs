use crate::verkle_tree::node::VerkleNode;
use crate::verkle_tree::types::{NodeLocation, TrieKey, TrieValue};

/// Depth-first observer over trie nodes.
pub trait NodeVisitor {
    fn visit(&mut self, node: &VerkleNode, location: &NodeLocation);

    /// Pruning predicate: return `false` to skip the subtree below `node`.
    fn descend(&mut self, _node: &VerkleNode, _location: &NodeLocation) -> bool {
        true
    }
}

/// Collects every leaf in key order.
#[derive(Debug, Default)]
pub struct FlattenVisitor {
    entries: Vec<(TrieKey, TrieValue)>,
}

impl FlattenVisitor {
    pub fn into_entries(self) -> Vec<(TrieKey, TrieValue)> {
        self.entries
    }
}

impl NodeVisitor for FlattenVisitor {
    fn visit(&mut self, node: &VerkleNode, _location: &NodeLocation) {
        if let VerkleNode::Leaf(leaf) = node {
            self.entries.push((leaf.key, leaf.value));
        }
    }
}
