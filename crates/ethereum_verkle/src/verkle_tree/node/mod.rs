pub mod internal;
pub mod leaf;
pub mod stem;
pub mod stored;

pub use internal::InternalNode;
pub use leaf::LeafNode;
pub use stem::StemNode;
pub use stored::{StoredInternalNode, StoredStemNode};

use crate::crypto::types::{Commitment, Scalar};
use crate::verkle_tree::types::NodeLocation;
use crate::verkle_tree::visitor::NodeVisitor;

/// A node of the Verkle trie.
///
/// `Null` and `NullLeaf` are explicit absence markers holding a child or
/// leaf slot; `StoredInternal` and `StoredStem` are lazy placeholders that
/// the engine materializes through the node factory on first deep access.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerkleNode {
    Root(Box<InternalNode>),
    Internal(Box<InternalNode>),
    Stem(Box<StemNode>),
    Leaf(LeafNode),
    NullLeaf,
    Null,
    StoredInternal(StoredInternalNode),
    StoredStem(StoredStemNode),
}

impl VerkleNode {
    /// The scalar this node contributes to its parent's commitment. `None`
    /// for leaves, which project to two scalars through their stem, and for
    /// placeholders whose scalar was not recorded.
    pub fn hash(&self) -> Option<Scalar> {
        match self {
            Self::Root(node) | Self::Internal(node) => Some(*node.hash()),
            Self::Stem(node) => Some(*node.hash()),
            Self::StoredInternal(stored) => stored.hash(),
            Self::StoredStem(stored) => stored.hash(),
            Self::Null | Self::NullLeaf => Some(Scalar::ZERO),
            Self::Leaf(_) => None,
        }
    }

    pub fn commitment(&self) -> Option<&Commitment> {
        match self {
            Self::Root(node) | Self::Internal(node) => Some(node.commitment()),
            Self::Stem(node) => Some(node.commitment()),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&NodeLocation> {
        match self {
            Self::Root(node) | Self::Internal(node) => Some(node.location()),
            Self::Stem(node) => Some(node.location()),
            Self::StoredInternal(stored) => Some(stored.location()),
            Self::StoredStem(stored) => Some(stored.location()),
            Self::Leaf(_) | Self::Null | Self::NullLeaf => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::NullLeaf)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Internal(_) => "internal",
            Self::Stem(_) => "stem",
            Self::Leaf(_) => "leaf",
            Self::NullLeaf => "null_leaf",
            Self::Null => "null",
            Self::StoredInternal(_) => "stored_internal",
            Self::StoredStem(_) => "stored_stem",
        }
    }

    /// Depth-first dispatch over the materialized tree. Placeholders are
    /// visited as-is and never forced; [`crate::verkle_tree::trie`] offers
    /// the loading walk.
    pub fn accept(&self, location: &NodeLocation, visitor: &mut dyn NodeVisitor) {
        visitor.visit(self, location);
        if !visitor.descend(self, location) {
            return;
        }
        match self {
            Self::Root(node) | Self::Internal(node) => {
                for (slot, child) in (0..=u8::MAX).zip(node.children().iter()) {
                    if !child.is_null() {
                        child.accept(&location.child(slot), visitor);
                    }
                }
            }
            Self::Stem(node) => {
                for leaf in node.children().iter() {
                    // A leaf's location is its full 32-byte key.
                    if let Self::Leaf(data) = leaf {
                        leaf.accept(&NodeLocation::from(data.key.0.as_slice()), visitor);
                    }
                }
            }
            _ => {}
        }
    }
}
