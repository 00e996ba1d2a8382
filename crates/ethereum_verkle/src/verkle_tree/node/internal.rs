use crate::crypto::types::{Commitment, Scalar, VERKLE_NODE_WIDTH};
use crate::verkle_tree::node::VerkleNode;
use crate::verkle_tree::types::NodeLocation;

/// A branch of the trie: 256 child slots indexed by one key byte, bound by a
/// single vector commitment. The root is an internal node at the empty
/// location.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InternalNode {
    location: NodeLocation,
    commitment: Commitment,
    hash: Scalar,
    children: Box<[VerkleNode; VERKLE_NODE_WIDTH]>,
    dirty: bool,
}

impl InternalNode {
    pub const MAX_CHILD: usize = VERKLE_NODE_WIDTH;

    /// A node with all-null children. The caller is expected to install the
    /// commitment of the empty vector (or a computed one) right after.
    pub fn empty(location: NodeLocation) -> Self {
        Self {
            location,
            commitment: Commitment::default(),
            hash: Scalar::ZERO,
            children: Box::new(std::array::from_fn(|_| VerkleNode::Null)),
            dirty: true,
        }
    }

    pub fn new(
        location: NodeLocation,
        commitment: Commitment,
        hash: Scalar,
        children: Box<[VerkleNode; VERKLE_NODE_WIDTH]>,
        dirty: bool,
    ) -> Self {
        Self { location, commitment, hash, children, dirty }
    }

    pub fn location(&self) -> &NodeLocation {
        &self.location
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn hash(&self) -> &Scalar {
        &self.hash
    }

    pub fn children(&self) -> &[VerkleNode; VERKLE_NODE_WIDTH] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [VerkleNode; VERKLE_NODE_WIDTH] {
        &mut self.children
    }

    pub fn child(&self, slot: u8) -> &VerkleNode {
        &self.children[usize::from(slot)]
    }

    pub fn child_mut(&mut self, slot: u8) -> &mut VerkleNode {
        &mut self.children[usize::from(slot)]
    }

    /// Removes the child at `slot`, leaving `Null` in its place.
    pub fn take_child(&mut self, slot: u8) -> VerkleNode {
        std::mem::replace(&mut self.children[usize::from(slot)], VerkleNode::Null)
    }

    pub fn set_child(&mut self, slot: u8, child: VerkleNode) {
        self.children[usize::from(slot)] = child;
        self.dirty = true;
    }

    pub fn set_commitment(&mut self, commitment: Commitment, hash: Scalar) {
        self.commitment = commitment;
        self.hash = hash;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
