use crate::crypto::types::{Commitment, Scalar, VERKLE_NODE_WIDTH};
use crate::verkle_tree::node::{LeafNode, VerkleNode};
use crate::verkle_tree::types::{NodeLocation, Stem, TrieKey, TrieValue};

/// Leaf slots covered by the left suffix commitment `Cl`; the rest belong to
/// `Cr`.
pub const LEFT_SUFFIX_SLOTS: u8 = 128;

/// A group of up to 256 sibling leaves sharing one 31-byte stem.
///
/// `Cl` commits to the projected scalars of suffixes 0..128 and `Cr` to
/// 128..256; `C` commits to `[1, stem, scalar(Cl), scalar(Cr), 0...]` and
/// `H = scalar_of(C)` is the scalar the parent slot commits to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StemNode {
    location: NodeLocation,
    stem: Stem,
    commitment: Commitment,
    left_commitment: Commitment,
    right_commitment: Commitment,
    left_scalar: Scalar,
    right_scalar: Scalar,
    hash: Scalar,
    children: Box<[VerkleNode; VERKLE_NODE_WIDTH]>,
    dirty: bool,
}

impl StemNode {
    pub const MAX_CHILD: usize = VERKLE_NODE_WIDTH;

    /// A stem with every leaf slot absent; commitments are installed by the
    /// engine once leaves are in place.
    pub fn empty(stem: Stem, location: NodeLocation) -> Self {
        Self {
            location,
            stem,
            commitment: Commitment::default(),
            left_commitment: Commitment::default(),
            right_commitment: Commitment::default(),
            left_scalar: Scalar::ZERO,
            right_scalar: Scalar::ZERO,
            hash: Scalar::ZERO,
            children: Box::new(std::array::from_fn(|_| VerkleNode::NullLeaf)),
            dirty: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        location: NodeLocation,
        stem: Stem,
        commitment: Commitment,
        left_commitment: Commitment,
        right_commitment: Commitment,
        left_scalar: Scalar,
        right_scalar: Scalar,
        hash: Scalar,
        children: Box<[VerkleNode; VERKLE_NODE_WIDTH]>,
        dirty: bool,
    ) -> Self {
        Self {
            location,
            stem,
            commitment,
            left_commitment,
            right_commitment,
            left_scalar,
            right_scalar,
            hash,
            children,
            dirty,
        }
    }

    pub fn location(&self) -> &NodeLocation {
        &self.location
    }

    pub fn stem(&self) -> &Stem {
        &self.stem
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn left_commitment(&self) -> &Commitment {
        &self.left_commitment
    }

    pub fn right_commitment(&self) -> &Commitment {
        &self.right_commitment
    }

    pub fn left_scalar(&self) -> &Scalar {
        &self.left_scalar
    }

    pub fn right_scalar(&self) -> &Scalar {
        &self.right_scalar
    }

    pub fn hash(&self) -> &Scalar {
        &self.hash
    }

    pub fn children(&self) -> &[VerkleNode; VERKLE_NODE_WIDTH] {
        &self.children
    }

    pub fn value(&self, suffix: u8) -> Option<&TrieValue> {
        match &self.children[usize::from(suffix)] {
            VerkleNode::Leaf(leaf) => Some(&leaf.value),
            _ => None,
        }
    }

    /// Installs (or replaces) the leaf at `suffix`.
    pub fn set_leaf(&mut self, suffix: u8, value: TrieValue) {
        let key = TrieKey::from_stem_and_suffix(&self.stem, suffix);
        self.children[usize::from(suffix)] = VerkleNode::Leaf(LeafNode::new(key, value));
        self.dirty = true;
    }

    /// Marks the leaf at `suffix` absent.
    pub fn clear_leaf(&mut self, suffix: u8) {
        self.children[usize::from(suffix)] = VerkleNode::NullLeaf;
        self.dirty = true;
    }

    /// Whether every leaf slot is absent.
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(VerkleNode::is_null)
    }

    pub fn present_suffixes(&self) -> impl Iterator<Item = (u8, &TrieValue)> {
        (0..=u8::MAX).zip(self.children.iter()).filter_map(|(suffix, child)| match child {
            VerkleNode::Leaf(leaf) => Some((suffix, &leaf.value)),
            _ => None,
        })
    }

    /// Moves the node to a deeper location. Leaf keys and commitments are
    /// unaffected; only the stored depth changes.
    pub fn relocate(&mut self, location: NodeLocation) {
        self.location = location;
        self.dirty = true;
    }

    pub fn set_left(&mut self, commitment: Commitment, scalar: Scalar) {
        self.left_commitment = commitment;
        self.left_scalar = scalar;
        self.dirty = true;
    }

    pub fn set_right(&mut self, commitment: Commitment, scalar: Scalar) {
        self.right_commitment = commitment;
        self.right_scalar = scalar;
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

/// Whether a suffix projects into `Cl` rather than `Cr`.
pub fn is_left_suffix(suffix: u8) -> bool {
    suffix < LEFT_SUFFIX_SLOTS
}

/// The two sub-indices a suffix occupies within its half commitment: one for
/// the value's low 16 bytes, one for the high 16.
pub fn suffix_sub_indices(suffix: u8) -> (u8, u8) {
    let base = (suffix % LEFT_SUFFIX_SLOTS) * 2;
    (base, base + 1)
}

/// The low half of a value as a scalar, carrying the 2^128 presence marker.
/// An absent slot projects to zero, so a present all-zero value stays
/// distinguishable from absence.
pub fn low_scalar(value: Option<&TrieValue>) -> Scalar {
    match value {
        None => Scalar::ZERO,
        Some(value) => {
            let mut bytes = [0; 32];
            bytes[..16].copy_from_slice(&value.0[..16]);
            bytes[16] = 1;
            Scalar(bytes)
        }
    }
}

/// The high half of a value as a scalar; zero when absent.
pub fn high_scalar(value: Option<&TrieValue>) -> Scalar {
    match value {
        None => Scalar::ZERO,
        Some(value) => {
            let mut bytes = [0; 32];
            bytes[..16].copy_from_slice(&value.0[16..]);
            Scalar(bytes)
        }
    }
}
