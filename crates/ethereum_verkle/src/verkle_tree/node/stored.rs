use crate::crypto::types::Scalar;
use crate::verkle_tree::types::{NodeLocation, Stem};

/// Placeholder for an internal node whose payload has not been read yet.
/// Carries the scalar its parent committed for it, so the parent can commit
/// without forcing a load.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredInternalNode {
    location: NodeLocation,
    hash: Option<Scalar>,
}

impl StoredInternalNode {
    pub fn new(location: NodeLocation, hash: Option<Scalar>) -> Self {
        Self { location, hash }
    }

    pub fn location(&self) -> &NodeLocation {
        &self.location
    }

    pub fn hash(&self) -> Option<Scalar> {
        self.hash
    }
}

/// Placeholder for a stem node whose payload has not been read yet. Knows
/// its full 31-byte stem (reassembled from the parent's stem extensions), so
/// lookups for a different stem resolve without touching storage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredStemNode {
    location: NodeLocation,
    stem: Stem,
    hash: Option<Scalar>,
}

impl StoredStemNode {
    pub fn new(location: NodeLocation, stem: Stem, hash: Option<Scalar>) -> Self {
        Self { location, stem, hash }
    }

    pub fn location(&self) -> &NodeLocation {
        &self.location
    }

    pub fn stem(&self) -> &Stem {
        &self.stem
    }

    pub fn hash(&self) -> Option<Scalar> {
        self.hash
    }
}
