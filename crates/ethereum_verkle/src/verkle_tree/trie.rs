//! The trie engine: traversal, mutation, and delta-based commitment updates.
//!
//! Every mutation recomputes commitments eagerly on its way back up: each
//! ancestor of a touched leaf issues exactly one `commit_update` for the one
//! child index that changed, never a full recommit. Batch insertion merges
//! the deltas per node so a node on many touched paths still commits once.

use ethereum_verkle_storage::storage_trait::Storage;
use tracing::trace;

use crate::crypto::committer::VectorCommitter;
use crate::crypto::errors::CryptoError;
use crate::crypto::types::{Commitment, CommitmentDelta, Scalar};
use crate::verkle_tree::errors::{VerkleTrieError, VerkleTrieResult};
use crate::verkle_tree::node::stem::{
    high_scalar, is_left_suffix, low_scalar, suffix_sub_indices,
};
use crate::verkle_tree::node::{InternalNode, StemNode, VerkleNode};
use crate::verkle_tree::node_factory::NodeFactory;
use crate::verkle_tree::types::{NodeLocation, Stem, TrieKey, TrieValue};
use crate::verkle_tree::visitor::{FlattenVisitor, NodeVisitor};

#[cfg(test)]
#[path = "trie_test.rs"]
mod trie_test;

// Slots of a stem's top commitment: [marker, stem, scalar(Cl), scalar(Cr)].
const STEM_MARKER_SLOT: u8 = 0;
const STEM_STEM_SLOT: u8 = 1;
const STEM_LEFT_SLOT: u8 = 2;
const STEM_RIGHT_SLOT: u8 = 3;

/// The Ethereum world-state Verkle trie over a backing store and a
/// vector-commitment primitive.
///
/// Not safe for concurrent mutation; independent tries over distinct storage
/// handles may run in parallel.
#[derive(Debug)]
pub struct VerkleTrie<S: Storage, C: VectorCommitter> {
    root: VerkleNode,
    factory: NodeFactory<S>,
    committer: C,
}

impl<S: Storage, C: VectorCommitter> VerkleTrie<S, C> {
    /// A fresh empty trie; the root commits to the all-zero vector.
    pub fn new(storage: S, committer: C) -> VerkleTrieResult<Self> {
        let commitment = committer.commit_sparse(&[])?;
        let hash = committer.scalar_of(&commitment)?;
        let mut root = InternalNode::empty(NodeLocation::root());
        root.set_commitment(commitment, hash);
        Ok(Self {
            root: VerkleNode::Root(Box::new(root)),
            factory: NodeFactory::new(storage),
            committer,
        })
    }

    /// Opens a trie over existing storage. The root loads now; everything
    /// below materializes lazily on access. Falls back to a fresh empty trie
    /// when the store holds no root.
    pub fn open(storage: S, committer: C) -> VerkleTrieResult<Self> {
        let factory = NodeFactory::new(storage);
        match factory.retrieve(&NodeLocation::root(), None)? {
            Some(root @ VerkleNode::Root(_)) => Ok(Self { root, factory, committer }),
            Some(node) => Err(VerkleTrieError::MalformedNode {
                location: NodeLocation::root(),
                reason: format!("expected the root node, found {}", node.kind()),
            }),
            None => Self::new(factory.into_storage(), committer),
        }
    }

    pub fn root_hash(&self) -> Scalar {
        self.root.hash().unwrap_or(Scalar::ZERO)
    }

    pub fn root_commitment(&self) -> Commitment {
        self.root.commitment().copied().unwrap_or_default()
    }

    /// Completes the commit sweep and returns the root hash. Deltas are
    /// applied eagerly on every mutation, so there is never outstanding
    /// work; the call is idempotent.
    pub fn commit_root(&self) -> Scalar {
        self.root_hash()
    }

    pub fn storage(&self) -> &S {
        self.factory.storage()
    }

    pub fn into_storage(self) -> S {
        self.factory.into_storage()
    }

    pub fn committer(&self) -> &C {
        &self.committer
    }

    /// The root node, for non-loading inspection; stored placeholders stay
    /// as they are.
    pub fn root(&self) -> &VerkleNode {
        &self.root
    }

    /// Looks up the value stored under `key`, materializing stored nodes as
    /// the walk requires. A stored stem whose known stem differs from the
    /// key's resolves to absent without touching storage.
    pub fn get(&mut self, key: &TrieKey) -> VerkleTrieResult<Option<TrieValue>> {
        let Self { root, factory, .. } = self;
        Self::get_in_node(factory, root, key)
    }

    /// Inserts or updates the value under `key`, propagating scalar deltas
    /// from the touched stem up to the root.
    pub fn put(&mut self, key: &TrieKey, value: TrieValue) -> VerkleTrieResult<()> {
        let Self { root, factory, committer } = self;
        let root_node = Self::root_internal(root)?;
        Self::put_in_internal(factory, committer, root_node, key, value)?;
        Ok(())
    }

    /// Marks the value under `key` absent, subtracting its old contribution.
    /// A stem left with no present values is replaced by a null slot at its
    /// parent. Extend chains are never contracted; an internal node may keep
    /// a single live child, which does not affect the root hash because
    /// emptied subtrees contribute the zero scalar.
    pub fn remove(&mut self, key: &TrieKey) -> VerkleTrieResult<()> {
        let Self { root, factory, committer } = self;
        let root_node = Self::root_internal(root)?;
        Self::remove_in_internal(factory, committer, root_node, key)?;
        Ok(())
    }

    /// Inserts many pairs, committing each touched node once with its merged
    /// deltas applied in ascending index order. For duplicate keys the last
    /// pair wins.
    pub fn put_batch(&mut self, entries: &[(TrieKey, TrieValue)]) -> VerkleTrieResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut sorted = entries.to_vec();
        sorted.sort_by_key(|(key, _)| *key);
        let Self { root, factory, committer } = self;
        let root_node = Self::root_internal(root)?;
        Self::put_batch_in_internal(factory, committer, root_node, &sorted)?;
        Ok(())
    }

    /// Writes every dirty node to the backing store and clears dirtiness.
    /// Clean subtrees are skipped; dirtiness always propagates upward, so a
    /// clean node has no dirty descendants.
    pub fn persist(&mut self) -> VerkleTrieResult<()> {
        let Self { root, factory, .. } = self;
        Self::persist_node(factory, root)
    }

    /// Walks the trie depth-first, forcing stored placeholders, and hands
    /// each present node to the visitor with its location.
    pub fn visit(&mut self, visitor: &mut dyn NodeVisitor) -> VerkleTrieResult<()> {
        let Self { root, factory, .. } = self;
        Self::visit_node(factory, root, NodeLocation::root(), visitor)
    }

    /// Every key-value pair in key order. Forces all stored placeholders.
    pub fn flatten(&mut self) -> VerkleTrieResult<Vec<(TrieKey, TrieValue)>> {
        let mut visitor = FlattenVisitor::default();
        self.visit(&mut visitor)?;
        Ok(visitor.into_entries())
    }

    fn root_internal(root: &mut VerkleNode) -> VerkleTrieResult<&mut InternalNode> {
        match root {
            VerkleNode::Root(node) => Ok(node),
            node => Err(VerkleTrieError::MalformedNode {
                location: NodeLocation::root(),
                reason: format!("trie root is a {} node", node.kind()),
            }),
        }
    }

    /// Replaces a stored placeholder with its loaded form, in place. Any
    /// other node is left untouched.
    fn force_load(factory: &NodeFactory<S>, node: &mut VerkleNode) -> VerkleTrieResult<()> {
        match node {
            VerkleNode::StoredInternal(stored) => {
                let loaded = factory.load_internal(stored)?;
                *node = VerkleNode::Internal(Box::new(loaded));
            }
            VerkleNode::StoredStem(stored) => {
                let loaded = factory.load_stem(stored)?;
                *node = VerkleNode::Stem(Box::new(loaded));
            }
            _ => {}
        }
        Ok(())
    }

    fn get_in_node(
        factory: &NodeFactory<S>,
        node: &mut VerkleNode,
        key: &TrieKey,
    ) -> VerkleTrieResult<Option<TrieValue>> {
        match node {
            VerkleNode::Root(internal) | VerkleNode::Internal(internal) => {
                let depth = internal.location().len();
                Self::get_in_node(factory, internal.child_mut(key.byte(depth)), key)
            }
            VerkleNode::Stem(stem_node) => {
                if *stem_node.stem() == key.stem() {
                    Ok(stem_node.value(key.suffix()).copied())
                } else {
                    Ok(None)
                }
            }
            VerkleNode::StoredStem(stored) => {
                if *stored.stem() != key.stem() {
                    return Ok(None);
                }
                Self::force_load(factory, node)?;
                Self::get_in_node(factory, node, key)
            }
            VerkleNode::StoredInternal(_) => {
                Self::force_load(factory, node)?;
                Self::get_in_node(factory, node, key)
            }
            VerkleNode::Null | VerkleNode::NullLeaf => Ok(None),
            VerkleNode::Leaf(leaf) => Ok((leaf.key == *key).then_some(leaf.value)),
        }
    }

    /// Recursive insertion step. Returns this node's (old, new) hash pair
    /// for the caller's own delta.
    fn put_in_internal(
        factory: &NodeFactory<S>,
        committer: &C,
        node: &mut InternalNode,
        key: &TrieKey,
        value: TrieValue,
    ) -> VerkleTrieResult<(Scalar, Scalar)> {
        let depth = node.location().len();
        let slot = key.byte(depth);
        let stem = key.stem();

        let mut child = node.take_child(slot);
        Self::force_load(factory, &mut child)?;
        let (child_old, child_new, child) = match child {
            VerkleNode::Null | VerkleNode::NullLeaf => {
                let fresh = Self::fresh_stem(
                    committer,
                    &stem,
                    node.location().child(slot),
                    &[(key.suffix(), value)],
                )?;
                let new = *fresh.hash();
                (Scalar::ZERO, new, VerkleNode::Stem(Box::new(fresh)))
            }
            VerkleNode::Stem(mut stem_node) if *stem_node.stem() == stem => {
                let old = *stem_node.hash();
                Self::apply_stem_updates(
                    committer,
                    &mut stem_node,
                    &[(key.suffix(), Some(value))],
                )?;
                let new = *stem_node.hash();
                (old, new, VerkleNode::Stem(stem_node))
            }
            VerkleNode::Stem(existing) => {
                let old = *existing.hash();
                let subtree = Self::extend(committer, existing, key, value)?;
                let new = *subtree.hash();
                (old, new, VerkleNode::Internal(Box::new(subtree)))
            }
            VerkleNode::Internal(mut inner) => {
                let (old, new) = Self::put_in_internal(factory, committer, &mut inner, key, value)?;
                (old, new, VerkleNode::Internal(inner))
            }
            other => {
                return Err(VerkleTrieError::MalformedNode {
                    location: node.location().child(slot),
                    reason: format!("unexpected {} node in a child slot", other.kind()),
                });
            }
        };
        node.set_child(slot, child);
        Self::apply_internal_deltas(
            committer,
            node,
            &[CommitmentDelta { index: slot, old: child_old, new: child_new }],
        )
    }

    /// Recursive removal step; mirrors [`Self::put_in_internal`].
    fn remove_in_internal(
        factory: &NodeFactory<S>,
        committer: &C,
        node: &mut InternalNode,
        key: &TrieKey,
    ) -> VerkleTrieResult<(Scalar, Scalar)> {
        let depth = node.location().len();
        let slot = key.byte(depth);
        let stem = key.stem();

        // A placeholder for a different stem cannot hold the key.
        if let VerkleNode::StoredStem(stored) = node.child(slot) {
            if *stored.stem() != stem {
                return Ok((*node.hash(), *node.hash()));
            }
        }

        let mut child = node.take_child(slot);
        Self::force_load(factory, &mut child)?;
        let (child_old, child_new, child) = match child {
            VerkleNode::Stem(mut stem_node)
                if *stem_node.stem() == stem && stem_node.value(key.suffix()).is_some() =>
            {
                let old = *stem_node.hash();
                Self::apply_stem_updates(committer, &mut stem_node, &[(key.suffix(), None)])?;
                if stem_node.is_empty() {
                    (old, Scalar::ZERO, VerkleNode::Null)
                } else {
                    let new = *stem_node.hash();
                    (old, new, VerkleNode::Stem(stem_node))
                }
            }
            VerkleNode::Internal(mut inner) => {
                let (old, new) =
                    Self::remove_in_internal(factory, committer, &mut inner, key)?;
                (old, new, VerkleNode::Internal(inner))
            }
            // Absent stems, foreign stems, and already-absent suffixes are
            // no-ops.
            untouched => {
                node.set_child(slot, untouched);
                return Ok((*node.hash(), *node.hash()));
            }
        };
        node.set_child(slot, child);
        Self::apply_internal_deltas(
            committer,
            node,
            &[CommitmentDelta { index: slot, old: child_old, new: child_new }],
        )
    }

    /// Batched insertion over key-sorted entries. Groups the entries by the
    /// child byte at this node's depth and issues one merged `commit_update`
    /// for all touched slots, in ascending index order.
    fn put_batch_in_internal(
        factory: &NodeFactory<S>,
        committer: &C,
        node: &mut InternalNode,
        entries: &[(TrieKey, TrieValue)],
    ) -> VerkleTrieResult<(Scalar, Scalar)> {
        let depth = node.location().len();
        let mut deltas = Vec::new();

        let mut start = 0;
        while start < entries.len() {
            let slot = entries[start].0.byte(depth);
            let end = entries[start..]
                .iter()
                .position(|(key, _)| key.byte(depth) != slot)
                .map_or(entries.len(), |offset| start + offset);
            let group = &entries[start..end];
            start = end;

            let group_stem = group[0].0.stem();
            let uniform = group.iter().all(|(key, _)| key.stem() == group_stem);

            let mut child = node.take_child(slot);
            Self::force_load(factory, &mut child)?;
            let (child_old, child_new, child) = match child {
                VerkleNode::Null | VerkleNode::NullLeaf if uniform => {
                    let leaves: Vec<(u8, TrieValue)> =
                        group.iter().map(|(key, value)| (key.suffix(), *value)).collect();
                    let fresh = Self::fresh_stem(
                        committer,
                        &group_stem,
                        node.location().child(slot),
                        &leaves,
                    )?;
                    let new = *fresh.hash();
                    (Scalar::ZERO, new, VerkleNode::Stem(Box::new(fresh)))
                }
                VerkleNode::Null | VerkleNode::NullLeaf => {
                    // Mixed stems below an empty slot: open an internal node
                    // and let the recursion lay them out.
                    let mut inner = Self::empty_internal(committer, node.location().child(slot))?;
                    let (_, new) =
                        Self::put_batch_in_internal(factory, committer, &mut inner, group)?;
                    (Scalar::ZERO, new, VerkleNode::Internal(Box::new(inner)))
                }
                VerkleNode::Stem(mut stem_node) if uniform && *stem_node.stem() == group_stem => {
                    let old = *stem_node.hash();
                    let updates: Vec<(u8, Option<TrieValue>)> =
                        group.iter().map(|(key, value)| (key.suffix(), Some(*value))).collect();
                    Self::apply_stem_updates(committer, &mut stem_node, &updates)?;
                    (old, *stem_node.hash(), VerkleNode::Stem(stem_node))
                }
                VerkleNode::Stem(existing) => {
                    // The group collides with a stem it does not (entirely)
                    // match: push the stem one level down and recurse.
                    let old = *existing.hash();
                    let mut inner =
                        Self::push_down(committer, existing, node.location().child(slot))?;
                    let (_, new) =
                        Self::put_batch_in_internal(factory, committer, &mut inner, group)?;
                    (old, new, VerkleNode::Internal(Box::new(inner)))
                }
                VerkleNode::Internal(mut inner) => {
                    let (old, new) =
                        Self::put_batch_in_internal(factory, committer, &mut inner, group)?;
                    (old, new, VerkleNode::Internal(inner))
                }
                other => {
                    return Err(VerkleTrieError::MalformedNode {
                        location: node.location().child(slot),
                        reason: format!("unexpected {} node in a child slot", other.kind()),
                    });
                }
            };
            node.set_child(slot, child);
            if child_old != child_new {
                deltas.push(CommitmentDelta { index: slot, old: child_old, new: child_new });
            }
        }
        Self::apply_internal_deltas(committer, node, &deltas)
    }

    /// One `commit_update` for this node, skipping no-op deltas. Returns the
    /// (old, new) hash pair.
    fn apply_internal_deltas(
        committer: &C,
        node: &mut InternalNode,
        deltas: &[CommitmentDelta],
    ) -> VerkleTrieResult<(Scalar, Scalar)> {
        let old_hash = *node.hash();
        let effective: Vec<CommitmentDelta> =
            deltas.iter().copied().filter(|delta| delta.old != delta.new).collect();
        if !effective.is_empty() {
            let commitment = committer.commit_update(node.commitment(), &effective)?;
            let hash = committer.scalar_of(&commitment)?;
            trace!(location = %node.location(), deltas = effective.len(), "updated commitment");
            node.set_commitment(commitment, hash);
        }
        Ok((old_hash, *node.hash()))
    }

    /// A new internal node committing to the all-zero vector.
    fn empty_internal(committer: &C, location: NodeLocation) -> VerkleTrieResult<InternalNode> {
        let commitment = committer.commit_sparse(&[])?;
        let hash = committer.scalar_of(&commitment)?;
        let mut node = InternalNode::empty(location);
        node.set_commitment(commitment, hash);
        Ok(node)
    }

    /// A new stem node holding the given leaves, fully committed.
    fn fresh_stem(
        committer: &C,
        stem: &Stem,
        location: NodeLocation,
        leaves: &[(u8, TrieValue)],
    ) -> VerkleTrieResult<StemNode> {
        let mut node = StemNode::empty(*stem, location);
        for (suffix, value) in leaves {
            node.set_leaf(*suffix, *value);
        }
        Self::recompute_stem(committer, &mut node)?;
        Ok(node)
    }

    /// Full recomputation of a stem's Cl/Cr/C from its present values. Used
    /// only for freshly built stems; existing stems update by deltas.
    fn recompute_stem(committer: &C, node: &mut StemNode) -> VerkleTrieResult<()> {
        let mut left_pairs = Vec::new();
        let mut right_pairs = Vec::new();
        for (suffix, value) in node.present_suffixes() {
            let (low_index, high_index) = suffix_sub_indices(suffix);
            let pairs = if is_left_suffix(suffix) { &mut left_pairs } else { &mut right_pairs };
            pairs.push((low_index, low_scalar(Some(value))));
            pairs.push((high_index, high_scalar(Some(value))));
        }
        let left = committer.commit_sparse(&left_pairs)?;
        let right = committer.commit_sparse(&right_pairs)?;
        let scalars = committer.scalars_of(&[left, right])?;
        let (left_scalar, right_scalar) = match scalars.as_slice() {
            [left_scalar, right_scalar] => (*left_scalar, *right_scalar),
            _ => {
                return Err(CryptoError::InvalidLength {
                    kind: "scalar batch",
                    expected: 2,
                    actual: scalars.len(),
                }
                .into());
            }
        };
        node.set_left(left, left_scalar);
        node.set_right(right, right_scalar);

        let commitment = committer.commit_sparse(&[
            (STEM_MARKER_SLOT, Scalar::from(1)),
            (STEM_STEM_SLOT, node.stem().to_scalar()),
            (STEM_LEFT_SLOT, left_scalar),
            (STEM_RIGHT_SLOT, right_scalar),
        ])?;
        let hash = committer.scalar_of(&commitment)?;
        node.set_commitment(commitment, hash);
        Ok(())
    }

    /// Applies value updates to an existing stem by deltas: each touched
    /// suffix adjusts its half commitment at two sub-indices, then the
    /// changed half scalars adjust the top commitment. `None` clears a slot.
    /// Updates apply in the given order; deltas on one suffix chain through
    /// the intermediate values.
    fn apply_stem_updates(
        committer: &C,
        node: &mut StemNode,
        updates: &[(u8, Option<TrieValue>)],
    ) -> VerkleTrieResult<()> {
        let mut left_deltas = Vec::new();
        let mut right_deltas = Vec::new();
        for (suffix, new_value) in updates {
            let old_value = node.value(*suffix).copied();
            if old_value == *new_value {
                continue;
            }
            let (low_index, high_index) = suffix_sub_indices(*suffix);
            let deltas =
                if is_left_suffix(*suffix) { &mut left_deltas } else { &mut right_deltas };
            deltas.push(CommitmentDelta {
                index: low_index,
                old: low_scalar(old_value.as_ref()),
                new: low_scalar(new_value.as_ref()),
            });
            deltas.push(CommitmentDelta {
                index: high_index,
                old: high_scalar(old_value.as_ref()),
                new: high_scalar(new_value.as_ref()),
            });
            match new_value {
                Some(value) => node.set_leaf(*suffix, *value),
                None => node.clear_leaf(*suffix),
            }
        }

        let mut top_deltas = Vec::new();
        if !left_deltas.is_empty() {
            let left = committer.commit_update(node.left_commitment(), &left_deltas)?;
            let left_scalar = committer.scalar_of(&left)?;
            top_deltas.push(CommitmentDelta {
                index: STEM_LEFT_SLOT,
                old: *node.left_scalar(),
                new: left_scalar,
            });
            node.set_left(left, left_scalar);
        }
        if !right_deltas.is_empty() {
            let right = committer.commit_update(node.right_commitment(), &right_deltas)?;
            let right_scalar = committer.scalar_of(&right)?;
            top_deltas.push(CommitmentDelta {
                index: STEM_RIGHT_SLOT,
                old: *node.right_scalar(),
                new: right_scalar,
            });
            node.set_right(right, right_scalar);
        }
        if !top_deltas.is_empty() {
            let commitment = committer.commit_update(node.commitment(), &top_deltas)?;
            let hash = committer.scalar_of(&commitment)?;
            node.set_commitment(commitment, hash);
        }
        Ok(())
    }

    /// Splits a stem collision: builds internal nodes from the colliding
    /// slot down to the first divergent byte, moving the existing stem down
    /// with only its location metadata updated and installing the new key's
    /// stem beside it. Returns the subtree that replaces the old stem's
    /// slot.
    fn extend(
        committer: &C,
        mut existing: Box<StemNode>,
        key: &TrieKey,
        value: TrieValue,
    ) -> VerkleTrieResult<InternalNode> {
        let stem = key.stem();
        let top_location = existing.location().clone();
        let divergence = existing.stem().first_divergence(&stem).ok_or_else(|| {
            VerkleTrieError::MalformedNode {
                location: top_location.clone(),
                reason: "stem collision without a divergent byte".to_string(),
            }
        })?;
        let existing_hash = *existing.hash();
        let existing_slot = existing.stem().byte(divergence);
        let new_slot = stem.byte(divergence);

        existing.relocate(existing.stem().prefix(divergence + 1));
        let fresh =
            Self::fresh_stem(committer, &stem, stem.prefix(divergence + 1), &[(key.suffix(), value)])?;
        let fresh_hash = *fresh.hash();

        // The branching node where the two stems part ways.
        let mut pairs = [(existing_slot, existing_hash), (new_slot, fresh_hash)];
        pairs.sort_by_key(|(slot, _)| *slot);
        let mut cursor = InternalNode::empty(stem.prefix(divergence));
        let commitment = committer.commit_sparse(&pairs)?;
        let hash = committer.scalar_of(&commitment)?;
        cursor.set_commitment(commitment, hash);
        cursor.set_child(existing_slot, VerkleNode::Stem(existing));
        cursor.set_child(new_slot, VerkleNode::Stem(Box::new(fresh)));

        // Single-child links back up to the colliding slot.
        for depth in (top_location.len()..divergence).rev() {
            let slot = stem.byte(depth);
            let mut link = InternalNode::empty(stem.prefix(depth));
            let commitment = committer.commit_sparse(&[(slot, *cursor.hash())])?;
            let hash = committer.scalar_of(&commitment)?;
            link.set_commitment(commitment, hash);
            link.set_child(slot, VerkleNode::Internal(Box::new(cursor)));
            cursor = link;
        }
        trace!(location = %top_location, divergence, "extended a stem collision");
        Ok(cursor)
    }

    /// Pushes a stem one level down under a fresh internal node at
    /// `location`; the batch recursion then lays new stems out beside it.
    fn push_down(
        committer: &C,
        mut existing: Box<StemNode>,
        location: NodeLocation,
    ) -> VerkleTrieResult<InternalNode> {
        let slot = existing.stem().byte(location.len());
        let hash = *existing.hash();
        existing.relocate(existing.stem().prefix(location.len() + 1));
        let mut inner = InternalNode::empty(location);
        let commitment = committer.commit_sparse(&[(slot, hash)])?;
        let inner_hash = committer.scalar_of(&commitment)?;
        inner.set_commitment(commitment, inner_hash);
        inner.set_child(slot, VerkleNode::Stem(existing));
        Ok(inner)
    }

    fn persist_node(factory: &mut NodeFactory<S>, node: &mut VerkleNode) -> VerkleTrieResult<()> {
        match node {
            VerkleNode::Root(internal) | VerkleNode::Internal(internal) => {
                if !internal.is_dirty() {
                    return Ok(());
                }
                let is_root = internal.location().is_empty();
                factory.persist_internal(internal, is_root)?;
                internal.clear_dirty();
                for child in internal.children_mut().iter_mut() {
                    Self::persist_node(factory, child)?;
                }
            }
            VerkleNode::Stem(stem_node) => {
                if stem_node.is_dirty() {
                    factory.persist_stem(stem_node)?;
                    stem_node.clear_dirty();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_node(
        factory: &NodeFactory<S>,
        node: &mut VerkleNode,
        location: NodeLocation,
        visitor: &mut dyn NodeVisitor,
    ) -> VerkleTrieResult<()> {
        Self::force_load(factory, node)?;
        visitor.visit(node, &location);
        if !visitor.descend(node, &location) {
            return Ok(());
        }
        match node {
            VerkleNode::Root(internal) | VerkleNode::Internal(internal) => {
                for (slot, child) in (0..=u8::MAX).zip(internal.children_mut().iter_mut()) {
                    if !child.is_null() {
                        Self::visit_node(factory, child, location.child(slot), visitor)?;
                    }
                }
            }
            VerkleNode::Stem(stem_node) => {
                for leaf in stem_node.children().iter() {
                    if let VerkleNode::Leaf(data) = leaf {
                        visitor.visit(leaf, &NodeLocation::from(data.key.0.as_slice()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
