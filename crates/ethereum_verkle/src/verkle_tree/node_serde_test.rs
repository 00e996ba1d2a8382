use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::crypto::types::{Commitment, Scalar};
use crate::verkle_tree::errors::VerkleTrieError;
use crate::verkle_tree::node::{
    InternalNode, StemNode, StoredInternalNode, StoredStemNode, VerkleNode,
};
use crate::verkle_tree::node_serde::{
    decode_internal, decode_leaf, decode_root, decode_stem, encode_internal, encode_stem,
};
use crate::verkle_tree::types::{NodeLocation, Stem, TrieValue};

fn commitment(seed: u8) -> Commitment {
    Commitment([seed; 64])
}

fn scalar(seed: u8) -> Scalar {
    Scalar([seed; 32])
}

fn stem_at(location: &NodeLocation, slot: u8, tail_seed: u8) -> Stem {
    let mut bytes = [tail_seed; 31];
    bytes[..location.len()].copy_from_slice(location.as_slice());
    bytes[location.len()] = slot;
    Stem(bytes)
}

/// An internal node with one loaded stem child, one stored stem child, and
/// one stored internal child.
fn sample_internal(location: NodeLocation) -> InternalNode {
    let mut node = InternalNode::empty(location.clone());
    node.set_commitment(commitment(1), scalar(2));

    let stem = stem_at(&location, 4, 0x44);
    let mut stem_child = StemNode::empty(stem, location.child(4));
    stem_child.set_leaf(9, TrieValue::from_u64(90));
    stem_child.set_commitment(commitment(3), scalar(4));
    node.set_child(4, VerkleNode::Stem(Box::new(stem_child)));

    node.set_child(
        7,
        VerkleNode::StoredStem(StoredStemNode::new(
            location.child(7),
            stem_at(&location, 7, 0x77),
            Some(scalar(5)),
        )),
    );
    node.set_child(
        200,
        VerkleNode::StoredInternal(StoredInternalNode::new(location.child(200), Some(scalar(6)))),
    );
    node
}

#[test]
fn internal_node_round_trips_with_lazy_children() {
    let location = NodeLocation::new(vec![0x10]);
    let node = sample_internal(location.clone());
    let bytes = encode_internal(&node, false).unwrap();
    let decoded = decode_internal(&location, *node.hash(), &bytes).unwrap();

    assert_eq!(decoded.location(), &location);
    assert_eq!(decoded.commitment(), node.commitment());
    assert_eq!(decoded.hash(), node.hash());
    assert!(!decoded.is_dirty());

    // The loaded stem child decodes to a placeholder carrying its stem and
    // committed scalar.
    assert_eq!(
        decoded.child(4),
        &VerkleNode::StoredStem(StoredStemNode::new(
            location.child(4),
            stem_at(&location, 4, 0x44),
            Some(scalar(4)),
        ))
    );
    assert_eq!(decoded.child(7), node.child(7));
    assert_eq!(decoded.child(200), node.child(200));
    assert_eq!(decoded.child(0), &VerkleNode::Null);
}

#[test]
fn root_node_round_trips_with_its_own_hash() {
    let location = NodeLocation::root();
    let node = sample_internal(location.clone());
    let bytes = encode_internal(&node, true).unwrap();

    // The root payload carries the hash; no hint is needed.
    let decoded = decode_root(&location, &bytes).unwrap();
    assert_eq!(decoded.hash(), node.hash());
    assert_eq!(decoded.commitment(), node.commitment());
}

#[test]
fn stem_node_round_trips() {
    let mut stem_bytes = [0xAB; 31];
    stem_bytes[0] = 0x01;
    let stem = Stem(stem_bytes);
    let mut node = StemNode::empty(stem, stem.prefix(1));
    node.set_leaf(0, TrieValue::from_u64(1));
    node.set_leaf(127, TrieValue::from_u64(2));
    node.set_leaf(128, TrieValue::ZERO);
    node.set_leaf(255, TrieValue::from_u64(4));
    node.set_left(commitment(10), scalar(11));
    node.set_right(commitment(12), scalar(13));
    node.set_commitment(commitment(14), scalar(15));

    let bytes = encode_stem(&node).unwrap();
    let decoded = decode_stem(&stem, *node.hash(), &bytes).unwrap();

    assert_eq!(decoded.location(), node.location());
    assert_eq!(decoded.stem(), &stem);
    assert_eq!(decoded.commitment(), node.commitment());
    assert_eq!(decoded.left_commitment(), node.left_commitment());
    assert_eq!(decoded.right_commitment(), node.right_commitment());
    assert_eq!(decoded.left_scalar(), node.left_scalar());
    assert_eq!(decoded.right_scalar(), node.right_scalar());
    assert!(!decoded.is_dirty());

    assert_eq!(decoded.value(0), Some(&TrieValue::from_u64(1)));
    assert_eq!(decoded.value(127), Some(&TrieValue::from_u64(2)));
    // A present all-zero value survives, distinct from an absent slot.
    assert_eq!(decoded.value(128), Some(&TrieValue::ZERO));
    assert_eq!(decoded.value(255), Some(&TrieValue::from_u64(4)));
    assert_eq!(decoded.value(1), None);
    assert_eq!(decoded.children(), node.children());
}

#[test]
fn truncated_payloads_are_malformed() {
    let location = NodeLocation::new(vec![0x10]);
    let node = sample_internal(location.clone());
    let mut bytes = encode_internal(&node, false).unwrap();
    bytes.truncate(bytes.len() / 2);

    assert_matches!(
        decode_internal(&location, scalar(0), &bytes),
        Err(VerkleTrieError::MalformedNode { location: at, .. }) if at == location
    );
}

#[test]
fn internal_payload_is_not_a_root_payload() {
    let location = NodeLocation::root();
    let node = sample_internal(location.clone());
    let bytes = encode_internal(&node, false).unwrap();
    assert_matches!(decode_root(&location, &bytes), Err(VerkleTrieError::MalformedNode { .. }));
}

#[test]
fn stem_depth_out_of_range_is_malformed() {
    let stem = Stem([1; 31]);
    let mut node = StemNode::empty(stem, stem.prefix(1));
    node.set_leaf(3, TrieValue::from_u64(3));
    let good = encode_stem(&node).unwrap();
    let decoded = decode_stem(&stem, scalar(0), &good).unwrap();
    assert_eq!(decoded.location().len(), 1);

    // Depth zero would place a stem at the root.
    let mut zero_depth = node.clone();
    zero_depth.relocate(stem.prefix(0));
    let bytes = encode_stem(&zero_depth).unwrap();
    assert_matches!(
        decode_stem(&stem, scalar(0), &bytes),
        Err(VerkleTrieError::MalformedNode { .. })
    );
}

#[test]
fn leaf_payload_is_the_raw_value() {
    let mut key_bytes = [7; 32];
    key_bytes[31] = 9;
    let location = NodeLocation::from(key_bytes.as_slice());
    let value = TrieValue::from_u64(1234);

    let leaf = decode_leaf(&location, &value.0).unwrap();
    assert_eq!(leaf.key.0, key_bytes);
    assert_eq!(leaf.value, value);

    assert_matches!(
        decode_leaf(&location, &value.0[..16]),
        Err(VerkleTrieError::MalformedNode { .. })
    );
}
