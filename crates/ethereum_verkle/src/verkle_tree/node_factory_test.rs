use assert_matches::assert_matches;
use ethereum_verkle_storage::map_storage::MapStorage;
use ethereum_verkle_storage::storage_trait::{DbKey, DbValue, NodeHash, Storage};
use pretty_assertions::assert_eq;

use crate::crypto::types::Scalar;
use crate::test_utils::{key_of, new_test_trie};
use crate::verkle_tree::errors::VerkleTrieError;
use crate::verkle_tree::node::{StoredInternalNode, StoredStemNode, VerkleNode};
use crate::verkle_tree::node_factory::NodeFactory;
use crate::verkle_tree::types::{NodeLocation, Stem, TrieValue};

/// Builds storage holding a persisted one-stem trie and returns it with the
/// root hash.
fn persisted_storage() -> (MapStorage, Scalar) {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[5], 1), TrieValue::from_u64(11)).unwrap();
    trie.persist().unwrap();
    let root_hash = trie.root_hash();
    (trie.into_storage(), root_hash)
}

#[test]
fn a_storage_miss_is_none() {
    let factory = NodeFactory::new(MapStorage::default());
    assert_matches!(factory.retrieve(&NodeLocation::root(), None), Ok(None));
}

#[test]
fn retrieves_the_root_by_empty_location() {
    let (storage, root_hash) = persisted_storage();
    let factory = NodeFactory::new(storage);

    let root = factory.retrieve(&NodeLocation::root(), None).unwrap().unwrap();
    assert_matches!(&root, VerkleNode::Root(node) if *node.hash() == root_hash);
}

#[test]
fn retrieves_a_stem_by_its_full_stem() {
    let (storage, _) = persisted_storage();
    let factory = NodeFactory::new(storage);

    let VerkleNode::Root(root) = factory.retrieve(&NodeLocation::root(), None).unwrap().unwrap()
    else {
        panic!("expected the root node");
    };
    let VerkleNode::StoredStem(stored) = root.child(5) else {
        panic!("expected a stored stem at slot 5");
    };

    let stem_location = NodeLocation::from(stored.stem().0.as_slice());
    let node = factory.retrieve(&stem_location, stored.hash().as_ref()).unwrap().unwrap();
    assert_matches!(
        &node,
        VerkleNode::Stem(stem_node) if stem_node.value(1) == Some(&TrieValue::from_u64(11))
    );
}

#[test]
fn over_long_locations_are_rejected() {
    let mut storage = MapStorage::default();
    let location = vec![0; 33];
    storage
        .put_node(DbKey(location.clone()), NodeHash([0; 32]), DbValue(vec![1, 2, 3]))
        .unwrap();
    let factory = NodeFactory::new(storage);

    assert_matches!(
        factory.retrieve(&NodeLocation::new(location), None),
        Err(VerkleTrieError::UnknownLocationLength(33))
    );
}

#[test]
fn loading_an_unreferenced_placeholder_is_a_storage_miss() {
    let factory = NodeFactory::new(MapStorage::default());
    let internal = StoredInternalNode::new(NodeLocation::new(vec![1]), Some(Scalar::ZERO));
    assert_matches!(
        factory.load_internal(&internal),
        Err(VerkleTrieError::StorageMiss { location }) if location == NodeLocation::new(vec![1])
    );

    let stem = StoredStemNode::new(NodeLocation::new(vec![1]), Stem([1; 31]), Some(Scalar::ZERO));
    assert_matches!(factory.load_stem(&stem), Err(VerkleTrieError::StorageMiss { .. }));
}

#[test]
fn non_root_nodes_require_the_committed_hash() {
    let (storage, _) = persisted_storage();
    let factory = NodeFactory::new(storage);
    let VerkleNode::Root(root) = factory.retrieve(&NodeLocation::root(), None).unwrap().unwrap()
    else {
        panic!("expected the root node");
    };
    let VerkleNode::StoredStem(stored) = root.child(5) else {
        panic!("expected a stored stem at slot 5");
    };

    let stem_location = NodeLocation::from(stored.stem().0.as_slice());
    assert_matches!(
        factory.retrieve(&stem_location, None),
        Err(VerkleTrieError::MalformedNode { .. })
    );
}
