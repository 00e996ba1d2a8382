use assert_matches::assert_matches;
use ethereum_verkle_storage::map_storage::MapStorage;
use ethereum_verkle_storage::storage_trait::DbKey;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use crate::crypto::committer::VectorCommitter;
use crate::test_utils::{key_of, new_test_trie, MockCommitter};
use crate::verkle_tree::errors::VerkleTrieError;
use crate::verkle_tree::node::VerkleNode;
use crate::verkle_tree::trie::VerkleTrie;
use crate::verkle_tree::types::{NodeLocation, TrieKey, TrieValue};
use crate::verkle_tree::visitor::NodeVisitor;

#[derive(Debug, Default)]
struct KindCounter {
    roots: usize,
    internals: usize,
    stems: usize,
    leaves: usize,
}

impl NodeVisitor for KindCounter {
    fn visit(&mut self, node: &VerkleNode, _location: &NodeLocation) {
        match node {
            VerkleNode::Root(_) => self.roots += 1,
            VerkleNode::Internal(_) => self.internals += 1,
            VerkleNode::Stem(_) => self.stems += 1,
            VerkleNode::Leaf(_) => self.leaves += 1,
            _ => {}
        }
    }
}

fn count_kinds(trie: &mut VerkleTrie<MapStorage, MockCommitter>) -> KindCounter {
    let mut counter = KindCounter::default();
    trie.visit(&mut counter).unwrap();
    counter
}

fn batch_built(entries: &[(TrieKey, TrieValue)]) -> VerkleTrie<MapStorage, MockCommitter> {
    let mut trie = new_test_trie();
    trie.put_batch(entries).unwrap();
    trie
}

/// Inserting into an empty trie creates one stem below the root.
#[test]
fn first_insert_creates_a_single_stem() {
    let mut trie = new_test_trie();
    let empty_root = trie.root_hash();

    trie.put(&key_of(&[], 0), TrieValue::from_u64(1)).unwrap();

    assert_ne!(trie.root_hash(), empty_root);
    assert_eq!(trie.get(&key_of(&[], 0)).unwrap(), Some(TrieValue::from_u64(1)));
    let kinds = count_kinds(&mut trie);
    assert_eq!(kinds.roots, 1);
    assert_eq!(kinds.internals, 0);
    assert_eq!(kinds.stems, 1);
    assert_eq!(kinds.leaves, 1);
}

/// A second suffix under the same stem populates the same stem node.
#[test]
fn same_stem_inserts_share_the_stem_node() {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[], 0), TrieValue::from_u64(1)).unwrap();
    let after_first = trie.root_hash();

    trie.put(&key_of(&[], 1), TrieValue::from_u64(2)).unwrap();

    assert_ne!(trie.root_hash(), after_first);
    let kinds = count_kinds(&mut trie);
    assert_eq!(kinds.stems, 1);
    assert_eq!(kinds.leaves, 2);
    assert_eq!(trie.get(&key_of(&[], 0)).unwrap(), Some(TrieValue::from_u64(1)));
    assert_eq!(trie.get(&key_of(&[], 1)).unwrap(), Some(TrieValue::from_u64(2)));

    // The incremental root equals one built in a single batch.
    let batch = batch_built(&[
        (key_of(&[], 0), TrieValue::from_u64(1)),
        (key_of(&[], 1), TrieValue::from_u64(2)),
    ]);
    assert_eq!(trie.root_hash(), batch.root_hash());
}

/// Stems differing in their first byte sit in distinct root slots; no
/// intermediate internal node appears.
#[test]
fn stems_differing_at_byte_zero_share_the_root() {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[0], 0), TrieValue::from_u64(1)).unwrap();
    let after_first = trie.root_hash();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(3)).unwrap();

    assert_ne!(trie.root_hash(), after_first);
    let kinds = count_kinds(&mut trie);
    assert_eq!(kinds.internals, 0);
    assert_eq!(kinds.stems, 2);
}

/// Colliding stems branch through exactly `k` fresh internal nodes when they
/// first differ at byte `k`, and the result matches a batch-built trie.
#[rstest]
#[case::diverge_at_one(1)]
#[case::diverge_at_three(3)]
#[case::diverge_at_thirty(30)]
fn extend_builds_one_chain_per_divergence(#[case] divergence: usize) {
    let shared = vec![9; divergence];
    let mut first_stem = shared.clone();
    first_stem.push(1);
    let mut second_stem = shared.clone();
    second_stem.push(2);

    let first = (key_of(&first_stem, 0), TrieValue::from_u64(1));
    let second = (key_of(&second_stem, 0), TrieValue::from_u64(2));

    let mut trie = new_test_trie();
    trie.put(&first.0, first.1).unwrap();
    trie.put(&second.0, second.1).unwrap();

    let kinds = count_kinds(&mut trie);
    assert_eq!(kinds.internals, divergence);
    assert_eq!(kinds.stems, 2);

    assert_eq!(trie.get(&first.0).unwrap(), Some(first.1));
    assert_eq!(trie.get(&second.0).unwrap(), Some(second.1));
    assert_eq!(trie.root_hash(), batch_built(&[first, second]).root_hash());
}

/// The moved stem keeps answering lookups after an extend.
#[test]
fn extend_keeps_the_existing_stem_reachable() {
    let mut trie = new_test_trie();
    let old_key = key_of(&[5, 5, 5, 1], 7);
    let new_key = key_of(&[5, 5, 5, 2], 7);
    trie.put(&old_key, TrieValue::from_u64(70)).unwrap();
    trie.put(&new_key, TrieValue::from_u64(71)).unwrap();

    assert_eq!(trie.get(&old_key).unwrap(), Some(TrieValue::from_u64(70)));
    assert_eq!(trie.get(&new_key).unwrap(), Some(TrieValue::from_u64(71)));
}

/// 256 stems sharing 30 leading bytes: a full chain of internal nodes, then
/// one branching node whose every slot holds a stem. Flatten returns the
/// keys in order.
#[test]
fn deep_shared_prefix_fans_out_at_the_last_byte() {
    let shared = [3; 30];
    let mut entries = Vec::new();
    for last in 0..=u8::MAX {
        let mut stem = shared.to_vec();
        stem.push(last);
        entries.push((key_of(&stem, last), TrieValue::from_u64(u64::from(last))));
    }

    let mut trie = new_test_trie();
    for (key, value) in &entries {
        trie.put(key, *value).unwrap();
    }

    let kinds = count_kinds(&mut trie);
    assert_eq!(kinds.internals, 30);
    assert_eq!(kinds.stems, 256);

    let flattened = trie.flatten().unwrap();
    let mut expected = entries.clone();
    expected.sort_by_key(|(key, _)| *key);
    assert_eq!(flattened, expected);

    assert_eq!(trie.root_hash(), batch_built(&entries).root_hash());
}

/// The last value written wins, regardless of earlier writes.
#[test]
fn get_returns_the_last_write() {
    let mut rng = StdRng::seed_from_u64(0xE7);
    let mut trie = new_test_trie();
    let mut expected = std::collections::BTreeMap::new();

    for round in 0..300u64 {
        // A small stem alphabet forces plenty of same-stem overwrites and
        // extends.
        let stem = vec![rng.gen_range(0..4u8), rng.gen_range(0..4u8)];
        let suffix = rng.gen_range(0..8u8);
        let key = key_of(&stem, suffix);
        let value = TrieValue::from_u64(round);
        trie.put(&key, value).unwrap();
        expected.insert(key, value);
    }

    for (key, value) in &expected {
        assert_eq!(trie.get(key).unwrap(), Some(*value), "mismatch for {key}");
    }
    assert_eq!(trie.flatten().unwrap(), expected.into_iter().collect::<Vec<_>>());
}

/// The root hash is independent of insertion order.
#[test]
fn root_hash_is_order_independent() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut entries = Vec::new();
    for index in 0..64u64 {
        let stem = vec![rng.gen_range(0..3u8), rng.gen_range(0..3u8), rng.gen_range(0..3u8)];
        entries.push((key_of(&stem, rng.gen_range(0..=u8::MAX)), TrieValue::from_u64(index)));
    }
    // Deduplicate keys so insertion order cannot change the final state.
    entries.sort_by_key(|(key, _)| *key);
    entries.dedup_by_key(|(key, _)| *key);

    let mut forward = new_test_trie();
    for (key, value) in &entries {
        forward.put(key, *value).unwrap();
    }

    let mut shuffled = entries.clone();
    shuffled.shuffle(&mut rng);
    let mut backward = new_test_trie();
    for (key, value) in &shuffled {
        backward.put(key, *value).unwrap();
    }

    assert_eq!(forward.root_hash(), backward.root_hash());
    assert_eq!(forward.root_hash(), batch_built(&entries).root_hash());
}

/// After every commit, `scalar_of(C) == H` on each committed node.
#[test]
fn commitments_project_to_hashes() {
    #[derive(Debug, Default)]
    struct ProjectionChecker {
        checked: usize,
    }

    impl NodeVisitor for ProjectionChecker {
        fn visit(&mut self, node: &VerkleNode, location: &NodeLocation) {
            if let (Some(commitment), Some(hash)) = (node.commitment(), node.hash()) {
                let projected = MockCommitter.scalar_of(commitment).unwrap();
                assert_eq!(projected, hash, "stale hash at {location}");
                self.checked += 1;
            }
        }
    }

    let mut trie = new_test_trie();
    for seed in 0..40u8 {
        trie.put(&key_of(&[seed % 5, seed % 3], seed), TrieValue::from_u64(u64::from(seed)))
            .unwrap();
    }
    trie.commit_root();

    let mut checker = ProjectionChecker::default();
    trie.visit(&mut checker).unwrap();
    // Root plus at least one stem.
    assert!(checker.checked >= 2);
}

/// Inserting then removing a key restores the empty trie's root hash.
#[test]
fn insert_then_remove_restores_the_root() {
    let mut trie = new_test_trie();
    let empty_root = trie.root_hash();

    let key = key_of(&[4, 2], 9);
    trie.put(&key, TrieValue::from_u64(77)).unwrap();
    assert_ne!(trie.root_hash(), empty_root);

    trie.remove(&key).unwrap();
    assert_eq!(trie.root_hash(), empty_root);
    assert_eq!(trie.get(&key).unwrap(), None);
}

/// Removing one suffix keeps the stem's other values intact.
#[test]
fn remove_clears_only_its_suffix() {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(1)).unwrap();
    trie.put(&key_of(&[1], 1), TrieValue::from_u64(2)).unwrap();

    trie.remove(&key_of(&[1], 0)).unwrap();

    assert_eq!(trie.get(&key_of(&[1], 0)).unwrap(), None);
    assert_eq!(trie.get(&key_of(&[1], 1)).unwrap(), Some(TrieValue::from_u64(2)));

    // The surviving state hashes like a trie that never held the removed
    // key.
    let batch = batch_built(&[(key_of(&[1], 1), TrieValue::from_u64(2))]);
    assert_eq!(trie.root_hash(), batch.root_hash());
}

/// Removing a key that was never inserted changes nothing.
#[rstest]
#[case::missing_stem(key_of(&[200], 0))]
#[case::missing_suffix(key_of(&[1], 99))]
fn remove_of_absent_keys_is_a_no_op(#[case] absent: TrieKey) {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(5)).unwrap();
    let root = trie.root_hash();

    trie.remove(&absent).unwrap();
    assert_eq!(trie.root_hash(), root);
}

/// Batch insertion agrees with pointwise insertion, including duplicate
/// keys where the last pair wins.
#[test]
fn batch_put_agrees_with_pointwise_put() {
    let mut rng = StdRng::seed_from_u64(0xBA7C4);
    let mut entries = Vec::new();
    for index in 0..80u64 {
        let stem =
            vec![rng.gen_range(0..4u8), rng.gen_range(0..4u8), rng.gen_range(0..2u8)];
        entries.push((key_of(&stem, rng.gen_range(0..16u8)), TrieValue::from_u64(index)));
    }

    let mut pointwise = new_test_trie();
    for (key, value) in &entries {
        pointwise.put(key, *value).unwrap();
    }
    let batch = batch_built(&entries);

    assert_eq!(batch.root_hash(), pointwise.root_hash());
}

/// An updated value replaces the committed contribution of the old one.
#[test]
fn overwrites_replace_the_old_contribution() {
    let key = key_of(&[8], 3);
    let mut trie = new_test_trie();
    trie.put(&key, TrieValue::from_u64(1)).unwrap();
    trie.put(&key, TrieValue::from_u64(2)).unwrap();

    let direct = batch_built(&[(key, TrieValue::from_u64(2))]);
    assert_eq!(trie.root_hash(), direct.root_hash());
    assert_eq!(trie.get(&key).unwrap(), Some(TrieValue::from_u64(2)));
}

/// A present all-zero value is distinct from an absent slot.
#[test]
fn zero_value_differs_from_absence() {
    let key = key_of(&[3], 0);
    let mut with_zero = new_test_trie();
    with_zero.put(&key, TrieValue::ZERO).unwrap();

    let empty = new_test_trie();
    assert_ne!(with_zero.root_hash(), empty.root_hash());
    assert_eq!(with_zero.get(&key).unwrap(), Some(TrieValue::ZERO));
}

/// A persisted trie reopens lazily and answers like the original.
#[test]
fn persist_and_reopen_round_trips() {
    let mut entries = Vec::new();
    for index in 0..48u8 {
        entries.push((
            key_of(&[index % 6, index % 4, index], index),
            TrieValue::from_u64(u64::from(index)),
        ));
    }

    let mut trie = new_test_trie();
    for (key, value) in &entries {
        trie.put(key, *value).unwrap();
    }
    trie.persist().unwrap();
    let root = trie.root_hash();
    let expected = trie.flatten().unwrap();

    let mut reopened = VerkleTrie::open(trie.into_storage(), MockCommitter).unwrap();
    assert_eq!(reopened.root_hash(), root);
    for (key, value) in &entries {
        assert_eq!(reopened.get(key).unwrap(), Some(*value));
    }
    assert_eq!(reopened.flatten().unwrap(), expected);
}

/// Mutations after a reload keep the root consistent with a fresh build.
#[test]
fn mutating_a_reloaded_trie_matches_a_fresh_build() {
    let first = (key_of(&[1, 2, 3], 0), TrieValue::from_u64(1));
    let second = (key_of(&[1, 2, 4], 0), TrieValue::from_u64(2));

    let mut trie = new_test_trie();
    trie.put(&first.0, first.1).unwrap();
    trie.persist().unwrap();

    let mut reopened = VerkleTrie::open(trie.into_storage(), MockCommitter).unwrap();
    reopened.put(&second.0, second.1).unwrap();

    assert_eq!(reopened.root_hash(), batch_built(&[first, second]).root_hash());
}

/// Persisting twice without changes rewrites nothing.
#[test]
fn persist_skips_clean_subtrees() {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(1)).unwrap();
    trie.persist().unwrap();
    let written = trie.storage().len();

    trie.persist().unwrap();
    assert_eq!(trie.storage().len(), written);
}

/// A referenced node vanishing from storage surfaces as a storage miss.
#[test]
fn a_dangling_reference_is_a_storage_miss() {
    let mut trie = new_test_trie();
    let key = key_of(&[6, 6], 0);
    trie.put(&key, TrieValue::from_u64(1)).unwrap();
    trie.persist().unwrap();

    let mut storage = trie.into_storage();
    storage.storage.remove(&DbKey(key.stem().0.to_vec()));

    let mut reopened = VerkleTrie::open(storage, MockCommitter).unwrap();
    assert_matches!(reopened.get(&key), Err(VerkleTrieError::StorageMiss { .. }));
}

/// Reopening materializes nodes only as queries touch them.
#[test]
fn reopened_tries_materialize_lazily() {
    #[derive(Debug, Default)]
    struct StoredCounter {
        stored: usize,
        stems: usize,
    }

    impl NodeVisitor for StoredCounter {
        fn visit(&mut self, node: &VerkleNode, _location: &NodeLocation) {
            match node {
                VerkleNode::StoredInternal(_) | VerkleNode::StoredStem(_) => self.stored += 1,
                VerkleNode::Stem(_) => self.stems += 1,
                _ => {}
            }
        }
    }

    let mut trie = new_test_trie();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(1)).unwrap();
    trie.put(&key_of(&[2], 0), TrieValue::from_u64(2)).unwrap();
    trie.persist().unwrap();
    let mut reopened = VerkleTrie::open(trie.into_storage(), MockCommitter).unwrap();

    // Fresh from storage, both stems are placeholders.
    assert_eq!(reopened.root().location(), Some(&NodeLocation::root()));
    let mut counter = StoredCounter::default();
    reopened.root().accept(&NodeLocation::root(), &mut counter);
    assert_eq!((counter.stored, counter.stems), (2, 0));

    // One lookup loads exactly the stem it walked through.
    assert_eq!(reopened.get(&key_of(&[1], 0)).unwrap(), Some(TrieValue::from_u64(1)));
    let mut counter = StoredCounter::default();
    reopened.root().accept(&NodeLocation::root(), &mut counter);
    assert_eq!((counter.stored, counter.stems), (1, 1));
}

/// A pruning visitor skips whole subtrees.
#[test]
fn visitors_can_prune_subtrees() {
    #[derive(Debug, Default)]
    struct RootOnly {
        visited: usize,
    }

    impl NodeVisitor for RootOnly {
        fn visit(&mut self, _node: &VerkleNode, _location: &NodeLocation) {
            self.visited += 1;
        }

        fn descend(&mut self, node: &VerkleNode, _location: &NodeLocation) -> bool {
            !matches!(node, VerkleNode::Root(_))
        }
    }

    let mut trie = new_test_trie();
    trie.put(&key_of(&[1], 0), TrieValue::from_u64(1)).unwrap();
    trie.put(&key_of(&[2], 0), TrieValue::from_u64(2)).unwrap();

    let mut visitor = RootOnly::default();
    trie.visit(&mut visitor).unwrap();
    assert_eq!(visitor.visited, 1);
}

#[test]
fn child_slot_fan_out_is_fixed() {
    use crate::verkle_tree::node::{InternalNode, StemNode};
    assert_eq!(InternalNode::MAX_CHILD, 256);
    assert_eq!(StemNode::MAX_CHILD, 256);
}

/// `commit_root` is idempotent.
#[test]
fn commit_root_is_stable() {
    let mut trie = new_test_trie();
    trie.put(&key_of(&[2], 2), TrieValue::from_u64(2)).unwrap();
    let first = trie.commit_root();
    assert_eq!(trie.commit_root(), first);
    assert_eq!(trie.root_hash(), first);
}
