//! The Ethereum world-state Verkle trie.
//!
//! A 256-ary trie over fixed 32-byte keys and values whose internal nodes
//! carry vector commitments instead of hashes. Mutations propagate as
//! `(index, old, new)` scalar deltas from the touched leaf up to the root,
//! so every write costs one commitment update per ancestor. The trie
//! reconstitutes itself lazily from a backing store through stored-node
//! placeholders.
//!
//! The elliptic-curve primitive (banderwagon/IPA) is external; this crate
//! talks to it only through the [`crypto::committer::VectorCommitter`]
//! facade.

pub mod config;
pub mod crypto;
#[cfg(any(feature = "testing", test))]
pub mod test_utils;
pub mod verkle_tree;
