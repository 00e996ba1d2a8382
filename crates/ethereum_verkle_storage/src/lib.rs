//! Storage traits and pluggable compute caches for the Ethereum Verkle trie.
//!
//! The trie itself never talks to a database directly; it goes through the
//! [`storage_trait::Storage`] node-loader/node-writer pair, keyed by node
//! location. [`map_storage::MapStorage`] is the in-memory implementation used
//! by tests and single-process flows.

pub mod cache;
pub mod errors;
pub mod map_storage;
pub mod storage_trait;
