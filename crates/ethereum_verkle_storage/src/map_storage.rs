use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::StorageResult;
use crate::storage_trait::{DbKey, DbValue, NodeHash, Storage};

#[cfg(test)]
#[path = "map_storage_test.rs"]
mod map_storage_test;

/// In-memory storage backed by a hash map. Keys nodes by location only and
/// ignores the integrity hash.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MapStorage {
    pub storage: HashMap<DbKey, DbValue>,
}

impl MapStorage {
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DbKey, &DbValue)> {
        self.storage.iter()
    }
}

impl Storage for MapStorage {
    fn get_node(
        &self,
        location: &DbKey,
        _hash: Option<&NodeHash>,
    ) -> StorageResult<Option<DbValue>> {
        Ok(self.storage.get(location).cloned())
    }

    fn put_node(&mut self, location: DbKey, _hash: NodeHash, value: DbValue) -> StorageResult<()> {
        self.storage.insert(location, value);
        Ok(())
    }
}

impl From<HashMap<DbKey, DbValue>> for MapStorage {
    fn from(storage: HashMap<DbKey, DbValue>) -> Self {
        Self { storage }
    }
}
