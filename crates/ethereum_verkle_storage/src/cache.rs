use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

/// Get-or-compute cache over a fallible loader.
///
/// `get_or_compute` must be linearizable: concurrent requests for the same
/// key compute at most once and every observer sees that value. A loader
/// failure is returned to the caller and caches nothing. Implementations may
/// drop entries at any time.
pub trait ComputeCache<K, V, E>: Debug {
    fn get_or_compute(&self, key: &K, loader: &mut dyn FnMut(&K) -> Result<V, E>)
    -> Result<V, E>;
}

/// Cache that never retains anything; every request runs the loader.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCache;

impl<K, V, E> ComputeCache<K, V, E> for NoOpCache {
    fn get_or_compute(
        &self,
        key: &K,
        loader: &mut dyn FnMut(&K) -> Result<V, E>,
    ) -> Result<V, E> {
        loader(key)
    }
}

/// Bounded LRU cache for single-threaded use.
#[derive(Debug)]
pub struct LruComputeCache<K: Hash + Eq, V> {
    inner: RefCell<LruCache<K, V>>,
}

impl<K: Hash + Eq, V> LruComputeCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { inner: RefCell::new(LruCache::new(capacity)) }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl<K, V, E> ComputeCache<K, V, E> for LruComputeCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone + Debug,
{
    fn get_or_compute(
        &self,
        key: &K,
        loader: &mut dyn FnMut(&K) -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.inner.borrow_mut().get(key) {
            return Ok(value.clone());
        }
        let value = loader(key)?;
        self.inner.borrow_mut().put(key.clone(), value.clone());
        Ok(value)
    }
}

/// Clonable LRU cache shareable across tries and threads. The lock is held
/// across the loader call, so each key computes at most once no matter how
/// many threads request it.
#[derive(Clone, Debug)]
pub struct SharedComputeCache<K: Hash + Eq, V> {
    inner: Arc<Mutex<LruCache<K, V>>>,
}

impl<K: Hash + Eq, V> SharedComputeCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { inner: Arc::new(Mutex::new(LruCache::new(capacity))) }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V, E> ComputeCache<K, V, E> for SharedComputeCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone + Debug,
{
    fn get_or_compute(
        &self,
        key: &K,
        loader: &mut dyn FnMut(&K) -> Result<V, E>,
    ) -> Result<V, E> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = guard.get(key) {
            return Ok(value.clone());
        }
        let value = loader(key)?;
        guard.put(key.clone(), value.clone());
        Ok(value)
    }
}
