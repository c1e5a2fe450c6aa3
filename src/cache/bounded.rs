//! Bounded LRU cache shared between callers and background tasks.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Result, SdkError};

/// A thread-safe, fixed-capacity cache with strict least-recently-used
/// eviction.
///
/// The key map and the recency order live in one [`LruCache`] behind a
/// single mutex, so every operation sees them agree.
///
/// Cloning is cheap and shares the same underlying storage.
pub struct BoundedCache<K, V>
where
    K: Hash + Eq,
{
    inner: Arc<Mutex<LruCache<K, V>>>,
    name: Arc<str>,
}

// Manual Clone implementation that doesn't require K: Clone, V: Clone
impl<K, V> Clone for BoundedCache<K, V>
where
    K: Hash + Eq,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
        }
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq,
{
    /// Create an empty cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn new(name: impl Into<Arc<str>>, capacity: usize) -> Result<Self> {
        let name = name.into();
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            SdkError::InvalidConfiguration(format!("cache '{}' capacity must be positive", name))
        })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(LruCache::new(capacity))),
            name,
        })
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace `key`, making it the most recently used entry.
    ///
    /// Returns the key that was evicted to stay within capacity, if any.
    pub fn put(&self, key: K, value: V) -> Option<K> {
        let mut guard = self.inner.lock();
        let replacing = guard.contains(&key);
        let displaced = guard.push(key, value);

        if replacing {
            return None;
        }

        let (evicted, _) = displaced?;
        trace!("Cache '{}' evicted its least recently used entry", self.name);
        Some(evicted)
    }

    /// Get a value and promote it to most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Check if a key exists without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    /// Remove a key from the cache.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().pop(key)
    }

    /// Remove all entries from the cache.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Snapshot of the tracked keys, least recently used first.
    ///
    /// The lock is released before returning, so callers may iterate and
    /// call back into the cache freely.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.lock().iter().rev().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }
}

impl<K, V> std::fmt::Debug for BoundedCache<K, V>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.lock();
        f.debug_struct("BoundedCache")
            .field("name", &self.name)
            .field("len", &guard.len())
            .field("capacity", &guard.cap())
            .finish()
    }
}
