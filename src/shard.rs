use crate::backend::Backend;
use parking_lot::RwLock;
use std::marker::PhantomData;

/// A single shard: one backend map behind its own read-write lock.
///
/// Mutations take the write lock, reads take the read lock. Nothing here ever
/// touches a second shard or the map-wide dirty tracker.
pub(crate) struct Shard<K, V, B> {
    map: RwLock<B>,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V, B> Shard<K, V, B>
where
    B: Backend<K, V>,
{
    pub fn new() -> Self {
        Self {
            map: RwLock::new(B::new()),
            _entries: PhantomData,
        }
    }

    /// Insert a key-value pair, returning the previous value if any.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.map.write().put(key, value)
    }

    /// Clone out the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.read().get(key).cloned()
    }

    /// Run `f` against the stored value while holding the read lock.
    pub fn with_value<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.map.read().get(key).map(f)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read().get(key).is_some()
    }

    /// Remove a key. Returns `None` without touching the backend when the key
    /// is absent, so callers can tell a real removal from a no-op.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut map = self.map.write();
        if map.get(key).is_none() {
            return None;
        }
        map.remove(key)
    }

    /// Mutate a value in place, returning whether the key existed.
    pub fn update<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut map = self.map.write();
        match map.get_mut(key) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    pub fn clear(&self) {
        self.map.write().clear();
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.map.read().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.map.read().iter().map(|(_, v)| v.clone()).collect()
    }

    /// Visit every entry in backend order under a single read lock.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let map = self.map.read();
        for (key, value) in map.iter() {
            f(key, value);
        }
    }
}

impl<K, V, B> Default for Shard<K, V, B>
where
    B: Backend<K, V>,
{
    fn default() -> Self {
        Self::new()
    }
}
