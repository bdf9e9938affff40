//! Storage backends a shard delegates to.
//!
//! A backend is a plain single-threaded map. Locking lives in the shard, so a
//! backend never needs interior synchronization.

use std::collections::BTreeMap;
use std::hash::Hash;

use ahash::RandomState;
use hashbrown::HashMap;

/// Map capability every shard backend provides.
pub trait Backend<K, V> {
    /// Create an empty backend.
    fn new() -> Self
    where
        Self: Sized;

    /// Insert or overwrite, returning the previous value.
    fn put(&mut self, key: K, value: V) -> Option<V>;

    /// Look up a value.
    fn get(&self, key: &K) -> Option<&V>;

    /// Look up a value for in-place mutation.
    fn get_mut(&mut self, key: &K) -> Option<&mut V>;

    /// Remove a key, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the backend holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&mut self);

    /// Enumerate entries in the backend's own order.
    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_>;
}

/// Unordered backend on top of `hashbrown` with `ahash`.
pub struct HashBackend<K, V> {
    map: HashMap<K, V, RandomState>,
}

impl<K, V> Backend<K, V> for HashBackend<K, V>
where
    K: Hash + Eq,
{
    fn new() -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
        }
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.map.iter())
    }
}

/// Key-ordered backend on top of `BTreeMap`.
pub struct TreeBackend<K, V> {
    map: BTreeMap<K, V>,
}

impl<K, V> Backend<K, V> for TreeBackend<K, V>
where
    K: Ord,
{
    fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(self.map.iter())
    }
}

/// Insertion-ordered backend.
///
/// Each key carries a sequence number assigned on first insertion; overwriting
/// an existing key keeps its position.
pub struct LinkedHashBackend<K, V> {
    entries: HashMap<K, (u64, V), RandomState>,
    order: BTreeMap<u64, K>,
    next_seq: u64,
}

impl<K, V> Backend<K, V> for LinkedHashBackend<K, V>
where
    K: Hash + Eq + Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(RandomState::new()),
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn put(&mut self, key: K, value: V) -> Option<V> {
        if let Some((_, slot)) = self.entries.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        self.entries.insert(key, (seq, value));
        None
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(_, value)| value)
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key).map(|(_, value)| value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (seq, value) = self.entries.remove(key)?;
        self.order.remove(&seq);
        Some(value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.next_seq = 0;
    }

    fn iter(&self) -> Box<dyn Iterator<Item = (&K, &V)> + '_> {
        Box::new(
            self.order
                .values()
                .filter_map(move |key| self.entries.get_key_value(key).map(|(k, (_, v))| (k, v))),
        )
    }
}
