use crate::backend::{Backend, HashBackend, LinkedHashBackend, TreeBackend};
use crate::config::{CodecConfig, Config};
use crate::dirty::DirtyTracker;
use crate::hash::ShardHash;
use crate::shard::Shard;
use crate::stats::Stats;
use std::fmt;
use std::hash::Hash;

/// Concurrent sharded map.
///
/// Splits your data across a power-of-two number of shards, each with its own
/// read-write lock. Operations on a single key lock exactly one shard.
///
/// # Consistency
///
/// Aggregate operations (`len`, `is_empty`, `keys`, `values`, `clear`, `iter`
/// and serialization) visit shards one at a time and never hold two shard
/// locks at once. They are not point-in-time snapshots: under concurrent
/// writes the result can mix states from before and after those writes.
/// Taking a map-wide lock would bring back the contention sharding removes.
///
/// # Example
///
/// ```rust
/// use shardstore::ShardMap;
///
/// let map = ShardMap::new();
/// map.put("key1", "value1");
///
/// if let Some(value) = map.get(&"key1") {
///     println!("Found: {}", value);
/// }
/// ```
pub struct ShardMap<K, V, B = HashBackend<K, V>> {
    pub(crate) shards: Box<[Shard<K, V, B>]>,
    shard_mask: u32,
    hash: fn(&K) -> u32,
    pub(crate) dirty: DirtyTracker,
    pub(crate) codec: CodecConfig<K, V>,
}

impl<K, V> ShardMap<K, V, HashBackend<K, V>>
where
    K: ShardHash + Hash + Eq,
{
    /// Create a hash-backed map with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K, V> ShardMap<K, V, TreeBackend<K, V>>
where
    K: ShardHash + Ord,
{
    /// Create a map whose shards keep their keys sorted.
    pub fn new_tree() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K, V> ShardMap<K, V, LinkedHashBackend<K, V>>
where
    K: ShardHash + Hash + Eq + Clone,
{
    /// Create a map whose shards keep insertion order.
    pub fn new_linked() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K, V, B> ShardMap<K, V, B>
where
    K: ShardHash,
    B: Backend<K, V>,
{
    /// Create a new map with custom config.
    pub fn with_config(config: Config<K, V>) -> Self {
        let shard_count = config.shard_count;
        debug_assert!(shard_count.is_power_of_two());

        let shards = (0..shard_count).map(|_| Shard::new()).collect();

        Self {
            shards,
            shard_mask: (shard_count - 1) as u32,
            hash: <K as ShardHash>::shard_hash,
            dirty: DirtyTracker::new(),
            codec: config.codec,
        }
    }

    /// Figure out which shard this key belongs to.
    #[inline]
    fn shard_index(&self, key: &K) -> usize {
        route((self.hash)(key), self.shard_mask)
    }

    #[inline]
    pub(crate) fn shard(&self, key: &K) -> &Shard<K, V, B> {
        &self.shards[self.shard_index(key)]
    }

    /// Index of the shard `key` is stored in. Stable for the map's lifetime.
    pub fn shard_of(&self, key: &K) -> usize {
        self.shard_index(key)
    }

    /// Number of shards (always a power of two).
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Insert a key-value pair. Returns the overwritten value, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// assert!(map.put("key", "value").is_none());
    /// assert_eq!(map.put("key", "new_value"), Some("value"));
    /// assert!(map.is_dirty());
    /// ```
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let previous = self.shard(&key).put(key, value);
        self.dirty.mark_dirty();
        previous
    }

    /// Get a clone of the value stored under `key`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.put("key", 7);
    /// assert_eq!(map.get(&"key"), Some(7));
    /// assert_eq!(map.get(&"other"), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.shard(key).get(key)
    }

    /// Borrow the value stored under `key` for the duration of `f`.
    ///
    /// `f` runs under the shard's read lock and must not call back into this
    /// map at all. A write on the same shard deadlocks, and so can a second
    /// read while a writer is queued on that shard.
    pub fn with_value<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.shard(key).with_value(key, f)
    }

    /// Check if a key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Remove a key, returning its value if it existed.
    ///
    /// Removing an absent key does not mark the map dirty.
    pub fn remove(&self, key: &K) -> Option<V> {
        let removed = self.shard(key).remove(key);
        if removed.is_some() {
            self.dirty.mark_dirty();
        }
        removed
    }

    /// Mutate a value in place. Returns `false` if the key was absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.put("counter", 0);
    ///
    /// assert!(map.update(&"counter", |v| *v += 1));
    /// assert_eq!(map.get(&"counter"), Some(1));
    /// ```
    pub fn update<F>(&self, key: &K, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let updated = self.shard(key).update(key, f);
        if updated {
            self.dirty.mark_dirty();
        }
        updated
    }

    /// Total number of entries, summed shard by shard.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Check if the map is empty. Stops at the first non-empty shard.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Remove every entry, one shard at a time. Always marks the map dirty.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.clear();
        }
        self.dirty.mark_dirty();
    }

    /// All keys, shard by shard in backend order.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::new();
        for shard in self.shards.iter() {
            keys.extend(shard.keys());
        }
        keys
    }

    /// All values, shard by shard in backend order.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let mut values = Vec::new();
        for shard in self.shards.iter() {
            values.extend(shard.values());
        }
        values
    }

    /// Whether the map changed since it was last saved or loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Get entry counts per shard.
    pub fn stats(&self) -> Stats {
        let shard_sizes: Vec<usize> = self.shards.iter().map(|s| s.len()).collect();
        let size = shard_sizes.iter().sum();

        Stats { size, shard_sizes }
    }

    /// Iterate over all key-value pairs.
    ///
    /// Entries are copied out one shard at a time while that shard's read lock
    /// is held. Writes to shards not yet visited are observed, writes to
    /// already visited shards are not.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.put("key1", "value1");
    /// map.put("key2", "value2");
    ///
    /// assert_eq!(map.iter().count(), 2);
    /// ```
    pub fn iter(&self) -> crate::iter::Iter<'_, K, V, B>
    where
        K: Clone,
        V: Clone,
    {
        crate::iter::Iter::new(&self.shards)
    }
}

/// Shard index for `hash` under `mask`. Masking, never modulo.
#[inline]
pub(crate) fn route(hash: u32, mask: u32) -> usize {
    (hash & mask) as usize
}

impl<K, V> Default for ShardMap<K, V, HashBackend<K, V>>
where
    K: ShardHash + Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, B> fmt::Debug for ShardMap<K, V, B>
where
    K: ShardHash + fmt::Debug,
    V: fmt::Debug,
    B: Backend<K, V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ShardMap:")?;
        for (index, shard) in self.shards.iter().enumerate() {
            if shard.is_empty() {
                continue;
            }
            write!(f, "- Shard {}: ", index)?;
            let mut entries = f.debug_map();
            shard.for_each(|key, value| {
                entries.entry(key, value);
            });
            entries.finish()?;
            writeln!(f)?;
        }
        Ok(())
    }
}
