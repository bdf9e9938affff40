//! Multi-key convenience operations.
//!
//! Each key is handled as an independent single-key operation; a batch is not
//! atomic.

use crate::backend::Backend;
use crate::hash::ShardHash;
use crate::shardmap::ShardMap;

impl<K, V, B> ShardMap<K, V, B>
where
    K: ShardHash,
    B: Backend<K, V>,
{
    /// Look up several keys, returning the pairs that were found.
    pub fn get_multiple<'k, I>(&self, keys: I) -> Vec<(K, V)>
    where
        I: IntoIterator<Item = &'k K>,
        K: Clone + 'k,
        V: Clone,
    {
        keys.into_iter()
            .filter_map(|key| self.get(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Remove several keys, returning how many were present.
    pub fn remove_multiple<'k, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'k K>,
        K: 'k,
    {
        keys.into_iter()
            .filter(|key| self.remove(key).is_some())
            .count()
    }

    /// Insert every pair.
    pub fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }
}
