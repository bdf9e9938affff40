use crate::backend::Backend;
use crate::shard::Shard;

/// Weakly consistent iterator over a ShardMap.
///
/// Entries of one shard are copied into a buffer under that shard's read lock,
/// then the lock is released before they are yielded. Only one shard is ever
/// locked at a time, so the iterator never blocks writers for long and cannot
/// deadlock against them.
pub struct Iter<'a, K, V, B> {
    shards: &'a [Shard<K, V, B>],
    current_shard: usize,
    buffer: std::vec::IntoIter<(K, V)>,
}

impl<'a, K, V, B> Iter<'a, K, V, B>
where
    K: Clone,
    V: Clone,
    B: Backend<K, V>,
{
    pub(crate) fn new(shards: &'a [Shard<K, V, B>]) -> Self {
        Self {
            shards,
            current_shard: 0,
            buffer: Vec::new().into_iter(),
        }
    }

    /// Fill the buffer from the next non-empty shard.
    fn fill_buffer(&mut self) -> bool {
        while self.current_shard < self.shards.len() {
            let shard = &self.shards[self.current_shard];
            self.current_shard += 1;

            let mut entries = Vec::new();
            shard.for_each(|key, value| entries.push((key.clone(), value.clone())));

            if !entries.is_empty() {
                self.buffer = entries.into_iter();
                return true;
            }
        }

        false
    }
}

impl<'a, K, V, B> Iterator for Iter<'a, K, V, B>
where
    K: Clone,
    V: Clone,
    B: Backend<K, V>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(item);
            }
            if !self.fill_buffer() {
                return None;
            }
        }
    }
}
