//! Load introspection.

/// Entry counts for a ShardMap instance.
///
/// Sizes are read shard by shard, so under concurrent writes they are an
/// approximation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Total number of entries across all shards.
    pub size: usize,
    /// Number of entries in each shard.
    pub shard_sizes: Vec<usize>,
}

impl Stats {
    /// Average load (entries) per shard.
    pub fn avg_load(&self) -> f64 {
        if self.shard_sizes.is_empty() {
            return 0.0;
        }
        self.size as f64 / self.shard_sizes.len() as f64
    }

    /// Max load / avg load ratio. `0.0` for an empty map.
    ///
    /// The caller interprets it, e.g. treating anything above 2.0 as imbalance.
    pub fn max_load_ratio(&self) -> f64 {
        let avg = self.avg_load();
        if avg == 0.0 {
            return 0.0;
        }
        let max = self.shard_sizes.iter().copied().max().unwrap_or(0);
        max as f64 / avg
    }
}
