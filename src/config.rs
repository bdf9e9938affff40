use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::codec::Codec;
use crate::hash::ShardHash;

/// Shards per unit of available parallelism in the default configuration.
pub const SHARDS_PER_CPU: usize = 16;

/// Which codec a map persists with.
pub enum CodecConfig<K, V> {
    /// JSON through [`JsonCodec`](crate::codec::JsonCodec).
    Json,
    /// A user-supplied codec.
    Custom(Arc<dyn Codec<K, V>>),
    /// No codec: file persistence is refused.
    None,
}

impl<K, V> Clone for CodecConfig<K, V> {
    fn clone(&self) -> Self {
        match self {
            CodecConfig::Json => CodecConfig::Json,
            CodecConfig::Custom(codec) => CodecConfig::Custom(Arc::clone(codec)),
            CodecConfig::None => CodecConfig::None,
        }
    }
}

impl<K, V> fmt::Debug for CodecConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecConfig::Json => write!(f, "CodecConfig::Json"),
            CodecConfig::Custom(codec) => write!(f, "CodecConfig::Custom({})", codec.name()),
            CodecConfig::None => write!(f, "CodecConfig::None"),
        }
    }
}

/// Configuration for a ShardMap instance. Applied once at construction.
#[derive(Debug, Clone)]
pub struct Config<K, V> {
    pub(crate) shard_count: usize,
    pub(crate) codec: CodecConfig<K, V>,
}

impl<K, V> Config<K, V> {
    /// Create a new config with defaults (16 shards per CPU, JSON codec).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Rounded up to the next power of two; zero
    /// becomes a single shard.
    pub fn shard_count(mut self, count: usize) -> Self {
        self.shard_count = round_up_shard_count(count);
        self
    }

    /// Persist with the given codec.
    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: Codec<K, V> + 'static,
    {
        self.codec = CodecConfig::Custom(Arc::new(codec));
        self
    }

    /// Build a map that refuses file persistence.
    pub fn without_codec(mut self) -> Self {
        self.codec = CodecConfig::None;
        self
    }

    /// The effective (rounded) shard count.
    pub fn get_shard_count(&self) -> usize {
        self.shard_count
    }
}

impl<K, V> Default for Config<K, V> {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
            codec: CodecConfig::Json,
        }
    }
}

/// Builder for creating a ShardMap with custom configuration.
///
/// ```rust
/// use shardstore::{BincodeCodec, ShardMap, ShardMapBuilder};
///
/// let map: ShardMap<String, i32> = ShardMapBuilder::<String, i32>::new()
///     .shard_count(20)
///     .codec(BincodeCodec)
///     .build();
/// assert_eq!(map.shard_count(), 32);
/// ```
pub struct ShardMapBuilder<K, V> {
    config: Config<K, V>,
}

impl<K, V> ShardMapBuilder<K, V> {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the number of shards, rounded up to a power of two.
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config = self.config.shard_count(count);
        self
    }

    /// Persist with the given codec.
    pub fn codec<C>(mut self, codec: C) -> Self
    where
        C: Codec<K, V> + 'static,
    {
        self.config = self.config.codec(codec);
        self
    }

    /// Disable file persistence.
    pub fn without_codec(mut self) -> Self {
        self.config = self.config.without_codec();
        self
    }

    /// Build a hash-backed map.
    pub fn build(self) -> crate::ShardMap<K, V>
    where
        K: ShardHash + std::hash::Hash + Eq,
    {
        crate::ShardMap::with_config(self.config)
    }

    /// Build a map with the given backend, e.g. [`TreeBackend`](crate::TreeBackend).
    pub fn build_with_backend<B>(self) -> crate::ShardMap<K, V, B>
    where
        K: ShardHash,
        B: Backend<K, V>,
    {
        crate::ShardMap::with_config(self.config)
    }
}

impl<K, V> Default for ShardMapBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest shard count; shard indices must fit the 32-bit hash.
pub const MAX_SHARDS: usize = 1 << 31;

/// Round a requested shard count up to a power of two, clamped to
/// `1..=MAX_SHARDS`.
pub fn round_up_shard_count(count: usize) -> usize {
    count
        .max(1)
        .checked_next_power_of_two()
        .map_or(MAX_SHARDS, |n| n.min(MAX_SHARDS))
}

/// `available_parallelism * SHARDS_PER_CPU`, rounded to a power of two.
pub fn default_shard_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    round_up_shard_count(cpus.saturating_mul(SHARDS_PER_CPU))
}
