//! # ShardStore
//!
//! A concurrent sharded map with pluggable storage backends, pluggable wire
//! formats and crash-safe file persistence.
//!
//! ShardStore splits your data across multiple shards, each with its own lock.
//! Operations on different shards don't block each other, which keeps
//! contention low under mixed read/write load. The whole map can be encoded
//! with any [`Codec`] and saved to disk atomically.
//!
//! ## Features
//!
//! - **Sharded**: power-of-two shard count, one read-write lock per shard
//! - **Deterministic**: same key always maps to the same shard
//! - **Pluggable backends**: hash, sorted or insertion-ordered shards
//! - **Pluggable codecs**: JSON (default), pretty JSON, bincode, or your own
//! - **Persistence**: write-to-temp-then-rename saves, skipped when nothing changed
//!
//! ## Example
//!
//! ```rust
//! use shardstore::ShardMap;
//!
//! let map = ShardMap::new();
//!
//! // Insert values
//! map.put("key1".to_string(), 1);
//! map.put("key2".to_string(), 2);
//!
//! // Read values
//! assert_eq!(map.get(&"key1".to_string()), Some(1));
//!
//! // Encode and restore
//! let json = map.to_json()?;
//! let copy: ShardMap<String, i32> = ShardMap::new();
//! copy.load_json(&json)?;
//! assert_eq!(copy.len(), 2);
//! # Ok::<(), shardstore::Error>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use shardstore::{BincodeCodec, ShardMapBuilder, TreeBackend};
//!
//! let map = ShardMapBuilder::<u64, String>::new()
//!     .shard_count(32)
//!     .codec(BincodeCodec)
//!     .build_with_backend::<TreeBackend<u64, String>>();
//! assert_eq!(map.shard_count(), 32);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Shard storage backends.
pub mod backend;
/// Multi-key operations.
mod batch;
/// Codecs for snapshots.
pub mod codec;
/// Configuration and builder types.
pub mod config;
/// Dirty tracking.
mod dirty;
/// Error types.
pub mod error;
/// Key hashing for shard assignment.
pub mod hash;
/// Iterator implementations.
pub mod iter;
/// File persistence.
mod persistence;
/// Snapshot types and encoding entry points.
pub mod serialization;
/// Internal shard implementation.
mod shard;
/// Main ShardMap implementation.
pub mod shardmap;
/// Load statistics.
pub mod stats;

// Re-export main types
pub use backend::{Backend, HashBackend, LinkedHashBackend, TreeBackend};
pub use codec::{BincodeCodec, Codec, JsonCodec, PrettyJsonCodec};
pub use config::{CodecConfig, Config, ShardMapBuilder};
pub use error::{CodecError, Error, Result};
pub use hash::ShardHash;
pub use serialization::{Entry, Snapshot};
pub use shardmap::ShardMap;
pub use stats::Stats;
