//! Flat, order-independent snapshots of a ShardMap.
//!
//! A snapshot is the list of every entry across every shard, gathered one
//! shard at a time. Its order (shard, then backend order) is deterministic for
//! a given state but carries no meaning; restoring never relies on it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::backend::Backend;
use crate::codec::{Codec, JsonCodec};
use crate::config::{CodecConfig, Config};
use crate::error::{Error, Result};
use crate::hash::ShardHash;
use crate::shardmap::ShardMap;

/// One key-value pair of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<K, V> {
    /// The key.
    pub key: K,
    /// The value.
    pub value: V,
}

/// Serialized form of a map: `{ "items": [{ "key": ..., "value": ... }, ...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<K, V> {
    /// Every entry of the map, in no meaningful order.
    pub items: Vec<Entry<K, V>>,
}

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<K, V, B> ShardMap<K, V, B>
where
    K: ShardHash,
    B: Backend<K, V>,
{
    /// Copy every entry out, one shard at a time.
    pub fn entries(&self) -> Vec<Entry<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        let mut items = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            shard.for_each(|key, value| {
                items.push(Entry {
                    key: key.clone(),
                    value: value.clone(),
                })
            });
        }
        items
    }

    /// Capture the current contents as a [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<K, V>
    where
        K: Clone,
        V: Clone,
    {
        Snapshot {
            items: self.entries(),
        }
    }

    /// Encode the map with `codec`.
    pub fn marshal_with(&self, codec: &dyn Codec<K, V>) -> Result<Vec<u8>>
    where
        K: Clone,
        V: Clone,
    {
        codec.marshal(&self.snapshot()).map_err(|source| Error::Encode {
            codec: codec.name().to_string(),
            source,
        })
    }

    /// Replace the contents with the entries decoded from `data`.
    ///
    /// Decoding completes before anything is touched, so malformed input leaves
    /// the map as it was. The swap itself is not atomic for concurrent readers:
    /// they can observe the map empty or partially reloaded.
    pub fn unmarshal_with(&self, data: &[u8], codec: &dyn Codec<K, V>) -> Result<()> {
        let snapshot = codec.unmarshal(data).map_err(|source| Error::Decode {
            codec: codec.name().to_string(),
            source,
        })?;
        self.restore(snapshot);
        Ok(())
    }

    /// Clear, reload every entry, and mark the map clean.
    pub(crate) fn restore(&self, snapshot: Snapshot<K, V>) {
        tracing::debug!(entries = snapshot.items.len(), "Replacing map contents");
        self.clear();
        // Writes from other threads after this point keep the map dirty.
        let epoch = self.dirty.epoch();
        for Entry { key, value } in snapshot.items {
            self.shard(&key).put(key, value);
        }
        self.dirty.mark_clean(epoch);
    }

    /// The codec used for file persistence, if any.
    pub fn codec(&self) -> Option<Arc<dyn Codec<K, V>>>
    where
        K: Serialize + DeserializeOwned,
        V: Serialize + DeserializeOwned,
    {
        match &self.codec {
            CodecConfig::Json => Some(Arc::new(JsonCodec)),
            CodecConfig::Custom(codec) => Some(Arc::clone(codec)),
            CodecConfig::None => None,
        }
    }

    /// The configured codec when it produces JSON, plain [`JsonCodec`] otherwise.
    pub fn json_codec(&self) -> Arc<dyn Codec<K, V>>
    where
        K: Serialize + DeserializeOwned,
        V: Serialize + DeserializeOwned,
    {
        match &self.codec {
            CodecConfig::Custom(codec) if codec.is_json() => Arc::clone(codec),
            _ => Arc::new(JsonCodec),
        }
    }

    /// Encode the map as JSON.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let map: ShardMap<String, i32> = ShardMap::new();
    /// map.put("a".to_string(), 1);
    ///
    /// let json = map.to_json().unwrap();
    /// assert_eq!(json, br#"{"items":[{"key":"a","value":1}]}"#);
    /// ```
    pub fn to_json(&self) -> Result<Vec<u8>>
    where
        K: Clone + Serialize + DeserializeOwned,
        V: Clone + Serialize + DeserializeOwned,
    {
        self.marshal_with(self.json_codec().as_ref())
    }

    /// Replace the contents with the entries of a JSON document.
    pub fn load_json(&self, data: &[u8]) -> Result<()>
    where
        K: Serialize + DeserializeOwned,
        V: Serialize + DeserializeOwned,
    {
        self.unmarshal_with(data, self.json_codec().as_ref())
    }
}

impl<K, V, B> Serialize for ShardMap<K, V, B>
where
    K: ShardHash + Clone + Serialize,
    V: Clone + Serialize,
    B: Backend<K, V>,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de, K, V, B> Deserialize<'de> for ShardMap<K, V, B>
where
    K: ShardHash + Deserialize<'de>,
    V: Deserialize<'de>,
    B: Backend<K, V>,
{
    /// Builds a map with the default configuration.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = Snapshot::deserialize(deserializer)?;
        let map = Self::with_config(Config::default());
        map.restore(snapshot);
        Ok(map)
    }
}
