//! Wire formats for map snapshots.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;
use crate::serialization::Snapshot;

/// A named encoder/decoder for [`Snapshot`]s.
///
/// Implementations are shared between threads behind an `Arc`, so they must
/// be stateless or internally synchronized.
pub trait Codec<K, V>: Send + Sync {
    /// Short identifier, e.g. `"json"`.
    fn name(&self) -> &str;

    /// Encode a snapshot to bytes.
    fn marshal(&self, snapshot: &Snapshot<K, V>) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes into a snapshot. Must not have side effects on failure.
    fn unmarshal(&self, bytes: &[u8]) -> Result<Snapshot<K, V>, CodecError>;

    /// Whether the output is JSON. JSON-compatible codecs are used as-is by
    /// [`ShardMap::to_json`](crate::ShardMap::to_json).
    fn is_json(&self) -> bool {
        false
    }
}

/// Compact JSON via `serde_json`. The default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<K, V> Codec<K, V> for JsonCodec
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        "json"
    }

    fn marshal(&self, snapshot: &Snapshot<K, V>) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(snapshot)?)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Snapshot<K, V>, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn is_json(&self) -> bool {
        true
    }
}

/// Indented JSON, for files meant to be read by people.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonCodec;

impl<K, V> Codec<K, V> for PrettyJsonCodec
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        "json-pretty"
    }

    fn marshal(&self, snapshot: &Snapshot<K, V>) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec_pretty(snapshot)?)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Snapshot<K, V>, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn is_json(&self) -> bool {
        true
    }
}

/// Compact binary encoding via `bincode`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<K, V> Codec<K, V> for BincodeCodec
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        "bincode"
    }

    fn marshal(&self, snapshot: &Snapshot<K, V>) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(snapshot)?)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Snapshot<K, V>, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::Entry;

    fn sample() -> Snapshot<String, u32> {
        Snapshot {
            items: vec![Entry {
                key: "a".to_string(),
                value: 1,
            }],
        }
    }

    #[test]
    fn test_json_shape() {
        let bytes = Codec::<String, u32>::marshal(&JsonCodec, &sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"items":[{"key":"a","value":1}]}"#
        );
    }

    #[test]
    fn test_capabilities() {
        assert!(Codec::<String, u32>::is_json(&JsonCodec));
        assert!(Codec::<String, u32>::is_json(&PrettyJsonCodec));
        assert!(!Codec::<String, u32>::is_json(&BincodeCodec));
        assert_eq!(Codec::<String, u32>::name(&BincodeCodec), "bincode");
    }

    #[test]
    fn test_bincode_decodes_its_own_output() {
        let bytes = BincodeCodec.marshal(&sample()).unwrap();
        let decoded: Snapshot<String, u32> = BincodeCodec.unmarshal(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let result: Result<Snapshot<String, u32>, _> = JsonCodec.unmarshal(b"{");
        assert!(matches!(result, Err(CodecError::Json(_))));

        let result: Result<Snapshot<String, u32>, _> = BincodeCodec.unmarshal(&[0xff; 3]);
        assert!(matches!(result, Err(CodecError::Bincode(_))));
    }
}
