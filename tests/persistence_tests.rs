use shardstore::{
    BincodeCodec, Codec, CodecError, Config, Entry, Error, PrettyJsonCodec, ShardMap, Snapshot,
};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn sample_map() -> ShardMap<String, i32> {
    let map = ShardMap::new();
    map.put("key1".to_string(), 100);
    map.put("key2".to_string(), 200);
    map
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");

    let source: ShardMap<String, i32> = ShardMap::new();
    for i in 0..100 {
        source.put(format!("key{}", i), i * 10);
    }
    source.save_to_file(&path).unwrap();
    assert!(!source.is_dirty());

    let restored: ShardMap<String, i32> = ShardMap::new();
    restored.load_from_file(&path).unwrap();
    assert!(!restored.is_dirty());

    assert_eq!(restored.len(), source.len());
    for key in source.keys() {
        assert_eq!(restored.get(&key), source.get(&key));
    }
}

#[test]
fn test_saved_file_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");

    let map: ShardMap<String, i32> = ShardMap::with_config(Config::new().shard_count(1));
    map.put("a".to_string(), 1);
    map.save_to_file(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, r#"{"items":[{"key":"a","value":1}]}"#);
}

#[test]
fn test_second_save_without_changes_is_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");

    let map = sample_map();
    map.save_to_file(&path).unwrap();

    // If the second save wrote anything, the file would come back
    fs::remove_file(&path).unwrap();
    map.save_to_file(&path).unwrap();
    assert!(!path.exists());

    // A mutation makes the next save write again
    map.put("key3".to_string(), 300);
    map.save_to_file(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_empty_map_is_always_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");

    let map: ShardMap<String, i32> = ShardMap::new();
    assert!(!map.is_dirty());
    map.save_to_file(&path).unwrap();

    assert_eq!(fs::read(&path).unwrap(), br#"{"items":[]}"#);
}

#[test]
fn test_no_temporary_file_left_behind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");

    sample_map().save_to_file(&path).unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("map.json.tmp").exists());
}

#[test]
fn test_failed_rename_removes_temporary_file() {
    let dir = tempdir().unwrap();
    // A non-empty directory cannot be replaced by a file
    let path = dir.path().join("occupied");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("inner"), b"x").unwrap();

    let map = sample_map();
    let err = map.save_to_file(&path).unwrap_err();

    assert!(matches!(err, Error::Rename { .. }), "unexpected error: {}", err);
    assert!(!dir.path().join("occupied.tmp").exists());
    assert!(path.is_dir());
    assert!(map.is_dirty());
}

#[cfg(target_os = "linux")]
#[test]
fn test_failed_write_removes_temporary_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");
    let tmp = dir.path().join("map.json.tmp");
    // Every write to /dev/full fails with ENOSPC
    std::os::unix::fs::symlink("/dev/full", &tmp).unwrap();

    let map = sample_map();
    let err = map.save_to_file(&path).unwrap_err();

    assert!(matches!(err, Error::Write { .. }), "unexpected error: {}", err);
    assert!(fs::symlink_metadata(&tmp).is_err());
    assert!(!path.exists());
    assert!(map.is_dirty());
}

#[test]
fn test_save_to_bare_file_name() {
    // Integration tests run from the package root
    let name = format!("shardstore-bare-{}.json", std::process::id());

    let map = sample_map();
    let result = map.save_to_file(&name);
    let contents = fs::read(&name);
    let _ = fs::remove_file(&name);

    result.unwrap();
    assert!(!contents.unwrap().is_empty());
    assert!(!map.is_dirty());
}

#[test]
fn test_load_missing_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let map = sample_map();
    let err = map.load_from_file(&path).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { path: ref p } if *p == path));
    assert_eq!(map.len(), 2);
}

#[test]
fn test_load_empty_file_yields_empty_map() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, b"").unwrap();

    let map = sample_map();
    map.load_from_file(&path).unwrap();

    assert!(map.is_empty());
    assert!(!map.is_dirty());
}

#[test]
fn test_load_truncated_file_keeps_previous_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, b"{").unwrap();

    let map = sample_map();
    let err = map.load_from_file(&path).unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&"key1".to_string()), Some(100));
    assert!(map.is_dirty());
}

#[test]
fn test_empty_path_rejected() {
    let map = sample_map();
    assert!(matches!(map.save_to_file(""), Err(Error::EmptyPath)));
    assert!(matches!(map.load_from_file(""), Err(Error::EmptyPath)));
}

#[test]
fn test_map_without_codec_refuses_persistence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");
    fs::write(&path, br#"{"items":[]}"#).unwrap();

    let map: ShardMap<String, i32> = ShardMap::with_config(Config::new().without_codec());
    map.put("a".to_string(), 1);

    assert!(matches!(map.save_to_file(&path), Err(Error::MissingCodec)));
    assert!(matches!(map.load_from_file(&path), Err(Error::MissingCodec)));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_other_codecs_round_trip_through_files() {
    let dir = tempdir().unwrap();

    let bin_path = dir.path().join("map.bin");
    let map: ShardMap<String, i32> = ShardMap::with_config(Config::new().codec(BincodeCodec));
    map.put("a".to_string(), 1);
    map.save_to_file(&bin_path).unwrap();

    let restored: ShardMap<String, i32> =
        ShardMap::with_config(Config::new().codec(BincodeCodec));
    restored.load_from_file(&bin_path).unwrap();
    assert_eq!(restored.get(&"a".to_string()), Some(1));

    // The default JSON codec cannot read bincode output
    let json_map: ShardMap<String, i32> = ShardMap::new();
    assert!(matches!(
        json_map.load_from_file(&bin_path),
        Err(Error::Decode { .. })
    ));

    let pretty_path = dir.path().join("map.pretty.json");
    let map: ShardMap<String, i32> = ShardMap::with_config(Config::new().codec(PrettyJsonCodec));
    map.put("b".to_string(), 2);
    map.save_to_file(&pretty_path).unwrap();
    json_map.load_from_file(&pretty_path).unwrap();
    assert_eq!(json_map.get(&"b".to_string()), Some(2));
}

#[test]
fn test_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");
    fs::write(&path, b"previous contents").unwrap();

    sample_map().save_to_file(&path).unwrap();

    let restored: ShardMap<String, i32> = ShardMap::new();
    restored.load_from_file(&path).unwrap();
    assert_eq!(restored.len(), 2);
}

#[test]
fn test_relative_path_creates_parent_directories() {
    // Integration tests run from the package root
    let root = PathBuf::from("target").join(format!("shardstore-persist-{}", std::process::id()));
    let path = root.join("nested").join("deeper").join("map.json");
    assert!(path.is_relative());

    let map = sample_map();
    let result = map.save_to_file(&path);
    let exists = path.exists();
    let _ = fs::remove_dir_all(&root);

    result.unwrap();
    assert!(exists);
}

/// A value type with no serde support.
#[derive(Debug, Clone, PartialEq)]
struct Port(u16);

/// `key:port` lines.
struct PortCodec;

impl Codec<String, Port> for PortCodec {
    fn name(&self) -> &str {
        "ports"
    }

    fn marshal(&self, snapshot: &Snapshot<String, Port>) -> Result<Vec<u8>, CodecError> {
        let lines: Vec<String> = snapshot
            .items
            .iter()
            .map(|entry| format!("{}:{}", entry.key, entry.value.0))
            .collect();
        Ok(lines.join("\n").into_bytes())
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Snapshot<String, Port>, CodecError> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Other(Box::new(e)))?;
        let mut items = Vec::new();
        for line in text.lines() {
            let (key, port) = line
                .split_once(':')
                .ok_or_else(|| CodecError::Other(format!("bad line: {}", line).into()))?;
            let port = port.parse::<u16>().map_err(|e| CodecError::Other(Box::new(e)))?;
            items.push(Entry {
                key: key.to_string(),
                value: Port(port),
            });
        }
        Ok(Snapshot { items })
    }
}

#[test]
fn test_explicit_codec_persists_types_without_serde() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ports.txt");

    let map: ShardMap<String, Port> = ShardMap::with_config(Config::new().codec(PortCodec));
    map.put("http".to_string(), Port(80));
    map.put("https".to_string(), Port(443));
    map.save_to_file_with(&path, &PortCodec).unwrap();
    assert!(!map.is_dirty());

    // Unchanged, so the second save is skipped
    fs::remove_file(&path).unwrap();
    map.save_to_file_with(&path, &PortCodec).unwrap();
    assert!(!path.exists());

    map.put("ssh".to_string(), Port(22));
    map.save_to_file_with(&path, &PortCodec).unwrap();

    let restored: ShardMap<String, Port> = ShardMap::new();
    restored.load_from_file_with(&path, &PortCodec).unwrap();
    assert_eq!(restored.len(), 3);
    assert_eq!(restored.get(&"https".to_string()), Some(Port(443)));
    assert!(!restored.is_dirty());

    assert!(matches!(
        restored.load_from_file_with(dir.path().join("absent"), &PortCodec),
        Err(Error::FileNotFound { .. })
    ));
}
