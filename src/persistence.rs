//! Crash-safe file persistence.
//!
//! Saves go to `<path>.tmp` first, are synced, and are renamed over the
//! target before the directory itself is synced. The target holds either the
//! previous snapshot or the new one, never a partial write.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::Backend;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::hash::ShardHash;
use crate::shardmap::ShardMap;

impl<K, V, B> ShardMap<K, V, B>
where
    K: ShardHash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
    B: Backend<K, V>,
{
    /// Write the map to `path` with the configured codec.
    ///
    /// A non-empty map that has not changed since the last save or load is
    /// not written again. Parent directories of relative paths are created
    /// as needed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shardstore::ShardMap;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let path = dir.path().join("map.json");
    ///
    /// let map: ShardMap<String, i32> = ShardMap::new();
    /// map.put("a".to_string(), 1);
    /// map.save_to_file(&path).unwrap();
    /// assert!(!map.is_dirty());
    ///
    /// let restored: ShardMap<String, i32> = ShardMap::new();
    /// restored.load_from_file(&path).unwrap();
    /// assert_eq!(restored.get(&"a".to_string()), Some(1));
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyPath);
        }
        let codec = self.codec().ok_or(Error::MissingCodec)?;
        self.save_to_file_with(path, codec.as_ref())
    }

    /// Replace the map's contents with the file at `path`.
    ///
    /// A zero-length file loads as an empty map. A missing file, a map built
    /// without a codec and undecodable content are errors; on error the map
    /// keeps its previous contents.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyPath);
        }
        let codec = self.codec().ok_or(Error::MissingCodec)?;
        self.load_from_file_with(path, codec.as_ref())
    }
}

impl<K, V, B> ShardMap<K, V, B>
where
    K: ShardHash,
    B: Backend<K, V>,
{
    /// [`save_to_file`](Self::save_to_file) with an explicit codec.
    ///
    /// Only the codec constrains the key and value types, so this works for
    /// types that do not implement serde traits.
    pub fn save_to_file_with<P: AsRef<Path>>(
        &self,
        path: P,
        codec: &dyn Codec<K, V>,
    ) -> Result<()>
    where
        K: Clone,
        V: Clone,
    {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyPath);
        }

        if path.is_relative() {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        if !self.is_empty() && !self.is_dirty() {
            tracing::debug!(path = ?path, "Map unchanged since last save, skipping write");
            return Ok(());
        }

        // Mutations after this point keep the map dirty.
        let epoch = self.dirty.epoch();
        let data = self.marshal_with(codec)?;

        let tmp_path = temp_path(path);
        if let Err(source) = write_synced(&tmp_path, &data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Write {
                path: tmp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&tmp_path, path) {
            tracing::warn!(path = ?path, error = %source, "Rename failed, removing temporary file");
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::Rename {
                path: path.to_path_buf(),
                source,
            });
        }

        let dir = parent_dir(path);
        sync_directory(dir).map_err(|source| Error::Sync {
            path: dir.to_path_buf(),
            source,
        })?;

        self.dirty.mark_clean(epoch);
        tracing::info!(
            path = ?path,
            bytes = data.len(),
            codec = codec.name(),
            "Map saved"
        );
        Ok(())
    }

    /// [`load_from_file`](Self::load_from_file) with an explicit codec.
    pub fn load_from_file_with<P: AsRef<Path>>(
        &self,
        path: P,
        codec: &dyn Codec<K, V>,
    ) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyPath);
        }

        let data = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        if data.is_empty() {
            self.restore(Default::default());
        } else {
            self.unmarshal_with(&data, codec)?;
        }

        tracing::info!(
            path = ?path,
            bytes = data.len(),
            codec = codec.name(),
            "Map loaded"
        );
        Ok(())
    }
}

/// `<path>.tmp`, next to the target.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Directory holding `path`; `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Write `data` and flush it to disk before returning.
fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Persist a rename by syncing the directory entry.
#[cfg(unix)]
fn sync_directory(path: &Path) -> std::io::Result<()> {
    fs::File::open(path)?.sync_all()
}

// Directories cannot be opened for syncing on this platform.
#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
