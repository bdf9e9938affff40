use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the persistence and serialization entry points.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur when serializing or persisting a ShardMap.
///
/// Core map operations never fail; a missing key is reported as `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// An empty file path was supplied.
    #[error("file path cannot be empty")]
    EmptyPath,

    /// The map was built without a codec and cannot be persisted.
    #[error("no codec configured for this map")]
    MissingCodec,

    /// The file to load does not exist.
    #[error("file {path:?} does not exist")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The parent directory of a relative path could not be created.
    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the file failed.
    #[error("failed to read file {path:?}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing or syncing the temporary file failed. The temporary file is
    /// removed.
    #[error("failed to write temporary file {path:?}: {source}")]
    Write {
        /// Temporary file being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Renaming the temporary file over the target failed.
    #[error("failed to rename temporary file to {path:?}: {source}")]
    Rename {
        /// Target path of the rename.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Syncing the directory after the rename failed. The new file is in
    /// place but may not survive a crash; the map stays dirty.
    #[error("failed to sync directory {path:?}: {source}")]
    Sync {
        /// Directory being synced.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The codec failed to encode the map contents.
    #[error("{codec} encode error: {source}")]
    Encode {
        /// Name of the codec.
        codec: String,
        /// Codec failure.
        #[source]
        source: CodecError,
    },

    /// The codec rejected the input bytes. The map is left untouched.
    #[error("{codec} decode error: {source}")]
    Decode {
        /// Name of the codec.
        codec: String,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
}

/// Failure reported by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Bincode encoding or decoding failed.
    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    /// Failure from a third-party codec.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}
