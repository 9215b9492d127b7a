//! Error types for locating and loading displays.

use std::path::{Path, PathBuf};
use thiserror::Error;

use trellis_codec::CodecError;

/// Errors that can occur while locating, loading or rewriting a display.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No wire artifact at any of the candidate locations.
    #[error("no display artifact found under {root} (tried {})", join_paths(.tried))]
    MissingWireFile { root: PathBuf, tried: Vec<PathBuf> },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsing, decoding or writing the artifact failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl IngestError {
    pub(crate) fn directory_read(path: &Path, source: std::io::Error) -> Self {
        Self::DirectoryRead {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
