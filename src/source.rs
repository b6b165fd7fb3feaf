//! Graph source: where the raw `digraph` text comes from.

use std::path::{Path, PathBuf};

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read graph source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ErrorCode for SourceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_SOURCE_IO",
        }
    }
}

/// Reads a graph description by path. Implementations do not retry.
pub trait GraphSource {
    /// # Errors
    ///
    /// Returns `Io` if the description is unreadable.
    fn read(&self, path: &Path) -> Result<String, SourceError>;
}

/// Reads graph descriptions from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl GraphSource for FileSource {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        std::fs::read_to_string(path).map_err(|source| SourceError::Io { path: path.to_path_buf(), source })
    }
}

/// Read a graph description from disk.
///
/// # Errors
///
/// Returns `Io` if the file is missing or unreadable.
pub fn read_graph_source(path: impl AsRef<Path>) -> Result<String, SourceError> {
    FileSource.read(path.as_ref())
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
