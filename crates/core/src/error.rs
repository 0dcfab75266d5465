use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for cache building.
///
/// Device flakiness and unreadable build-ids are not errors; they only show up
/// in the build report. Everything here aborts the run.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A configured search directory does not exist.
    #[error("Search directory not found: {0}")]
    MissingSearchDir(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Trace reader error: {0}")]
    Trace(String),

    /// An external tool could not be located or spawned.
    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Invalid config: {0}")]
    Config(String),
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Build a `map_err` adapter that attaches `path` to an I/O error.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io { path: path.to_path_buf(), source }
}
