//! Error types for session store maintenance.

use std::path::PathBuf;

/// Error type for session store maintenance.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filesystem operation on the store or one of its backups failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store file did not contain a valid session map.
    #[error("Failed to parse session store {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The store could not be serialized.
    #[error("Failed to serialize session store: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store path has no file name to derive backup names from.
    #[error("Invalid store path: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for session store maintenance.
pub type Result<T> = std::result::Result<T, Error>;
