//! Error types for the reaper.
//!
//! None of these ever reach the scheduler: every cleanup task logs and
//! swallows its failures. They exist so collaborators can report what went
//! wrong and so the task can decide whether to skip an item or give up on
//! the pass.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A result type using `ReaperError`.
pub type Result<T> = std::result::Result<T, ReaperError>;

/// Errors that can occur while reclaiming resources.
#[derive(Debug, Error)]
pub enum ReaperError {
    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] housekeeper_store::StoreError),

    /// The whiteboard store or stream registry could not answer.
    #[error("room state unavailable: {0}")]
    RoomState(String),

    /// The retention evaluator failed.
    #[error("retention evaluation failed: {0}")]
    Retention(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ReaperError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the next scheduled run might succeed where this one failed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Io { source, .. } => !matches!(
                source.kind(),
                std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::InvalidInput
            ),
            Self::Store(e) => !e.is_not_found(),
            Self::RoomState(_) | Self::Retention(_) => true,
            Self::Config(_) => false,
        }
    }
}
