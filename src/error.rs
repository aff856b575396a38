//! Error types for the restore engine.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that abort a restore run.
///
/// Per-file failures never surface here; they are reported as warnings and
/// the run carries on.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Failed to {action}: {source}")]
    Io {
        action: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid backup folder")]
    InvalidBackupFolder(PathBuf),

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(#[source] serde_json::Error),

    #[error("Could not determine the current user's home directory")]
    NoHomeDirectory,

    #[error("Restore cancelled by user")]
    Cancelled,
}

impl RestoreError {
    pub(crate) fn io(action: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            action: action.into(),
            source,
        }
    }
}

/// Errors raised while reading the metadata sidecar.
///
/// These are recoverable: the restore falls back to a basic restore.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("{0}")]
    Read(#[from] io::Error),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RestoreError>;
