//! Errors surfaced by the rotating writer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::fs::FsError;
use crate::path::PathError;
use crate::rotation::RotationError;

/// Errors from constructing, writing to, or closing a rotating writer.
///
/// Nothing is retried internally; every variant reaches the caller of the
/// operation that hit it.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("invalid log path: {0}")]
    Path(#[from] PathError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("rotation failed: {0}")]
    Rotation(#[from] RotationError),

    #[error("write failed: {0}")]
    Write(#[source] FsError),

    #[error("failed to close log file: {0}")]
    Close(#[source] FsError),

    #[error("log writer is closed")]
    Closed,
}

impl From<WriterError> for io::Error {
    fn from(err: WriterError) -> Self {
        let kind = match &err {
            WriterError::Closed => io::ErrorKind::BrokenPipe,
            WriterError::Write(FsError::Io(e)) | WriterError::Close(FsError::Io(e)) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
