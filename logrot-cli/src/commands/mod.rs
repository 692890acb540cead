//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `pipe` - Copy stdin into a rotating log
//! - `run` - Capture a child process into a rotating log
//! - `status` - Inspect the backup chain

pub mod pipe;
pub mod run;
pub mod status;

pub use pipe::{
    execute_pipe, forward_entries, forward_entries_chunked, ForwardStats, PipeResult,
    MAX_ENTRY_CHUNK,
};
pub use run::{execute_run, RunResult};
pub use status::{execute_status, StatusReport};

use std::io;

use crate::cli::CliError;
use logrot_fs::{PathError, RotationError, WriterError};
use thiserror::Error;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    #[error("failed to read input: {0}")]
    Input(#[source] io::Error),

    #[error("log writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("failed to inspect backups: {0}")]
    Inspect(#[from] RotationError),

    #[error("failed to render status: {0}")]
    Render(#[from] serde_json::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{0} was terminated by a signal")]
    Signaled(String),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
