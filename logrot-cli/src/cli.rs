//! CLI argument parsing for logrot.
//!
//! Provides the command-line interface for the `logrot` binary with
//! pipe, run, and status subcommands.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use logrot_fs::{RotationConfig, DEFAULT_MAX_BACKUPS};
use thiserror::Error;

/// Default `--max-bytes` (10 MiB).
pub const DEFAULT_MAX_BYTES_ARG: &str = "10M";

/// Default `--separator` (newline).
pub const DEFAULT_SEPARATOR_ARG: &str = "\\n";

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("invalid size {0:?}: expected a byte count with optional K, M or G suffix")]
    InvalidSize(String),

    #[error("invalid separator {0:?}: expected one ASCII character or an escape (\\n, \\0, \\t, \\r, \\\\, \\xHH)")]
    InvalidSeparator(String),

    #[error("max-bytes must be at least 1")]
    ZeroMaxBytes,

    #[error("run needs a command after --")]
    MissingCommand,
}

/// logrot - size-bounded rotating log files.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "logrot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Copy stdin into a rotating log file, entry by entry.
    Pipe(PipeArgs),
    /// Run a command and capture its stdout and stderr into a rotating log file.
    Run(RunArgs),
    /// Show the active file and its backup chain.
    Status(StatusArgs),
}

/// Options shared by every command that opens a writer.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WriterArgs {
    /// Active log file. Backups are written next to it as <stem>-<n><ext>.
    pub path: PathBuf,

    /// Rotate once the active file reaches this size (K, M, G suffixes are powers of 1024).
    #[arg(long, default_value = DEFAULT_MAX_BYTES_ARG, value_parser = parse_size)]
    pub max_bytes: u64,

    /// Backup index that is never filled: the active file and up to N-1 backups are kept.
    #[arg(long, default_value_t = DEFAULT_MAX_BACKUPS)]
    pub max_backups: usize,

    /// Byte that ends an entry.
    #[arg(long, default_value = DEFAULT_SEPARATOR_ARG, value_parser = parse_separator)]
    pub separator: u8,

    /// Increase diagnostic output (-v rotations, -vv individual renames).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl WriterArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.max_bytes == 0 {
            return Err(CliError::ZeroMaxBytes);
        }
        Ok(())
    }

    pub fn to_config(&self) -> RotationConfig {
        RotationConfig::new(self.max_bytes, self.max_backups).with_separator(self.separator)
    }
}

/// Arguments for the pipe command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PipeArgs {
    #[command(flatten)]
    pub writer: WriterArgs,
}

impl PipeArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        self.writer.validate()
    }
}

/// Arguments for the run command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    #[command(flatten)]
    pub writer: WriterArgs,

    /// Program and arguments to run.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl RunArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.command.is_empty() {
            return Err(CliError::MissingCommand);
        }
        self.writer.validate()
    }

    /// Program name, empty if no command was given.
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("")
    }
}

/// Arguments for the status command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    /// Active log file.
    pub path: PathBuf,

    /// The writer's --max-backups; indices below it form the chain.
    #[arg(long, default_value_t = DEFAULT_MAX_BACKUPS)]
    pub max_backups: usize,

    /// Print a JSON document instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Parse a byte count with an optional binary suffix: `512`, `64K`, `10M`, `1G`.
pub fn parse_size(input: &str) -> Result<u64, CliError> {
    let invalid = || CliError::InvalidSize(input.to_string());
    let trimmed = input.trim();

    let (digits, multiplier) = match trimmed.chars().last() {
        Some('k' | 'K') => (&trimmed[..trimmed.len() - 1], 1u64 << 10),
        Some('m' | 'M') => (&trimmed[..trimmed.len() - 1], 1u64 << 20),
        Some('g' | 'G') => (&trimmed[..trimmed.len() - 1], 1u64 << 30),
        Some(_) => (trimmed, 1),
        None => return Err(invalid()),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

/// Parse a separator: one ASCII character, or `\n`, `\0`, `\t`, `\r`, `\\`, `\xHH`.
pub fn parse_separator(input: &str) -> Result<u8, CliError> {
    let invalid = || CliError::InvalidSeparator(input.to_string());

    match input.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        [b'\\', b'n'] => Ok(b'\n'),
        [b'\\', b'0'] => Ok(0),
        [b'\\', b't'] => Ok(b'\t'),
        [b'\\', b'r'] => Ok(b'\r'),
        [b'\\', b'\\'] => Ok(b'\\'),
        [b'\\', b'x', hex @ ..] if hex.len() == 2 => {
            let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
            u8::from_str_radix(hex, 16).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Parse arguments from an iterator (for testing).
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
