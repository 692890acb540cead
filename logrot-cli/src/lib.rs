//! logrot CLI.
//!
//! This crate provides the command-line interface around `logrot-fs`:
//! argument parsing, exit codes, and the pipe, run, and status commands.

pub mod cli;
pub mod commands;
pub mod exit;

pub use cli::{
    parse_from, parse_separator, parse_size, Cli, CliError, Command, PipeArgs, RunArgs,
    StatusArgs, WriterArgs,
};
pub use commands::{
    execute_pipe, execute_run, execute_status, forward_entries, forward_entries_chunked,
    CommandError, CommandResult, ForwardStats, PipeResult, RunResult, StatusReport,
    MAX_ENTRY_CHUNK,
};
