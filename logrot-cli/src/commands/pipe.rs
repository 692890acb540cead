//! Pipe command orchestration.
//!
//! Reads entries from an input stream and appends them to a rotating writer.

use std::io::{BufRead, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;

use logrot_fs::{Filesystem, Logger, RotatingWriter, WriterBuilder};

use crate::cli::PipeArgs;

use super::{CommandError, CommandResult};

/// Totals for one forwarded stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Entries written, counting a trailing fragment as one.
    pub entries: u64,
    /// Bytes written.
    pub bytes: u64,
}

impl ForwardStats {
    pub fn merge(self, other: ForwardStats) -> ForwardStats {
        ForwardStats {
            entries: self.entries + other.entries,
            bytes: self.bytes + other.bytes,
        }
    }
}

/// Result of pipe command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeResult {
    /// Absolute path of the active file.
    pub path: PathBuf,
    pub stats: ForwardStats,
}

/// Largest piece of a single entry buffered before it is written.
pub const MAX_ENTRY_CHUNK: usize = 64 * 1024;

/// Copy `input` into `writer` one entry at a time.
///
/// Each write carries exactly one entry including its separator, so entries
/// from concurrent forwarders never interleave. A fragment left at end of
/// input is written as-is. Entries longer than [`MAX_ENTRY_CHUNK`] are
/// written in pieces; see [`forward_entries_chunked`].
pub fn forward_entries<R, F>(input: R, writer: &RotatingWriter<F>) -> CommandResult<ForwardStats>
where
    R: BufRead,
    F: Filesystem,
{
    forward_entries_chunked(input, writer, MAX_ENTRY_CHUNK)
}

/// [`forward_entries`] with an explicit bound on buffered entry bytes.
///
/// An entry longer than `max_chunk` goes out in `max_chunk`-sized writes.
/// The writer never rotates on a write without a separator, so the pieces
/// still land in one file, but a concurrent forwarder may interleave
/// between them.
pub fn forward_entries_chunked<R, F>(
    mut input: R,
    writer: &RotatingWriter<F>,
    max_chunk: usize,
) -> CommandResult<ForwardStats>
where
    R: BufRead,
    F: Filesystem,
{
    let separator = writer.config().separator;
    let max_chunk = max_chunk.max(1);
    let mut stats = ForwardStats::default();
    let mut entry = Vec::new();
    // part of the current entry already went out
    let mut open_entry = false;

    loop {
        let available = match input.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CommandError::Input(e)),
        };
        if available.is_empty() {
            if !entry.is_empty() {
                writer.write(&entry)?;
                stats.bytes += entry.len() as u64;
            }
            if open_entry || !entry.is_empty() {
                stats.entries += 1;
            }
            return Ok(stats);
        }

        let window = &available[..available.len().min(max_chunk - entry.len())];
        let (taken, complete) = match window.iter().position(|&b| b == separator) {
            Some(pos) => (pos + 1, true),
            None => (window.len(), false),
        };
        entry.extend_from_slice(&window[..taken]);
        input.consume(taken);

        if complete || entry.len() == max_chunk {
            writer.write(&entry)?;
            stats.bytes += entry.len() as u64;
            if complete {
                stats.entries += 1;
            }
            open_entry = !complete;
            entry.clear();
        }
    }
}

/// Execute the pipe command.
pub fn execute_pipe<R, F>(
    args: &PipeArgs,
    input: R,
    fs: F,
    logger: Arc<dyn Logger>,
) -> CommandResult<PipeResult>
where
    R: BufRead,
    F: Filesystem,
{
    args.validate()?;

    let writer = WriterBuilder::new(&args.writer.path)
        .config(args.writer.to_config())
        .logger(logger)
        .open_with(fs)?;

    let forwarded = forward_entries(input, &writer);
    let closed = writer.close();
    let stats = forwarded?;
    closed?;

    Ok(PipeResult {
        path: writer.path().to_path_buf(),
        stats,
    })
}
