//! Run command orchestration.
//!
//! Spawns a child process and forwards its stdout and stderr, each on its
//! own thread, into one shared rotating writer.

use std::io::BufReader;
use std::panic;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use logrot_fs::{Filesystem, Logger, WriterBuilder};

use crate::cli::RunArgs;

use super::pipe::{forward_entries, ForwardStats};
use super::{CommandError, CommandResult};

/// Result of run command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Exit code of the child.
    pub exit_code: i32,
    /// Combined totals of both streams.
    pub stats: ForwardStats,
}

fn join(handle: Option<ScopedJoinHandle<'_, CommandResult<ForwardStats>>>) -> CommandResult<ForwardStats> {
    match handle {
        Some(handle) => handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)),
        None => Ok(ForwardStats::default()),
    }
}

/// Execute the run command.
///
/// The writer is opened before the child starts. Once the child exits and
/// both streams are drained, the first forwarding error wins over the
/// child's status.
pub fn execute_run<F: Filesystem>(
    args: &RunArgs,
    fs: F,
    logger: Arc<dyn Logger>,
) -> CommandResult<RunResult> {
    args.validate()?;
    let program = args.program().to_string();

    let writer = WriterBuilder::new(&args.writer.path)
        .config(args.writer.to_config())
        .logger(Arc::clone(&logger))
        .open_with(fs)?;

    let spawned = Command::new(&program)
        .args(&args.command[1..])
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => {
            // spawn error takes precedence over close
            if let Err(e) = writer.close() {
                logger.info(&format!("failed to close {}: {}", writer.path().display(), e));
            }
            return Err(CommandError::Spawn { program, source });
        }
    };
    logger.verbose(&format!("started {} (pid {})", program, child.id()));

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (out, err) = thread::scope(|s| {
        let writer = &writer;
        let out = stdout.map(|pipe| s.spawn(move || forward_entries(BufReader::new(pipe), writer)));
        let err = stderr.map(|pipe| s.spawn(move || forward_entries(BufReader::new(pipe), writer)));
        (join(out), join(err))
    });

    let status = child.wait().map_err(|source| CommandError::Wait {
        program: program.clone(),
        source,
    });
    let closed = writer.close();

    let stats = out?.merge(err?);
    let status = status?;
    closed?;

    logger.verbose(&format!(
        "{} exited with {}, captured {} entries ({} bytes)",
        program, status, stats.entries, stats.bytes
    ));

    match status.code() {
        Some(exit_code) => Ok(RunResult { exit_code, stats }),
        None => Err(CommandError::Signaled(program)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cli::WriterArgs;
    use logrot_fs::{MockFilesystem, MockLogger, NullLogger, PathDescriptor, Verbosity};
    use std::path::PathBuf;

    const PATH: &str = "/tmp/logs/run.log";

    fn args(max_bytes: u64, max_backups: usize, command: &[&str]) -> RunArgs {
        RunArgs {
            writer: WriterArgs {
                path: PathBuf::from(PATH),
                max_bytes,
                max_backups,
                separator: b'\n',
                verbose: 0,
            },
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn all_lines(fs: &MockFilesystem, max_backups: usize) -> Vec<String> {
        let desc = PathDescriptor::resolve(PATH).unwrap();
        let mut lines = Vec::new();
        for index in (0..=max_backups).rev() {
            if let Some(data) = fs.get_file(&desc.backup_path(index)) {
                let text = String::from_utf8(data).unwrap();
                lines.extend(text.lines().map(str::to_string));
            }
        }
        lines
    }

    // ===========================================
    // Capture
    // ===========================================

    #[test]
    fn test_run_captures_stdout_and_stderr() {
        let fs = MockFilesystem::new();
        let run = args(1024, 2, &["sh", "-c", "echo out; echo err >&2"]);

        let result = execute_run(&run, fs.clone(), Arc::new(NullLogger)).expect("execute");

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stats, ForwardStats { entries: 2, bytes: 8 });
        let mut lines = all_lines(&fs, 2);
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
    }

    #[test]
    fn test_run_rotates_child_output() {
        let fs = MockFilesystem::new();
        let run = args(
            20,
            10,
            &["sh", "-c", "for i in 1 2 3 4 5 6 7 8; do echo line-$i; done"],
        );

        let result = execute_run(&run, fs.clone(), Arc::new(NullLogger)).expect("execute");

        assert_eq!(result.stats.entries, 8);
        let expected: Vec<String> = (1..=8).map(|i| format!("line-{}", i)).collect();
        assert_eq!(all_lines(&fs, 10), expected);

        let desc = PathDescriptor::resolve(PATH).unwrap();
        assert!(fs.exists(&desc.backup_path(1)));
    }

    #[test]
    fn test_run_reports_child_exit_code() {
        let fs = MockFilesystem::new();
        let run = args(1024, 2, &["sh", "-c", "echo failing; exit 3"]);

        let result = execute_run(&run, fs, Arc::new(NullLogger)).expect("execute");

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stats.entries, 1);
    }

    #[test]
    fn test_run_logs_child_lifecycle() {
        let fs = MockFilesystem::new();
        let logger = MockLogger::new();
        let run = args(1024, 2, &["sh", "-c", "true"]);

        execute_run(&run, fs, Arc::new(logger.clone())).expect("execute");

        assert!(logger.contains("started sh"));
        assert!(logger.contains("captured 0 entries"));
    }

    // ===========================================
    // Failures
    // ===========================================

    #[test]
    fn test_run_spawn_failure() {
        let fs = MockFilesystem::new();
        let run = args(1024, 2, &["/nonexistent/logrot-test-program"]);

        let err = execute_run(&run, fs.clone(), Arc::new(NullLogger)).unwrap_err();

        match err {
            CommandError::Spawn { program, .. } => {
                assert_eq!(program, "/nonexistent/logrot-test-program");
            }
            other => panic!("expected Spawn, got {:?}", other),
        }
        // the writer was opened and closed cleanly
        let desc = PathDescriptor::resolve(PATH).unwrap();
        assert_eq!(fs.get_file(desc.path()), Some(vec![]));
    }

    #[test]
    fn test_run_spawn_failure_logs_close_failure() {
        let fs = MockFilesystem::new();
        let logger = MockLogger::new();
        let run = args(1024, 2, &["/nonexistent/logrot-test-program"]);
        fs.set_fail_closes(true);

        let err = execute_run(&run, fs, Arc::new(logger.clone())).unwrap_err();

        assert!(matches!(err, CommandError::Spawn { .. }));
        let normal = logger.messages_at_level(Verbosity::Normal);
        assert_eq!(normal.len(), 1);
        assert!(normal[0].starts_with("failed to close /tmp/logs/run.log"));
        assert!(normal[0].contains("injected close failure"));
    }

    #[test]
    fn test_run_child_killed_by_signal() {
        let fs = MockFilesystem::new();
        let run = args(1024, 2, &["sh", "-c", "kill -9 $$"]);

        let err = execute_run(&run, fs, Arc::new(NullLogger)).unwrap_err();

        assert!(matches!(err, CommandError::Signaled(ref p) if p == "sh"));
    }

    #[test]
    fn test_run_writer_failure_surfaces() {
        let fs = MockFilesystem::new();
        fs.set_fail_opens(true);
        let run = args(1024, 2, &["sh", "-c", "echo never"]);

        let err = execute_run(&run, fs, Arc::new(NullLogger)).unwrap_err();

        assert!(matches!(err, CommandError::Writer(_)));
    }

    #[test]
    fn test_run_invalid_args() {
        let fs = MockFilesystem::new();
        let run = args(0, 2, &["true"]);

        let err = execute_run(&run, fs, Arc::new(NullLogger)).unwrap_err();

        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }
}
