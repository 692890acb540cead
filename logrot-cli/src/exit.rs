//! Exit codes for the logrot CLI.
//!
//! `run` passes a child's own exit code through on success, so these only
//! apply when logrot itself fails.

use logrot_fs::WriterError;

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: i32 = 1;
    /// Reading the input stream or inspecting files failed.
    pub const IO_ERROR: i32 = 2;
    /// The rotating writer failed.
    pub const WRITER_ERROR: i32 = 3;
    /// The child process could not be started or waited on.
    pub const SPAWN_ERROR: i32 = 4;
    /// The child process was killed by a signal.
    pub const CHILD_SIGNALED: i32 = 5;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Path(_) => codes::INVALID_ARGS,
        CommandError::Writer(WriterError::Path(_) | WriterError::Config(_)) => codes::INVALID_ARGS,
        CommandError::Input(_) => codes::IO_ERROR,
        CommandError::Inspect(_) => codes::IO_ERROR,
        CommandError::Render(_) => codes::IO_ERROR,
        CommandError::Writer(_) => codes::WRITER_ERROR,
        CommandError::Spawn { .. } => codes::SPAWN_ERROR,
        CommandError::Wait { .. } => codes::SPAWN_ERROR,
        CommandError::Signaled(_) => codes::CHILD_SIGNALED,
    }
}

/// Clamp a child's exit code into the range a process can return.
pub fn child_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliError;
    use logrot_fs::{ConfigError, FsError, PathError, RotationError};
    use std::io;
    use std::path::PathBuf;

    fn io_error() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "test")
    }

    #[test]
    fn test_exit_code_invalid_argument() {
        let error = CommandError::InvalidArgument(CliError::ZeroMaxBytes);
        assert_eq!(exit_code(&error), codes::INVALID_ARGS);
    }

    #[test]
    fn test_exit_code_path() {
        assert_eq!(exit_code(&CommandError::Path(PathError::Empty)), codes::INVALID_ARGS);
        let error = CommandError::Writer(WriterError::Path(PathError::Empty));
        assert_eq!(exit_code(&error), codes::INVALID_ARGS);
        let error = CommandError::Writer(WriterError::Config(ConfigError::ZeroMaxBytes));
        assert_eq!(exit_code(&error), codes::INVALID_ARGS);
    }

    #[test]
    fn test_exit_code_input() {
        assert_eq!(exit_code(&CommandError::Input(io_error())), codes::IO_ERROR);
    }

    #[test]
    fn test_exit_code_inspect() {
        let error = CommandError::Inspect(RotationError::Probe {
            path: PathBuf::from("/tmp/app.log"),
            source: FsError::Path("test".to_string()),
        });
        assert_eq!(exit_code(&error), codes::IO_ERROR);
    }

    #[test]
    fn test_exit_code_writer() {
        assert_eq!(
            exit_code(&CommandError::Writer(WriterError::Closed)),
            codes::WRITER_ERROR
        );
        let error = CommandError::Writer(WriterError::Write(FsError::Path("test".to_string())));
        assert_eq!(exit_code(&error), codes::WRITER_ERROR);
    }

    #[test]
    fn test_exit_code_child() {
        let error = CommandError::Spawn {
            program: "missing".to_string(),
            source: io_error(),
        };
        assert_eq!(exit_code(&error), codes::SPAWN_ERROR);
        let error = CommandError::Wait {
            program: "sh".to_string(),
            source: io_error(),
        };
        assert_eq!(exit_code(&error), codes::SPAWN_ERROR);
        assert_eq!(
            exit_code(&CommandError::Signaled("sh".to_string())),
            codes::CHILD_SIGNALED
        );
    }

    #[test]
    fn test_child_exit_code() {
        assert_eq!(child_exit_code(0), 0);
        assert_eq!(child_exit_code(3), 3);
        assert_eq!(child_exit_code(255), 255);
        assert_eq!(child_exit_code(-1), 255);
        assert_eq!(child_exit_code(1000), 255);
    }

    #[test]
    fn test_exit_codes_constants() {
        assert_eq!(codes::SUCCESS, 0);
        assert_eq!(codes::INVALID_ARGS, 1);
        assert_eq!(codes::IO_ERROR, 2);
        assert_eq!(codes::WRITER_ERROR, 3);
        assert_eq!(codes::SPAWN_ERROR, 4);
        assert_eq!(codes::CHILD_SIGNALED, 5);
    }
}
