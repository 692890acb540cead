//! Size-bounded rotating log files.
//!
//! This crate provides:
//! - `RotatingWriter`, a drop-in `io::Write` file replacement that rotates to
//!   numbered backups without splitting entries across files
//! - Backup chain rotation with eviction past a retention limit
//! - Filesystem trait with real and mock implementations

pub mod config;
pub mod error;
pub mod fs;
pub mod lifecycle;
pub mod logger;
pub mod naming;
pub mod path;
pub mod rotation;
pub mod writer;

pub use config::{
    ConfigError, RotationConfig, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_BYTES, DEFAULT_SEPARATOR,
    OVERSIZE_FACTOR,
};
pub use error::WriterError;
pub use fs::{Filesystem, FsError, MockFilesystem, MockHandle, RealFilesystem};
pub use lifecycle::StartupAction;
pub use logger::{
    format_line, LogEntry, Logger, MockLogger, NullLogger, StderrLogger, StreamLogger, Verbosity,
};
pub use naming::{backup_filename, parse_backup_index};
pub use path::{PathDescriptor, PathError};
pub use rotation::{
    chain_capacity, list_backup_chain, plan_rotation, rotate_backups, stray_backups, BackupFile, RotationError,
    RotationPlan, RotationResult,
};
pub use writer::{RotatingWriter, WriterBuilder};
