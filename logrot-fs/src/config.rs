//! Writer configuration.

use thiserror::Error;

/// Default rotation threshold (10 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated files to keep.
pub const DEFAULT_MAX_BACKUPS: usize = 5;

/// Default entry separator.
pub const DEFAULT_SEPARATOR: u8 = b'\n';

/// A pre-existing active file at least this many times `max_bytes` is
/// deleted on open instead of rotated.
pub const OVERSIZE_FACTOR: u64 = 10;

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max-bytes must be at least 1")]
    ZeroMaxBytes,
}

/// Immutable configuration of a rotating writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotation threshold in bytes. The active file is rotated at the first
    /// entry boundary once it holds at least this many bytes.
    pub max_bytes: u64,

    /// Rotated files to retain, not counting the active file.
    pub max_backups: usize,

    /// Byte that terminates a logical entry.
    pub separator: u8,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl RotationConfig {
    /// Create a new config with the default separator.
    pub fn new(max_bytes: u64, max_backups: usize) -> Self {
        Self {
            max_bytes,
            max_backups,
            separator: DEFAULT_SEPARATOR,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::ZeroMaxBytes);
        }
        Ok(())
    }

    /// Size at which a pre-existing active file is discarded on open.
    pub fn oversize_threshold(&self) -> u64 {
        self.max_bytes.saturating_mul(OVERSIZE_FACTOR)
    }
}
