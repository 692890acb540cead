//! Opening the active file.
//!
//! A pre-existing active file is classified by size before the writer takes
//! it over:
//! - under `max_bytes`: appended to, with the byte count seeded from its size
//! - from `max_bytes` up to `OVERSIZE_FACTOR * max_bytes`: rotated into the
//!   backup chain
//! - at or over `OVERSIZE_FACTOR * max_bytes`: deleted outright

use crate::config::RotationConfig;
use crate::error::WriterError;
use crate::fs::Filesystem;
use crate::logger::Logger;
use crate::path::PathDescriptor;
use crate::rotation::{rotate_backups, RotationError};

/// What to do with the active path before opening it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// No file yet.
    Create,
    /// Keep appending to a file of this size.
    Append { size: u64 },
    /// Move a moderately oversized file into the chain.
    Rotate { size: u64 },
    /// Delete a file too large to be worth keeping.
    Discard { size: u64 },
}

impl StartupAction {
    /// Decide from the size of the existing file, `None` if absent.
    pub fn classify(existing: Option<u64>, config: &RotationConfig) -> Self {
        match existing {
            None => StartupAction::Create,
            Some(size) if size < config.max_bytes => StartupAction::Append { size },
            Some(size) if size < config.oversize_threshold() => StartupAction::Rotate { size },
            Some(size) => StartupAction::Discard { size },
        }
    }

    /// Byte count of the active file once the action has run.
    pub fn initial_bytes(&self) -> u64 {
        match *self {
            StartupAction::Append { size } => size,
            _ => 0,
        }
    }
}

/// Prepare the active path and open it for append.
///
/// Returns the open handle, the byte count to start from, and the action
/// taken. Any failure aborts; no handle is leaked.
pub fn open_active<F: Filesystem>(
    fs: &F,
    desc: &PathDescriptor,
    config: &RotationConfig,
    logger: &dyn Logger,
) -> Result<(F::Handle, u64, StartupAction), WriterError> {
    let path = desc.path();

    let existing = if fs.exists(path) {
        let size = fs.size_of(path).map_err(|source| RotationError::Probe {
            path: path.to_path_buf(),
            source,
        })?;
        Some(size)
    } else {
        None
    };

    let action = StartupAction::classify(existing, config);
    match action {
        StartupAction::Create => {
            logger.verbose(&format!("creating {}", path.display()));
        }
        StartupAction::Append { size } => {
            logger.verbose(&format!("appending to {} at {} bytes", path.display(), size));
        }
        StartupAction::Rotate { size } => {
            logger.verbose(&format!(
                "{} is {} bytes (limit {}), rotating before open",
                path.display(),
                size,
                config.max_bytes
            ));
            rotate_backups(fs, desc, config.max_backups, logger)?;
        }
        StartupAction::Discard { size } => {
            logger.info(&format!(
                "{} is {} bytes (>= {}), discarding",
                path.display(),
                size,
                config.oversize_threshold()
            ));
            fs.remove(path).map_err(|source| RotationError::Remove {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let open_err = |source| WriterError::Open {
        path: path.to_path_buf(),
        source,
    };
    fs.create_dir_all(desc.dir()).map_err(open_err)?;
    let handle = fs.open_append(path).map_err(open_err)?;

    Ok((handle, action.initial_bytes(), action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFilesystem;
    use crate::logger::{MockLogger, NullLogger};
    use std::path::PathBuf;

    fn desc() -> PathDescriptor {
        PathDescriptor::resolve("/tmp/logs/app.log").expect("resolve")
    }

    // ===========================================
    // classify
    // ===========================================

    #[test]
    fn test_classify_missing() {
        let config = RotationConfig::new(20, 2);
        assert_eq!(StartupAction::classify(None, &config), StartupAction::Create);
    }

    #[test]
    fn test_classify_boundaries() {
        let config = RotationConfig::new(20, 2);
        assert_eq!(
            StartupAction::classify(Some(0), &config),
            StartupAction::Append { size: 0 }
        );
        assert_eq!(
            StartupAction::classify(Some(19), &config),
            StartupAction::Append { size: 19 }
        );
        assert_eq!(
            StartupAction::classify(Some(20), &config),
            StartupAction::Rotate { size: 20 }
        );
        assert_eq!(
            StartupAction::classify(Some(199), &config),
            StartupAction::Rotate { size: 199 }
        );
        assert_eq!(
            StartupAction::classify(Some(200), &config),
            StartupAction::Discard { size: 200 }
        );
    }

    #[test]
    fn test_initial_bytes() {
        assert_eq!(StartupAction::Create.initial_bytes(), 0);
        assert_eq!(StartupAction::Append { size: 7 }.initial_bytes(), 7);
        assert_eq!(StartupAction::Rotate { size: 30 }.initial_bytes(), 0);
        assert_eq!(StartupAction::Discard { size: 300 }.initial_bytes(), 0);
    }

    // ===========================================
    // open_active
    // ===========================================

    #[test]
    fn test_open_creates_file_and_dir() {
        let fs = MockFilesystem::new();
        let config = RotationConfig::new(20, 2);

        let (_handle, bytes, action) =
            open_active(&fs, &desc(), &config, &NullLogger).expect("open");

        assert_eq!(action, StartupAction::Create);
        assert_eq!(bytes, 0);
        assert!(fs.exists(&PathBuf::from("/tmp/logs")));
        assert_eq!(fs.get_file(desc().path()), Some(vec![]));
    }

    #[test]
    fn test_open_appends_under_threshold() {
        let fs = MockFilesystem::new();
        fs.add_file(desc().path().to_path_buf(), b"aaaaa\n".to_vec());
        let config = RotationConfig::new(20, 2);

        let (_handle, bytes, _) = open_active(&fs, &desc(), &config, &NullLogger).expect("open");

        assert_eq!(bytes, 6);
        assert_eq!(fs.get_file(desc().path()), Some(b"aaaaa\n".to_vec()));
    }

    #[test]
    fn test_open_rotates_moderately_oversized() {
        let fs = MockFilesystem::new();
        fs.add_file(desc().path().to_path_buf(), vec![b'a'; 21]);
        let config = RotationConfig::new(20, 2);

        let (_handle, bytes, action) =
            open_active(&fs, &desc(), &config, &NullLogger).expect("open");

        assert_eq!(action, StartupAction::Rotate { size: 21 });
        assert_eq!(bytes, 0);
        assert_eq!(fs.get_file(desc().path()), Some(vec![]));
        assert_eq!(fs.get_file(&desc().backup_path(1)), Some(vec![b'a'; 21]));
    }

    #[test]
    fn test_open_discards_far_oversized() {
        let fs = MockFilesystem::new();
        fs.add_file(desc().path().to_path_buf(), vec![b'a'; 102]);
        let config = RotationConfig::new(10, 2);
        let logger = MockLogger::new();

        let (_handle, bytes, action) = open_active(&fs, &desc(), &config, &logger).expect("open");

        assert_eq!(action, StartupAction::Discard { size: 102 });
        assert_eq!(bytes, 0);
        assert_eq!(fs.get_file(desc().path()), Some(vec![]));
        assert!(!fs.exists(&desc().backup_path(1)));
        assert!(logger.contains("discarding"));
    }

    #[test]
    fn test_open_rotation_failure_is_fatal() {
        let fs = MockFilesystem::new();
        fs.add_file(desc().path().to_path_buf(), vec![b'a'; 25]);
        fs.fail_rename_from(desc().path().to_path_buf());
        let config = RotationConfig::new(20, 2);

        let err = open_active(&fs, &desc(), &config, &NullLogger).unwrap_err();

        assert!(matches!(err, WriterError::Rotation(RotationError::Rename { .. })));
    }

    #[test]
    fn test_open_discard_failure_is_fatal() {
        let fs = MockFilesystem::new();
        fs.add_file(desc().path().to_path_buf(), vec![b'a'; 500]);
        fs.fail_remove(desc().path().to_path_buf());
        let config = RotationConfig::new(20, 2);

        let err = open_active(&fs, &desc(), &config, &NullLogger).unwrap_err();

        assert!(matches!(err, WriterError::Rotation(RotationError::Remove { .. })));
    }

    #[test]
    fn test_open_failure_is_open_error() {
        let fs = MockFilesystem::new();
        fs.set_fail_opens(true);
        let config = RotationConfig::new(20, 2);

        let err = open_active(&fs, &desc(), &config, &NullLogger).unwrap_err();

        assert!(matches!(err, WriterError::Open { .. }));
    }
}
