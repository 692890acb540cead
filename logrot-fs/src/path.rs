//! Resolution of the user-supplied log path.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::naming::backup_filename;

/// Errors from resolving a log path.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("log path is empty")]
    Empty,

    #[error("log path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("cannot determine working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

/// Absolute location of the active log file, split into the parts the
/// backup names are built from.
///
/// `path == dir / (stem + extension)` always holds. The extension keeps its
/// leading dot and is empty when the file name has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDescriptor {
    path: PathBuf,
    dir: PathBuf,
    stem: OsString,
    extension: OsString,
}

impl PathDescriptor {
    /// Resolve `path` against the current working directory.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, PathError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(PathError::Empty);
        }
        if path.is_absolute() {
            return Self::from_absolute(path);
        }
        let cwd = std::env::current_dir().map_err(PathError::WorkingDir)?;
        Self::resolve_in(&cwd, path)
    }

    /// Resolve `path` against an explicit base directory.
    pub fn resolve_in(base: &Path, path: &Path) -> Result<Self, PathError> {
        if path.as_os_str().is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_absolute(&base.join(path))
    }

    fn from_absolute(joined: &Path) -> Result<Self, PathError> {
        let path = normalize(joined);
        let file_name = path
            .file_name()
            .ok_or_else(|| PathError::NoFileName(joined.to_path_buf()))?;
        let dir = path
            .parent()
            .ok_or_else(|| PathError::NoFileName(joined.to_path_buf()))?
            .to_path_buf();

        let (stem, extension) = split_extension(file_name, &path);
        Ok(Self {
            path,
            dir,
            stem,
            extension,
        })
    }

    /// Absolute path of the active file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &OsStr {
        &self.stem
    }

    pub fn extension(&self) -> &OsStr {
        &self.extension
    }

    /// Path of the file at `index` in the chain; 0 is the active file.
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_filename(index, &self.dir, &self.stem, &self.extension)
    }
}

fn split_extension(file_name: &OsStr, path: &Path) -> (OsString, OsString) {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            let mut dotted = OsString::from(".");
            dotted.push(ext);
            (stem.to_os_string(), dotted)
        }
        // `.log` is all extension: backups go to `-1.log`, not `.log-1`
        _ if file_name.to_string_lossy().starts_with('.') => {
            (OsString::new(), file_name.to_os_string())
        }
        _ => (file_name.to_os_string(), OsString::new()),
    }
}

/// Lexically clean an absolute path: drop `.` and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
