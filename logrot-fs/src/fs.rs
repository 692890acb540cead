//! Filesystem abstraction for the rotating writer.
//!
//! Every probe and mutation the rotation engine performs goes through the
//! [`Filesystem`] trait so the engine can be driven against the real disk or
//! an in-memory mock with failure injection.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("path error: {0}")]
    Path(String),
}

impl FsError {
    /// True if the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// Trait for filesystem operations.
/// Abstracted for testing with mock implementations.
pub trait Filesystem: Send + Sync {
    /// Open file resource returned by [`Filesystem::open_append`].
    type Handle: Send;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Size of the file in bytes. A missing file has size 0.
    fn size_of(&self, path: &Path) -> Result<u64, FsError>;

    /// Rename `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Remove a file.
    fn remove(&self, path: &Path) -> Result<(), FsError>;

    /// Create directory and parents if needed.
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// Files directly inside `dir`, sorted by path. A missing directory is empty.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// Open a file for appending, creating it if it doesn't exist.
    fn open_append(&self, path: &Path) -> Result<Self::Handle, FsError>;

    /// Append the whole buffer. A short write is an error.
    fn write(&self, handle: &mut Self::Handle, data: &[u8]) -> Result<(), FsError>;

    /// Flush and release the handle.
    fn close(&self, handle: Self::Handle) -> Result<(), FsError>;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    type Handle = File;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn size_of(&self, path: &Path) -> Result<u64, FsError> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        fs::rename(from, to)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let mut files = Vec::new();

        if !dir.exists() {
            return Ok(files);
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn open_append(&self, path: &Path) -> Result<File, FsError> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    fn write(&self, handle: &mut File, data: &[u8]) -> Result<(), FsError> {
        handle.write_all(data)?;
        Ok(())
    }

    fn close(&self, handle: File) -> Result<(), FsError> {
        // sync_data skips metadata, still durable for append-only
        handle.sync_data()?;
        Ok(())
    }
}

/// Handle into a [`MockFilesystem`] file.
#[derive(Debug)]
pub struct MockHandle {
    path: PathBuf,
}

impl MockHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    fail_renames_from: HashSet<PathBuf>,
    fail_removes: HashSet<PathBuf>,
    fail_opens: bool,
    fail_writes: bool,
    fail_closes: bool,
    write_cap: Option<usize>,
    renames: Vec<(PathBuf, PathBuf)>,
}

/// Mock filesystem for testing.
/// Cloning creates a new handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    state: Arc<RwLock<MockState>>,
}

fn injected(what: &str, path: &Path) -> FsError {
    FsError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("injected {} failure: {}", what, path.display()),
    ))
}

impl MockFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all files in the mock filesystem.
    pub fn files(&self) -> HashMap<PathBuf, Vec<u8>> {
        self.state.read().files.clone()
    }

    /// Get content of a specific file.
    pub fn get_file(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.read().files.get(path).cloned()
    }

    /// Add a file directly (for test setup).
    pub fn add_file(&self, path: PathBuf, data: Vec<u8>) {
        self.state.write().files.insert(path, data);
    }

    /// Every successful rename, in execution order.
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.read().renames.clone()
    }

    /// Make any rename whose source is `path` fail.
    pub fn fail_rename_from(&self, path: PathBuf) {
        self.state.write().fail_renames_from.insert(path);
    }

    /// Make removing `path` fail.
    pub fn fail_remove(&self, path: PathBuf) {
        self.state.write().fail_removes.insert(path);
    }

    /// Toggle failure of every subsequent open.
    pub fn set_fail_opens(&self, fail: bool) {
        self.state.write().fail_opens = fail;
    }

    /// Toggle failure of every subsequent write.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.write().fail_writes = fail;
    }

    /// Toggle failure of every subsequent close. The handle is consumed either way.
    pub fn set_fail_closes(&self, fail: bool) {
        self.state.write().fail_closes = fail;
    }

    /// Accept at most `cap` bytes per write, then report a short write.
    pub fn set_write_cap(&self, cap: Option<usize>) {
        self.state.write().write_cap = cap;
    }
}

impl Filesystem for MockFilesystem {
    type Handle = MockHandle;

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.read();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn size_of(&self, path: &Path) -> Result<u64, FsError> {
        Ok(self
            .state
            .read()
            .files
            .get(path)
            .map_or(0, |data| data.len() as u64))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let mut state = self.state.write();
        if state.fail_renames_from.contains(from) {
            return Err(injected("rename", from));
        }
        let data = state.files.remove(from).ok_or_else(|| {
            FsError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", from.display()),
            ))
        })?;
        state.files.insert(to.to_path_buf(), data);
        state.renames.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.write();
        if state.fail_removes.contains(path) {
            return Err(injected("remove", path));
        }
        state.files.remove(path);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        self.state.write().dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let mut files: Vec<PathBuf> = self
            .state
            .read()
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    fn open_append(&self, path: &Path) -> Result<MockHandle, FsError> {
        let mut state = self.state.write();
        if state.fail_opens {
            return Err(injected("open", path));
        }
        state.files.entry(path.to_path_buf()).or_default();
        Ok(MockHandle {
            path: path.to_path_buf(),
        })
    }

    fn write(&self, handle: &mut MockHandle, data: &[u8]) -> Result<(), FsError> {
        let mut state = self.state.write();
        if state.fail_writes {
            return Err(injected("write", &handle.path));
        }
        let accepted = state.write_cap.map_or(data.len(), |cap| cap.min(data.len()));
        state
            .files
            .entry(handle.path.clone())
            .or_default()
            .extend_from_slice(&data[..accepted]);
        if accepted < data.len() {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", accepted, data.len()),
            )));
        }
        Ok(())
    }

    fn close(&self, handle: MockHandle) -> Result<(), FsError> {
        if self.state.read().fail_closes {
            return Err(injected("close", &handle.path));
        }
        Ok(())
    }
}
