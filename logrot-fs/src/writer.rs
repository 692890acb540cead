//! The rotating writer.
//!
//! Appends go straight to the active file while it is under `max_bytes`.
//! Once it is at or over the threshold, the next write is cut at the first
//! separator: everything up to and including the separator finishes the
//! current file, the chain rotates, and the rest starts the fresh file. A
//! write with no separator goes wholesale to the current file and rotation
//! waits for a later write, so an entry is never split across two files and
//! the active file may overshoot `max_bytes` by an unbounded amount.
//!
//! All of this, rotation included, runs under a single lock per writer.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RotationConfig;
use crate::error::WriterError;
use crate::fs::{Filesystem, FsError, RealFilesystem};
use crate::lifecycle::{open_active, StartupAction};
use crate::logger::{Logger, NullLogger};
use crate::path::PathDescriptor;
use crate::rotation::rotate_backups;

struct WriterState<H> {
    /// `None` once closed, or after a failed reopen.
    handle: Option<H>,
    /// Bytes in the active file.
    bytes_written: u64,
}

/// Size-bounded, rotating, append-only log file.
pub struct RotatingWriter<F: Filesystem = RealFilesystem> {
    fs: F,
    desc: PathDescriptor,
    config: RotationConfig,
    logger: Arc<dyn Logger>,
    startup: StartupAction,
    state: Mutex<WriterState<F::Handle>>,
}

/// Builder for [`RotatingWriter`].
pub struct WriterBuilder {
    path: PathBuf,
    config: RotationConfig,
    logger: Arc<dyn Logger>,
}

impl WriterBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: RotationConfig::default(),
            logger: Arc::new(NullLogger),
        }
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.config.max_bytes = max_bytes;
        self
    }

    pub fn max_backups(mut self, max_backups: usize) -> Self {
        self.config.max_backups = max_backups;
        self
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.config.separator = separator;
        self
    }

    pub fn config(mut self, config: RotationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Open on the real filesystem.
    pub fn open(self) -> Result<RotatingWriter, WriterError> {
        self.open_with(RealFilesystem)
    }

    /// Open on any filesystem implementation.
    pub fn open_with<F: Filesystem>(self, fs: F) -> Result<RotatingWriter<F>, WriterError> {
        self.config.validate()?;
        let desc = PathDescriptor::resolve(&self.path)?;
        RotatingWriter::open_resolved(fs, desc, self.config, self.logger)
    }
}

impl RotatingWriter<RealFilesystem> {
    /// Open `path` with the default separator and no diagnostics.
    pub fn open(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        max_backups: usize,
    ) -> Result<Self, WriterError> {
        WriterBuilder::new(path)
            .max_bytes(max_bytes)
            .max_backups(max_backups)
            .open()
    }

    pub fn builder(path: impl Into<PathBuf>) -> WriterBuilder {
        WriterBuilder::new(path)
    }
}

impl<F: Filesystem> RotatingWriter<F> {
    fn open_resolved(
        fs: F,
        desc: PathDescriptor,
        config: RotationConfig,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, WriterError> {
        let (handle, bytes_written, startup) =
            open_active(&fs, &desc, &config, logger.as_ref())?;
        Ok(Self {
            fs,
            desc,
            config,
            logger,
            startup,
            state: Mutex::new(WriterState {
                handle: Some(handle),
                bytes_written,
            }),
        })
    }

    /// Absolute path of the active file.
    pub fn path(&self) -> &Path {
        self.desc.path()
    }

    pub fn descriptor(&self) -> &PathDescriptor {
        &self.desc
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// What was done with a pre-existing active file on open.
    pub fn startup_action(&self) -> StartupAction {
        self.startup
    }

    /// Bytes in the active file.
    pub fn bytes_written(&self) -> u64 {
        self.state.lock().bytes_written
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().handle.is_none()
    }

    /// Append `buf`, rotating at the first separator if the active file is
    /// already at or over `max_bytes`.
    ///
    /// Returns `buf.len()` on success. On error, bytes before the failing
    /// step may already be on disk but are not counted.
    pub fn write(&self, buf: &[u8]) -> Result<usize, WriterError> {
        let mut state = self.state.lock();
        if state.handle.is_none() {
            return Err(WriterError::Closed);
        }

        let mut pending = buf;
        loop {
            let boundary = if state.bytes_written >= self.config.max_bytes {
                pending.iter().position(|&b| b == self.config.separator)
            } else {
                None
            };

            let Some(pos) = boundary else {
                self.append(&mut state, pending)?;
                return Ok(buf.len());
            };

            let (head, tail) = pending.split_at(pos + 1);
            self.append(&mut state, head)?;
            self.rotate(&mut state)?;
            if tail.is_empty() {
                return Ok(buf.len());
            }
            pending = tail;
        }
    }

    /// Close the active file. Later writes fail with [`WriterError::Closed`].
    pub fn close(&self) -> Result<(), WriterError> {
        let mut state = self.state.lock();
        let handle = state.handle.take().ok_or(WriterError::Closed)?;
        self.fs.close(handle).map_err(WriterError::Close)
    }

    fn append(&self, state: &mut WriterState<F::Handle>, data: &[u8]) -> Result<(), WriterError> {
        if data.is_empty() {
            return Ok(());
        }
        let handle = state.handle.as_mut().ok_or(WriterError::Closed)?;
        self.fs.write(handle, data).map_err(WriterError::Write)?;
        state.bytes_written += data.len() as u64;
        Ok(())
    }

    fn rotate(&self, state: &mut WriterState<F::Handle>) -> Result<(), WriterError> {
        let closed_at = state.bytes_written;
        if let Some(handle) = state.handle.take() {
            if let Err(source) = self.fs.close(handle) {
                self.logger.info(&format!(
                    "failed to close {}: {}",
                    self.desc.path().display(),
                    source
                ));
                return self.resume(state, WriterError::Close(source));
            }
        }

        match rotate_backups(&self.fs, &self.desc, self.config.max_backups, self.logger.as_ref())
        {
            Ok(_) => {
                self.logger.verbose(&format!(
                    "rotated {} at {} bytes",
                    self.desc.path().display(),
                    closed_at
                ));
                self.reopen(state, 0)
            }
            Err(err) => {
                self.logger.info(&format!("rotation failed: {}", err));
                self.resume(state, err.into())
            }
        }
    }

    /// Continue on whatever file now sits at the active path, then report
    /// `err`. The chain may be half-shifted.
    fn resume(&self, state: &mut WriterState<F::Handle>, err: WriterError) -> Result<(), WriterError> {
        let path = self.desc.path();
        let size = if self.fs.exists(path) {
            self.fs
                .size_of(path)
                .map_err(|source| self.open_error(source))?
        } else {
            0
        };
        self.reopen(state, size)?;
        Err(err)
    }

    fn reopen(&self, state: &mut WriterState<F::Handle>, bytes: u64) -> Result<(), WriterError> {
        let handle = self
            .fs
            .open_append(self.desc.path())
            .map_err(|source| self.open_error(source))?;
        state.handle = Some(handle);
        state.bytes_written = bytes;
        Ok(())
    }

    fn open_error(&self, source: FsError) -> WriterError {
        WriterError::Open {
            path: self.desc.path().to_path_buf(),
            source,
        }
    }
}

impl<F: Filesystem> io::Write for &RotatingWriter<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::<F>::write(*self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F: Filesystem> io::Write for RotatingWriter<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::<F>::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<F: Filesystem> std::fmt::Debug for RotatingWriter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("path", &self.desc.path())
            .field("config", &self.config)
            .field("bytes_written", &self.bytes_written())
            .finish()
    }
}
