//! Injected diagnostics for the rotating writer.
//!
//! Diagnostics go through an explicitly supplied [`Logger`], never a global
//! facade. Library users get [`NullLogger`] unless they pass one.

use std::io::{self, Write};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;

/// How much of the writer's activity to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Rotation failures and oversized files being discarded.
    Normal,
    /// Startup decisions, rotations, evictions (`-v`).
    Verbose,
    /// Every rename in the chain (`-vv`).
    Debug,
}

impl Verbosity {
    /// Map a repeated `-v` flag count onto a level.
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }
}

/// Sink for writer diagnostics.
///
/// Shared between threads: whichever caller triggers a rotation logs it.
pub trait Logger: Send + Sync {
    fn log(&self, level: Verbosity, message: &str);

    fn info(&self, message: &str) {
        self.log(Verbosity::Normal, message);
    }

    fn verbose(&self, message: &str) {
        self.log(Verbosity::Verbose, message);
    }

    fn debug(&self, message: &str) {
        self.log(Verbosity::Debug, message);
    }
}

/// Render one diagnostic line: RFC 3339 UTC timestamp, then the message.
pub fn format_line(message: &str) -> String {
    format!(
        "{} logrot: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        message
    )
}

/// Logger writing timestamped lines at or below `level` to any byte sink.
#[derive(Debug)]
pub struct StreamLogger<W> {
    level: Verbosity,
    sink: Mutex<W>,
}

/// The CLI's logger.
pub type StderrLogger = StreamLogger<io::Stderr>;

impl<W: Write + Send> StreamLogger<W> {
    pub fn new(level: Verbosity, sink: W) -> Self {
        Self {
            level,
            sink: Mutex::new(sink),
        }
    }

    pub fn level(&self) -> Verbosity {
        self.level
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

impl StreamLogger<io::Stderr> {
    pub fn stderr(level: Verbosity) -> Self {
        Self::new(level, io::stderr())
    }
}

impl<W: Write + Send> Logger for StreamLogger<W> {
    fn log(&self, level: Verbosity, message: &str) {
        if level > self.level {
            return;
        }
        // diagnostics never fail the write that produced them
        let _ = writeln!(self.sink.lock(), "{}", format_line(message));
    }
}

/// One captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Verbosity,
    pub message: String,
}

/// Captures every diagnostic regardless of level. Clones share the capture.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn messages_at_level(&self, level: Verbosity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// True if any captured message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(needle))
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Verbosity, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Verbosity, _message: &str) {}
}
