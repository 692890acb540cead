//! Status command orchestration.
//!
//! Reports the active file, the contiguous backup chain behind it, and any
//! backup-named files stranded past a gap.

use std::fmt::Write as _;
use std::path::PathBuf;

use logrot_fs::{
    chain_capacity, list_backup_chain, stray_backups, BackupFile, Filesystem, PathDescriptor,
};
use serde::Serialize;

use crate::cli::StatusArgs;

use super::CommandResult;

/// Snapshot of a log file's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Absolute path of the active file.
    pub path: PathBuf,
    /// Whether the active file exists.
    pub active: bool,
    /// Chain members from index 0 upward.
    pub files: Vec<BackupFile>,
    /// Sum of `files` sizes.
    pub total_bytes: u64,
    /// Backup-named files outside the chain.
    pub stray: Vec<PathBuf>,
}

impl StatusReport {
    /// Render as a human-readable table.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.path.display());
        if !self.active {
            let _ = writeln!(out, "  (active file missing)");
        }
        for file in &self.files {
            let _ = writeln!(out, "  {:>3}  {:>12}  {}", file.index, file.size, file.path.display());
        }
        let _ = writeln!(
            out,
            "  {} file(s), {} bytes",
            self.files.len(),
            self.total_bytes
        );
        for path in &self.stray {
            let _ = writeln!(out, "  stray: {}", path.display());
        }
        out
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> CommandResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Execute the status command.
pub fn execute_status<F: Filesystem>(args: &StatusArgs, fs: &F) -> CommandResult<StatusReport> {
    let desc = PathDescriptor::resolve(&args.path)?;
    let files = list_backup_chain(fs, &desc, chain_capacity(args.max_backups))?;
    let stray = stray_backups(fs, &desc, files.len())?;

    Ok(StatusReport {
        path: desc.path().to_path_buf(),
        active: files.first().is_some_and(|f| f.index == 0),
        total_bytes: files.iter().map(|f| f.size).sum(),
        files,
        stray,
    })
}
