//! Backup chain rotation.
//!
//! The chain is the contiguous run of files at indices `0..k` (index 0 being
//! the active file), with `k` never above [`chain_capacity`]. Rotating shifts
//! every file up one index, highest first. A file that would land on index
//! `max_backups` is evicted instead, so slot `max_backups` is never filled and
//! at most `max_backups - 1` rotated files sit behind the active file.
//!
//! A failed rename aborts the remaining sequence. Files already moved stay
//! moved, which can leave a gap in the chain; [`stray_backups`] reports files
//! stranded past such a gap.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::fs::{Filesystem, FsError};
use crate::logger::Logger;
use crate::naming::parse_backup_index;
use crate::path::PathDescriptor;

/// Errors from probing or shifting the backup chain.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("failed to inspect {}: {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("failed to evict {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: FsError,
    },

    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: FsError,
    },
}

/// A file present in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFile {
    pub index: usize,
    pub path: PathBuf,
    pub size: u64,
}

/// Index arithmetic of one rotation, before anything touches the disk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RotationPlan {
    /// Index removed before shifting.
    pub evict: Option<usize>,

    /// `(from, to)` index pairs in execution order (highest first).
    pub renames: Vec<(usize, usize)>,
}

/// Result of a rotation operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RotationResult {
    /// Path of the evicted file, if the chain was full.
    pub evicted: Option<PathBuf>,

    /// Renames performed, in execution order.
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

/// Number of chain indices `max_backups` allows, active file included.
///
/// Never below 1: with zero or one backups the active file is still tracked,
/// and rotating it discards it.
pub fn chain_capacity(max_backups: usize) -> usize {
    max_backups.max(1)
}

/// Enumerate the chain from index 0 upward, stopping at the first missing
/// index or before index `limit`.
pub fn list_backup_chain<F: Filesystem>(
    fs: &F,
    desc: &PathDescriptor,
    limit: usize,
) -> Result<Vec<BackupFile>, RotationError> {
    let mut chain = Vec::new();
    for index in 0..limit {
        let path = desc.backup_path(index);
        if !fs.exists(&path) {
            break;
        }
        let size = fs.size_of(&path).map_err(|source| RotationError::Probe {
            path: path.clone(),
            source,
        })?;
        chain.push(BackupFile { index, path, size });
    }
    Ok(chain)
}

/// Plan the rotation of a chain of `present` files.
///
/// With the chain at capacity, the highest file would move onto index
/// `max_backups`; it is evicted and everything below it moves up.
pub fn plan_rotation(present: usize, max_backups: usize) -> RotationPlan {
    if present == 0 {
        return RotationPlan::default();
    }
    let capacity = chain_capacity(max_backups);
    let present = present.min(capacity);
    let evict = (present == capacity).then_some(capacity - 1);
    let movable = present.min(capacity - 1);
    RotationPlan {
        evict,
        renames: (0..movable).rev().map(|i| (i, i + 1)).collect(),
    }
}

/// Shift the chain up by one, freeing index 0.
///
/// A missing active file with no backups is a no-op.
pub fn rotate_backups<F: Filesystem>(
    fs: &F,
    desc: &PathDescriptor,
    max_backups: usize,
    logger: &dyn Logger,
) -> Result<RotationResult, RotationError> {
    let chain = list_backup_chain(fs, desc, chain_capacity(max_backups))?;
    let plan = plan_rotation(chain.len(), max_backups);
    let mut result = RotationResult::default();

    if let Some(index) = plan.evict {
        let path = desc.backup_path(index);
        fs.remove(&path).map_err(|source| RotationError::Remove {
            path: path.clone(),
            source,
        })?;
        logger.verbose(&format!("evicted {}", path.display()));
        result.evicted = Some(path);
    }

    for (from, to) in plan.renames {
        let from = desc.backup_path(from);
        let to = desc.backup_path(to);
        fs.rename(&from, &to).map_err(|source| RotationError::Rename {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        logger.debug(&format!("renamed {} -> {}", from.display(), to.display()));
        result.renamed.push((from, to));
    }

    Ok(result)
}

/// Files named like chain members that sit beyond the contiguous chain.
pub fn stray_backups<F: Filesystem>(
    fs: &F,
    desc: &PathDescriptor,
    chain_len: usize,
) -> Result<Vec<PathBuf>, RotationError> {
    let (Some(stem), Some(ext)) = (desc.stem().to_str(), desc.extension().to_str()) else {
        return Ok(Vec::new());
    };
    let files = fs
        .list_dir(desc.dir())
        .map_err(|source| RotationError::Probe {
            path: desc.dir().to_path_buf(),
            source,
        })?;

    Ok(files
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| parse_backup_index(name, stem, ext))
                .is_some_and(|index| index >= chain_len)
        })
        .collect())
}
