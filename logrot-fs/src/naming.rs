//! Backup file naming.
//!
//! Index 0 is the active file `dir/stem.ext`; index n >= 1 is the n-th most
//! recent backup `dir/stem-n.ext`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Generate the path for the file at `index` in the rotation chain.
pub fn backup_filename(index: usize, dir: &Path, stem: &OsStr, extension: &OsStr) -> PathBuf {
    let mut name = OsString::from(stem);
    if index > 0 {
        name.push(format!("-{}", index));
    }
    name.push(extension);
    dir.join(name)
}

/// Parse the chain index back out of a file name.
/// Returns `None` for names that don't belong to this `stem`/`extension`.
pub fn parse_backup_index(file_name: &str, stem: &str, extension: &str) -> Option<usize> {
    let middle = file_name.strip_prefix(stem)?.strip_suffix(extension)?;
    if middle.is_empty() {
        return Some(0);
    }
    let digits = middle.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0')
    {
        return None;
    }
    digits.parse().ok()
}
