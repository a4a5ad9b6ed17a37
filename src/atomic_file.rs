//! Locked, atomic file replacement
//!
//! Writers take an exclusive lock on a sibling `<file>.lock`, write a
//! sibling `<file>.tmp`, fsync it and rename it over the target. The lock
//! lives in its own file so the rename never replaces a locked inode.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

/// `path` with `suffix` appended to its file name
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub(crate) fn lock_path(path: &Path) -> PathBuf {
    sibling(path, ".lock")
}

/// Block until the exclusive lock for `path` is held.
/// The lock is released when the returned handle is dropped.
pub(crate) fn lock_exclusive(path: &Path) -> io::Result<File> {
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path(path))?;
    lock_file.lock_exclusive()?;
    Ok(lock_file)
}

/// Replace `path` with `content` through a synced temp file.
/// Callers hold the lock from [`lock_exclusive`].
pub(crate) fn replace(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = sibling(path, ".tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    temp_file.write_all(content)?;
    temp_file.sync_all()?;
    std::fs::rename(&temp_path, path)
}
