//! File stat records as stored in the hash database.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::index::ContentHash;

/// Stat snapshot of one scanned file.
///
/// `size`, `inode`, `mtime_ns` and `ctime_ns` decide whether a previously
/// computed hash may be reused: if any of them changed, the file is hashed
/// again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute, normalized path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Inode number (0 where the platform has none)
    pub inode: u64,
    /// Modification time, nanoseconds since the epoch
    pub mtime_ns: i64,
    /// Status change time, nanoseconds since the epoch
    pub ctime_ns: i64,
}

impl FileRecord {
    /// Build a record from already fetched metadata.
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            size: metadata.len(),
            inode: inode_of(metadata),
            mtime_ns: to_nanos(metadata.modified().ok()),
            ctime_ns: ctime_of(metadata),
        }
    }

    /// Stat `path` without following symbolic links.
    ///
    /// # Errors
    ///
    /// Any I/O error from `symlink_metadata`.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::symlink_metadata(path)?;
        Ok(Self::from_metadata(path.to_path_buf(), &metadata))
    }
}

/// A stored row: the stat record plus its hash, if computed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Stat data
    pub record: FileRecord,
    /// Content hash, `None` until hashed
    pub hash: Option<ContentHash>,
}

fn to_nanos(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
}

#[cfg(unix)]
fn inode_of(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.ino()
}

#[cfg(not(unix))]
fn inode_of(_metadata: &Metadata) -> u64 {
    0
}

#[cfg(unix)]
fn ctime_of(metadata: &Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    metadata
        .ctime()
        .saturating_mul(1_000_000_000)
        .saturating_add(metadata.ctime_nsec())
}

#[cfg(not(unix))]
fn ctime_of(metadata: &Metadata) -> i64 {
    to_nanos(metadata.created().ok())
}
