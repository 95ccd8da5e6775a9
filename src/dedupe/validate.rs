//! Consistency and filesystem checks on a deletion plan.
//!
//! Run once when the plan is made and again by the mover right before it
//! touches anything, since the filesystem may have changed in between.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::index::{ContentHash, HashIndex};

/// Reasons a deletion plan is refused.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Some paths are scheduled both for deletion and for keeping.
    #[error("{} path(s) of {hash} are both deleted and kept: {}", paths.len(), display_paths(paths))]
    ConflictingAssignment {
        /// Hash whose tables overlap
        hash: ContentHash,
        /// Offending paths, sorted
        paths: Vec<PathBuf>,
    },

    /// A planned path no longer exists.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// A planned path is a directory.
    #[error("is a directory: {0}")]
    IsDirectory(PathBuf),

    /// A planned path is a symbolic link.
    #[error("is a symbolic link: {0}")]
    IsSymlink(PathBuf),

    /// A planned path could not be inspected.
    #[error("cannot inspect {path}: {source}")]
    Io {
        /// Path being checked
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ValidationError {
    /// The path the error is about, if it concerns a single path.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound(p)
            | Self::IsDirectory(p)
            | Self::IsSymlink(p)
            | Self::Io { path: p, .. } => Some(p),
            Self::ConflictingAssignment { .. } => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check a deletion plan.
///
/// 1. No `(hash, path)` may appear in both tables.
/// 2. Every path in either table must exist as a regular file and must not
///    be a symbolic link.
///
/// Checks run in a fixed order (deletions before keeps, then hash, then
/// path), so the first reported problem is reproducible.
///
/// # Errors
///
/// The first violation found.
pub fn validate(deltable: &HashIndex, keeptable: &HashIndex) -> Result<(), ValidationError> {
    check_disjoint(deltable, keeptable)?;

    for table in [deltable, keeptable] {
        for hash in table.sorted_keys() {
            for path in table.snapshot(hash) {
                check_file(&path)?;
            }
        }
    }

    log::debug!(
        "Validated plan: {} deletions, {} keeps",
        deltable.len(),
        keeptable.len()
    );
    Ok(())
}

/// Step 1 of [`validate`] on its own: the tables share no `(hash, path)`.
///
/// # Errors
///
/// `ConflictingAssignment` for the first overlapping hash.
pub fn check_disjoint(deltable: &HashIndex, keeptable: &HashIndex) -> Result<(), ValidationError> {
    for hash in deltable.sorted_keys() {
        let Some(kept) = keeptable.members(hash) else {
            continue;
        };
        let overlap: Vec<PathBuf> = deltable
            .snapshot(hash)
            .into_iter()
            .filter(|p| kept.contains(p))
            .collect();
        if !overlap.is_empty() {
            log::error!("Conflicting assignment for {}: {:?}", hash, overlap);
            return Err(ValidationError::ConflictingAssignment {
                hash: hash.clone(),
                paths: overlap,
            });
        }
    }
    Ok(())
}

/// Existence check for a single planned path.
///
/// A dangling symbolic link reports as `FileNotFound`; a link to a
/// directory reports as `IsDirectory`.
///
/// # Errors
///
/// `FileNotFound`, `IsDirectory`, `IsSymlink` or `Io`.
pub fn check_file(path: &Path) -> Result<(), ValidationError> {
    let target = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ValidationError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if target.is_dir() {
        return Err(ValidationError::IsDirectory(path.to_path_buf()));
    }

    let link = fs::symlink_metadata(path).map_err(|e| ValidationError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if link.file_type().is_symlink() {
        return Err(ValidationError::IsSymlink(path.to_path_buf()));
    }

    Ok(())
}
