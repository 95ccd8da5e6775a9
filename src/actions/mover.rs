//! Executing a partition: disposing of every scheduled deletion.
//!
//! # Overview
//!
//! [`Mover`] takes a validated [`Partition`] and gets rid of each file in
//! its deletion set, in hash order and then path order:
//!
//! - [`Disposal::TrashDir`] (default): move into a trash directory that
//!   mirrors the original absolute path, so files can be put back by hand
//! - [`Disposal::SystemTrash`]: the platform recycle bin via the trash crate
//! - [`Disposal::Permanent`]: `fs::remove_file`
//!
//! After each successful disposal the file's row is removed from the store.
//! A row that cannot be removed is reported in
//! [`BatchMoveResult::stale_rows`]; the next scan of its tree drops it.
//!
//! # Safety
//!
//! The partition is validated again right before anything is touched. A
//! file that vanished or became a symlink since planning stops the whole
//! run before the first move.
//!
//! # Example
//!
//! ```no_run
//! use dupetree::actions::mover::{Disposal, MoveConfig, Mover};
//! use dupetree::dedupe::{Partitioner, Policy};
//! use dupetree::store::HashStore;
//! use std::path::{Path, PathBuf};
//!
//! let mut store = HashStore::open(Path::new("/tmp/dupes.sqlite")).unwrap();
//! let plan = Partitioner::new("/home/user/Downloads", ".", Policy::default())
//!     .unwrap()
//!     .partition(&store.dupes().unwrap());
//!
//! let config = MoveConfig::new(Disposal::TrashDir(PathBuf::from("/home/user/.dupetreeTrash")));
//! let result = Mover::new(&mut store, config).execute(&plan, None).unwrap();
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::dedupe::{Partition, ValidationError};
use crate::progress::ProgressCallback;
use crate::store::HashStore;

/// Error for a single file that could not be disposed of.
#[derive(Debug, Error)]
pub enum MoveError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to move or delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Moving into the trash directory failed.
    #[error("cannot move {path} to {target}: {source}")]
    MoveFailed {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// System trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MoveError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::MoveFailed { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::DeleteFailed { path: p, .. } => p,
        }
    }
}

/// Errors that abort a whole run before anything is touched.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The partition failed its last check.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Where deleted files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposal {
    /// Move into this directory, mirroring the original path.
    TrashDir(PathBuf),
    /// Platform recycle bin.
    SystemTrash,
    /// Remove for good.
    Permanent,
}

impl Disposal {
    /// Verb for log and summary lines.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::TrashDir(_) => "Moved",
            Self::SystemTrash => "Trashed",
            Self::Permanent => "Deleted",
        }
    }
}

/// Result of disposing of one file.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Path that was removed.
    pub path: PathBuf,
    /// Where it went, for trash-directory moves.
    pub target: Option<PathBuf>,
    /// Size of the file in bytes.
    pub size: u64,
}

/// Results of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchMoveResult {
    /// Files disposed of.
    pub successes: Vec<MoveResult>,
    /// Failures with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Files disposed of whose store row could not be removed.
    pub stale_rows: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchMoveResult {
    /// Number of files disposed of.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempts.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if every attempt succeeded and the store is in sync.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && self.stale_rows.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = bytesize::ByteSize::b(self.bytes_freed);
        let mut line = if self.failures.is_empty() {
            format!("Removed {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Removed {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        };
        if !self.stale_rows.is_empty() {
            line.push_str(&format!(
                ", {} database row(s) not removed",
                self.stale_rows.len()
            ));
        }
        line
    }
}

/// Configuration for a [`Mover`].
#[derive(Debug, Clone)]
pub struct MoveConfig {
    /// Where files go.
    pub disposal: Disposal,
    /// Keep going after a per-file failure.
    pub continue_on_error: bool,
}

impl MoveConfig {
    /// Create a config with the given disposal that continues on error.
    #[must_use]
    pub fn new(disposal: Disposal) -> Self {
        Self {
            disposal,
            continue_on_error: true,
        }
    }

    /// Enable/disable continue on error.
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Applies partitions to the filesystem and the store.
pub struct Mover<'a> {
    store: &'a mut HashStore,
    config: MoveConfig,
}

impl<'a> Mover<'a> {
    /// Create a mover that keeps `store` in sync.
    pub fn new(store: &'a mut HashStore, config: MoveConfig) -> Self {
        Self { store, config }
    }

    /// Dispose of every file in `partition.deltable`.
    ///
    /// # Errors
    ///
    /// `Validation` if the partition no longer holds; nothing is touched.
    ///
    /// Per-file failures are collected in the returned [`BatchMoveResult`].
    /// A file that was disposed of but whose store row could not be removed
    /// stays in `successes` and is also listed in `stale_rows`.
    pub fn execute(
        &mut self,
        partition: &Partition,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchMoveResult, ExecuteError> {
        partition.validate()?;

        let deltable = &partition.deltable;
        let total = deltable.len();
        let mut result = BatchMoveResult::default();

        if let Some(cb) = progress {
            cb.on_phase_start("moving", total);
        }

        let mut current = 0;
        'groups: for hash in deltable.sorted_keys() {
            for path in deltable.snapshot(hash) {
                current += 1;
                if let Some(cb) = progress {
                    cb.on_progress(current, path.to_string_lossy().as_ref());
                }

                match dispose(&path, &self.config.disposal) {
                    Ok(moved) => {
                        result.bytes_freed += moved.size;
                        result.successes.push(moved);
                        if let Err(e) = self.store.delete_file(&path) {
                            log::warn!("Removed {} but kept its database row: {}", path.display(), e);
                            result.stale_rows.push((path, e.to_string()));
                            if !self.config.continue_on_error {
                                break 'groups;
                            }
                        }
                    }
                    Err(e) => {
                        let message = e.to_string();
                        log::warn!("Failed to remove {}: {}", path.display(), message);
                        result.failures.push((path, message));

                        if !self.config.continue_on_error {
                            log::info!("Stopping after first failure (continue_on_error=false)");
                            break 'groups;
                        }
                    }
                }
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end("moving");
        }
        log::info!("{}", result.summary());
        Ok(result)
    }
}

/// Dispose of a single file.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` if the file cannot be inspected
/// - `MoveFailed`, `TrashFailed` or `DeleteFailed` from the disposal itself
pub fn dispose(path: &Path, disposal: &Disposal) -> Result<MoveResult, MoveError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MoveError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => MoveError::PermissionDenied(path.to_path_buf()),
        _ => MoveError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let size = metadata.len();

    let target = match disposal {
        Disposal::TrashDir(trash_dir) => {
            let target = trash_target(trash_dir, path);
            move_file(path, &target).map_err(|source| MoveError::MoveFailed {
                path: path.to_path_buf(),
                target: target.clone(),
                source,
            })?;
            Some(target)
        }
        Disposal::SystemTrash => {
            trash::delete(path).map_err(|e| MoveError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            None
        }
        Disposal::Permanent => {
            fs::remove_file(path).map_err(|source| MoveError::DeleteFailed {
                path: path.to_path_buf(),
                source,
            })?;
            None
        }
    };

    match target {
        Some(ref t) => log::info!("{} {} -> {}", disposal.verb(), path.display(), t.display()),
        None => log::info!("{} {} ({} bytes)", disposal.verb(), path.display(), size),
    }

    Ok(MoveResult {
        path: path.to_path_buf(),
        target,
        size,
    })
}

/// Free location for `file` inside `trash_dir`.
///
/// The file's absolute path is re-rooted under `trash_dir`. If that name is
/// taken, `stem_1.ext`, `stem_2.ext`, ... are tried in turn.
#[must_use]
pub fn trash_target(trash_dir: &Path, file: &Path) -> PathBuf {
    let relative: PathBuf = file
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    let target = trash_dir.join(relative);
    if !exists(&target) {
        return target;
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()));

    (1..)
        .map(|n| target.with_file_name(format!("{stem}_{n}{}", extension.as_deref().unwrap_or(""))))
        .find(|candidate| !exists(candidate))
        .unwrap_or(target)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Rename `from` to `to`, copying across filesystems when needed.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("Cross-device move, copying {}", from.display());
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
