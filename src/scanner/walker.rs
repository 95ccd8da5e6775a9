//! Directory walker using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] lists the regular files below a root directory as
//! [`FileRecord`]s ready to be inserted into the store.
//!
//! - Parallel directory reading via jwalk, children sorted by name
//! - Symbolic links are never followed and never listed
//! - Hidden files and directories (dot-names) are skipped by default
//! - Files whose path is not valid UTF-8 are reported as errors
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupetree::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{ScanError, WalkerConfig};
use crate::path_utils;
use crate::store::FileRecord;

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative roots are made absolute against the current directory and
    /// `.`/`..` components are resolved.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root: path_utils::normalize_lexical(&absolute),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Absolute root of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A missing or non-directory root yields a single error.
    pub fn walk(&self) -> Box<dyn Iterator<Item = Result<FileRecord, ScanError>> + '_> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Box::new(std::iter::once(Err(ScanError::NotADirectory(
                    self.root.clone(),
                ))))
            }
            Err(e) => return Box::new(std::iter::once(Err(self.io_error(&self.root, e)))),
        }

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(
            walk_dir
                .into_iter()
                .take_while(move |_| {
                    let stop = self.is_shutdown_requested();
                    if stop {
                        log::debug!("Walker: Shutdown requested, stopping iteration");
                    }
                    !stop
                })
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => {
                        let file_type = entry.file_type();
                        if file_type.is_dir() {
                            return None;
                        }
                        let path = entry.path();
                        if file_type.is_symlink() {
                            log::trace!("Skipping symlink: {}", path.display());
                            return None;
                        }
                        if !file_type.is_file() {
                            log::trace!("Skipping special file: {}", path.display());
                            return None;
                        }
                        Some(self.record(path))
                    }
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                        log::warn!("Walker error for {}: {}", path.display(), e);
                        Some(Err(ScanError::Io {
                            path,
                            source: std::io::Error::other(e.to_string()),
                        }))
                    }
                }),
        )
    }

    fn record(&self, path: PathBuf) -> Result<FileRecord, ScanError> {
        if path.to_str().is_none() {
            log::warn!("Skipping non-UTF-8 path: {}", path.display());
            return Err(ScanError::NonUtf8Path(path));
        }
        match std::fs::symlink_metadata(&path) {
            Ok(metadata) => Ok(FileRecord::from_metadata(path, &metadata)),
            Err(e) => Err(self.io_error(&path, e)),
        }
    }

    fn io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }
}
