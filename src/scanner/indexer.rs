//! Incremental indexing of a directory into the hash store.
//!
//! # Overview
//!
//! [`index_directory`] brings the store up to date for one directory tree:
//!
//! 1. **Clean**: drop unhashed rows whose file has disappeared
//! 2. **Forget**: delete every stored row under the root
//! 3. **Scan**: walk the root and insert fresh stat records
//! 4. **Restore**: reuse cached hashes of files whose stat data is unchanged
//! 5. **Hash**: hash every unhashed file that shares its size with another
//!    file, in batches on a bounded thread pool, committing each batch
//! 6. **Cache**: remember the hashes under the root for the next run
//!
//! Files with a unique size cannot have a duplicate and are never hashed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;

use super::hasher::{ContentHasher, HashAlgorithm};
use super::{HashError, ScanError, Walker, WalkerConfig};
use crate::index::ContentHash;
use crate::progress::ProgressCallback;
use crate::store::{HashStore, StoreError};

/// Errors that abort indexing.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The root could not be walked at all.
    #[error(transparent)]
    Root(ScanError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The hashing thread pool could not be created.
    #[error("failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Shutdown was requested; committed batches are kept.
    #[error("indexing interrupted after hashing {hashed} file(s)")]
    Interrupted {
        /// Files hashed and committed before the interruption
        hashed: usize,
    },
}

/// Configuration for [`index_directory`].
#[derive(Clone)]
pub struct IndexerConfig {
    /// Number of hashing threads.
    pub io_threads: usize,
    /// Files hashed per committed batch.
    pub batch_size: usize,
    /// Content hash strategy.
    pub hasher: Arc<dyn ContentHasher>,
    /// Directory walking options.
    pub walker: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("io_threads", &self.io_threads)
            .field("batch_size", &self.batch_size)
            .field("hasher", &self.hasher.name())
            .field("walker", &self.walker)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            batch_size: 1000,
            hasher: HashAlgorithm::default().hasher(),
            walker: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl IndexerConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the content hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set hidden-file handling.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.walker.skip_hidden = skip_hidden;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Outcome of [`index_directory`].
#[derive(Debug, Clone, Default)]
pub struct IndexSummary {
    /// Absolute root that was indexed
    pub root: PathBuf,
    /// Vanished unhashed rows removed before scanning
    pub removed_missing: usize,
    /// Distinct files under the root stored by the walk
    pub scanned: usize,
    /// Entries the walk could not read
    pub scan_errors: usize,
    /// Hashes reused from the cache
    pub restored: usize,
    /// Files hashed in this run
    pub hashed: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// Hashes written to the cache
    pub cached: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}

/// Bring the store up to date for the tree under `root`.
///
/// # Errors
///
/// - `Root` if `root` is missing or not a directory
/// - `Store` on database failures
/// - `ThreadPool` if the hashing pool cannot be built
/// - `Interrupted` if shutdown was requested; batches committed before
///   that stay in the store
pub fn index_directory(
    store: &mut HashStore,
    root: &Path,
    config: &IndexerConfig,
) -> Result<IndexSummary, IndexError> {
    let started = Instant::now();
    let walker = Walker::new(root, config.walker.clone());
    let walker = match config.shutdown_flag {
        Some(ref flag) => walker.with_shutdown_flag(Arc::clone(flag)),
        None => walker,
    };
    let root = walker.root().to_path_buf();

    match std::fs::metadata(&root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(IndexError::Root(ScanError::NotADirectory(root))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IndexError::Root(ScanError::NotFound(root)))
        }
        Err(e) => {
            return Err(IndexError::Root(ScanError::Io {
                path: root,
                source: e,
            }))
        }
    }

    let mut summary = IndexSummary {
        root: root.clone(),
        ..IndexSummary::default()
    };

    summary.removed_missing = store.remove_missing_unhashed()?;
    store.delete_dir(&root)?;

    // Scan
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_start("walking", 0);
    }
    let mut records = Vec::new();
    for entry in walker.walk() {
        match entry {
            Ok(record) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_progress(records.len() + 1, record.path.to_string_lossy().as_ref());
                }
                records.push(record);
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                summary.scan_errors += 1;
            }
        }
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_end("walking");
    }
    if config.is_shutdown_requested() {
        log::info!("Scan interrupted by shutdown signal");
        return Err(IndexError::Interrupted { hashed: 0 });
    }

    store.insert_records(&records)?;
    drop(records);
    summary.scanned = store.count_in_dir(&root)?;
    log::info!("Scanned {} file(s) under {}", summary.scanned, root.display());

    summary.restored = store.restore_cached_hashes()?;

    // Hash
    let candidates = store.unhashed_size_collisions()?;
    log::debug!(
        "{} file(s) share a size and need hashing ({})",
        candidates.len(),
        config.hasher.name()
    );
    hash_candidates(store, candidates, config, &mut summary)?;

    summary.cached = store.cache_dir(&root)?;
    summary.elapsed = started.elapsed();

    log::info!(
        "Indexed {}: scanned {}, hashed {} ({} reused) in {:.2?}",
        root.display(),
        summary.scanned,
        summary.hashed,
        summary.restored,
        summary.elapsed
    );
    Ok(summary)
}

fn hash_candidates(
    store: &mut HashStore,
    candidates: Vec<PathBuf>,
    config: &IndexerConfig,
    summary: &mut IndexSummary,
) -> Result<(), IndexError> {
    if candidates.is_empty() {
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads.max(1))
        .build()?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_start("hashing", candidates.len());
    }

    let batch_size = config.batch_size.max(1);
    let mut done = 0;
    for batch in candidates.chunks(batch_size) {
        if config.is_shutdown_requested() {
            log::info!("Hashing interrupted by shutdown signal");
            if let Some(ref cb) = config.progress_callback {
                cb.on_phase_end("hashing");
            }
            return Err(IndexError::Interrupted {
                hashed: summary.hashed,
            });
        }

        let results: Vec<(PathBuf, Result<ContentHash, HashError>)> = pool.install(|| {
            batch
                .par_iter()
                .map(|path| (path.clone(), config.hasher.hash_file(path)))
                .collect()
        });

        let mut hashes = Vec::with_capacity(results.len());
        for (path, result) in results {
            done += 1;
            if let Some(ref cb) = config.progress_callback {
                cb.on_progress(done, path.to_string_lossy().as_ref());
            }
            match result {
                Ok(hash) => hashes.push((path, hash)),
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", path.display(), e);
                    summary.hash_failures += 1;
                }
            }
        }

        store.update_hashes(&hashes)?;
        summary.hashed += hashes.len();
        log::debug!("Committed batch of {} hash(es)", hashes.len());
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_phase_end("hashing");
    }
    Ok(())
}
