//! Scanner module for directory traversal, hashing and indexing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Streaming content hashing (SHA-256 or BLAKE3)
//! - Incremental indexing of a directory into the hash store
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Pluggable content hashers
//! - [`indexer`]: The scan → restore → hash → cache pipeline
//!
//! # Example
//!
//! ```no_run
//! use dupetree::scanner::{index_directory, IndexerConfig};
//! use dupetree::store::HashStore;
//! use std::path::Path;
//!
//! let mut store = HashStore::open(Path::new("/tmp/dupes.sqlite")).unwrap();
//! let summary =
//!     index_directory(&mut store, Path::new("/home/user/Pictures"), &IndexerConfig::default())
//!         .unwrap();
//! println!("scanned {} and hashed {} files", summary.scanned, summary.hashed);
//! ```

pub mod hasher;
pub mod indexer;
pub mod walker;

use std::path::{Path, PathBuf};

pub use hasher::{Blake3Hasher, ContentHasher, HashAlgorithm, Sha256Hasher};
pub use indexer::{index_directory, IndexError, IndexSummary, IndexerConfig};
pub use walker::Walker;

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self { skip_hidden: true }
    }
}

/// Errors raised while walking a tree.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A directory or file could not be read for lack of permission.
    #[error("permission denied while scanning {0}")]
    PermissionDenied(PathBuf),

    /// The scan root does not exist.
    #[error("scan root does not exist: {0}")]
    NotFound(PathBuf),

    /// The scan root is a file or some other non-directory.
    #[error("scan root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The entry's name is not valid UTF-8 and cannot be indexed.
    #[error("cannot index {0}: path is not valid UTF-8")]
    NonUtf8Path(PathBuf),

    /// Any other failure to stat or list an entry.
    #[error("cannot scan {path}: {source}")]
    Io {
        /// Entry being scanned
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::NotADirectory(p)
            | Self::NonUtf8Path(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors raised while hashing one file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file vanished between scan and hash.
    #[error("file disappeared before hashing: {0}")]
    NotFound(PathBuf),

    /// The file is not readable.
    #[error("cannot read {0}: permission denied")]
    PermissionDenied(PathBuf),

    /// A read failed part way.
    #[error("cannot hash {path}: {source}")]
    Io {
        /// File being hashed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
