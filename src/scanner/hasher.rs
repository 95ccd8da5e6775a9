//! Streaming content hashers.
//!
//! # Overview
//!
//! The deduplication core never hashes anything itself; it only sees
//! [`ContentHash`] strings. This module supplies the strategies used by the
//! indexer to produce them:
//!
//! - [`Sha256Hasher`] (default): lowercase hex SHA-256, the same digest
//!   `sha256sum` prints, so databases from either tool are comparable.
//! - [`Blake3Hasher`]: lowercase hex BLAKE3, same 64-character shape, faster.
//!
//! Both stream the file through a fixed buffer, so memory use does not
//! depend on file size.
//!
//! # Example
//!
//! ```no_run
//! use dupetree::scanner::hasher::{ContentHasher, HashAlgorithm};
//! use std::path::Path;
//!
//! let hasher = HashAlgorithm::Sha256.hasher();
//! let hash = hasher.hash_file(Path::new("photo.jpg")).unwrap();
//! println!("{hash}");
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;
use crate::index::ContentHash;

/// Read buffer size for streaming hashes.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Strategy for computing the content hash of a file.
pub trait ContentHasher: Send + Sync {
    /// Short algorithm name, for logs.
    fn name(&self) -> &'static str;

    /// Hash the contents of `path`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied` or `Io` if the file cannot be read.
    fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError>;
}

/// Hash algorithm selectable from the command line and config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (compatible with `sha256sum`)
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl HashAlgorithm {
    /// Instantiate the hasher for this algorithm.
    #[must_use]
    pub fn hasher(self) -> Arc<dyn ContentHasher> {
        match self {
            Self::Sha256 => Arc::new(Sha256Hasher),
            Self::Blake3 => Arc::new(Blake3Hasher),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// SHA-256 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError> {
        let mut hasher = Sha256::new();
        stream_file(path, |chunk| hasher.update(chunk))?;
        Ok(ContentHash::new(format!("{:x}", hasher.finalize())))
    }
}

/// BLAKE3 hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError> {
        let mut hasher = blake3::Hasher::new();
        stream_file(path, |chunk| {
            hasher.update(chunk);
        })?;
        Ok(ContentHash::new(hasher.finalize().to_hex().to_string()))
    }
}

/// Feed the contents of `path` to `update` in [`BUFFER_SIZE`] chunks.
fn stream_file<F>(path: &Path, mut update: F) -> Result<(), HashError>
where
    F: FnMut(&[u8]),
{
    let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_io_error(path, e)),
        };
        update(&buffer[..n]);
    }

    log::trace!("Hashed {}", path.display());
    Ok(())
}

fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
