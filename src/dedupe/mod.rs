//! Directory-scoped duplicate selection.
//!
//! # Overview
//!
//! Given a [`HashIndex`] of known duplicates, a scope directory and a file
//! name pattern, this module decides which files to delete and which to keep:
//!
//! 1. [`partition`] splits the index by scope and pattern into a deletion
//!    table and a keep table, honouring the [`Policy`] flags.
//! 2. [`autoselect::rescue_full_deletions`] makes sure no hash group ends up
//!    scheduled for deletion without a surviving copy.
//! 3. [`validate::validate`] checks the two tables against each other and
//!    against the filesystem before anything destructive happens.
//!
//! The partitioning step is pure: no IO, no hashing, deterministic output.
//!
//! # Example
//!
//! ```
//! use dupetree::dedupe::{Partitioner, Policy};
//! use dupetree::index::HashIndex;
//! use std::path::PathBuf;
//!
//! let mut index: HashIndex = HashIndex::new();
//! index.add("h1".into(), PathBuf::from("/d/keep/a.txt"));
//! index.add("h1".into(), PathBuf::from("/d/junk/a copy.txt"));
//!
//! let partitioner = Partitioner::new("/d/junk", "copy", Policy::default()).unwrap();
//! let plan = partitioner.partition(&index);
//!
//! assert_eq!(plan.deltable.snapshot(&"h1".into()), vec![PathBuf::from("/d/junk/a copy.txt")]);
//! assert_eq!(plan.keeptable.snapshot(&"h1".into()), vec![PathBuf::from("/d/keep/a.txt")]);
//! ```

pub mod autoselect;
pub mod partition;
pub mod stats;
pub mod validate;

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::index::HashIndex;
use crate::path_utils;

pub use autoselect::rescue_full_deletions;
pub use partition::partition;
pub use stats::{dir_counts, most_common, DirCount};
pub use validate::{validate, ValidationError};

/// Errors raised while setting up a partition run.
#[derive(Debug, Error)]
pub enum DedupeError {
    /// The file name pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as given by the user
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The scope directory must be absolute.
    #[error("scope directory must be absolute: {0}")]
    RelativeScope(PathBuf),
}

/// Policy flags steering [`partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Policy {
    /// Pattern matches are deletion candidates (`true`) or keep candidates (`false`).
    pub match_deletions: bool,
    /// Copies outside the scope directory count as survivors (`true`),
    /// or only copies inside the scope are considered (`false`).
    pub dupes_global: bool,
    /// When a whole group would be deleted, keep all but one instead of keeping all.
    pub autoselect: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            match_deletions: true,
            dupes_global: true,
            autoselect: false,
        }
    }
}

impl Policy {
    /// Set deletion polarity.
    #[must_use]
    pub fn with_match_deletions(mut self, match_deletions: bool) -> Self {
        self.match_deletions = match_deletions;
        self
    }

    /// Set global/local scope.
    #[must_use]
    pub fn with_dupes_global(mut self, dupes_global: bool) -> Self {
        self.dupes_global = dupes_global;
        self
    }

    /// Enable/disable autoselect.
    #[must_use]
    pub fn with_autoselect(mut self, autoselect: bool) -> Self {
        self.autoselect = autoselect;
        self
    }
}

/// Output of a partition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Files selected for removal.
    pub deltable: HashIndex,
    /// Files selected for preservation.
    pub keeptable: HashIndex,
}

impl Partition {
    /// Number of files scheduled for deletion.
    #[must_use]
    pub fn deletion_count(&self) -> usize {
        self.deltable.len()
    }

    /// Number of files kept.
    #[must_use]
    pub fn keep_count(&self) -> usize {
        self.keeptable.len()
    }

    /// Whether nothing is scheduled for deletion.
    #[must_use]
    pub fn has_no_deletions(&self) -> bool {
        self.deltable.is_empty()
    }

    /// Run [`validate`] over both tables.
    ///
    /// # Errors
    ///
    /// See [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(&self.deltable, &self.keeptable)
    }
}

/// Scope, pattern and policy for one partition run.
///
/// Construction checks the inputs; [`Partitioner::partition`] is then total.
#[derive(Debug, Clone)]
pub struct Partitioner {
    scope: PathBuf,
    pattern: Regex,
    policy: Policy,
}

impl Partitioner {
    /// Compile `pattern` and normalize `scope`.
    ///
    /// # Errors
    ///
    /// - `RelativeScope` if `scope` is not absolute
    /// - `InvalidPattern` if `pattern` does not compile
    pub fn new(scope: impl AsRef<Path>, pattern: &str, policy: Policy) -> Result<Self, DedupeError> {
        let scope = scope.as_ref();
        if !scope.is_absolute() {
            return Err(DedupeError::RelativeScope(scope.to_path_buf()));
        }
        let pattern = Regex::new(pattern).map_err(|source| DedupeError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            scope: path_utils::normalize(scope),
            pattern,
            policy,
        })
    }

    /// Normalized scope directory.
    #[must_use]
    pub fn scope(&self) -> &Path {
        &self.scope
    }

    /// Compiled file name pattern.
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Policy flags.
    #[must_use]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Partition `index` into deletions and keeps.
    #[must_use]
    pub fn partition(&self, index: &HashIndex) -> Partition {
        partition(index, &self.scope, &self.pattern, self.policy)
    }
}
