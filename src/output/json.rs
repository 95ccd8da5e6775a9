//! JSON rendering of a deletion plan.
//!
//! Provides machine-readable output for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "scope": "/home/user/Downloads",
//!   "pattern": "_dupe",
//!   "policy": { "match_deletions": true, "dupes_global": true, "autoselect": false },
//!   "deletion_count": 1,
//!   "keep_count": 1,
//!   "groups": [
//!     {
//!       "hash": "3b5d5c37...",
//!       "deletions": ["/home/user/Downloads/a_dupe.jpg"],
//!       "keeps": ["/home/user/Pictures/a.jpg"]
//!     }
//!   ],
//!   "moved": null
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{plan_groups, PlanGroup};
use crate::actions::BatchMoveResult;
use crate::dedupe::{Partition, Policy};
use crate::index::ContentHash;

/// One hash of the plan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Full content hash
    pub hash: ContentHash,
    /// Paths to delete, sorted
    pub deletions: Vec<String>,
    /// Paths to keep, sorted
    pub keeps: Vec<String>,
}

impl From<PlanGroup> for JsonGroup {
    fn from(group: PlanGroup) -> Self {
        Self {
            hash: group.hash,
            deletions: group
                .deletions
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            keeps: group
                .keeps
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Outcome of executing the plan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMoveSummary {
    /// Files disposed of
    pub succeeded: usize,
    /// Files that could not be disposed of, with reasons
    pub failed: Vec<JsonFailure>,
    /// Disposed files whose database row could not be removed
    pub stale_rows: Vec<JsonFailure>,
    /// Bytes freed
    pub bytes_freed: u64,
}

/// A single failure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    /// Affected path
    pub path: String,
    /// Error message
    pub error: String,
}

impl From<&BatchMoveResult> for JsonMoveSummary {
    fn from(result: &BatchMoveResult) -> Self {
        Self {
            succeeded: result.success_count(),
            failed: json_failures(&result.failures),
            stale_rows: json_failures(&result.stale_rows),
            bytes_freed: result.bytes_freed,
        }
    }
}

fn json_failures(list: &[(PathBuf, String)]) -> Vec<JsonFailure> {
    list.iter()
        .map(|(path, error)| JsonFailure {
            path: path.to_string_lossy().into_owned(),
            error: error.clone(),
        })
        .collect()
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPlan {
    /// Application version
    pub version: String,
    /// Scope directory
    pub scope: String,
    /// Basename pattern
    pub pattern: String,
    /// Policy flags
    pub policy: Policy,
    /// Number of files scheduled for deletion
    pub deletion_count: usize,
    /// Number of files kept
    pub keep_count: usize,
    /// Groups in hash order
    pub groups: Vec<JsonGroup>,
    /// Execution outcome, `null` on a dry run
    pub moved: Option<JsonMoveSummary>,
}

impl JsonPlan {
    /// Create the JSON plan for one run.
    #[must_use]
    pub fn new(partition: &Partition, scope: &Path, pattern: &str, policy: Policy) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            scope: scope.to_string_lossy().into_owned(),
            pattern: pattern.to_string(),
            policy,
            deletion_count: partition.deletion_count(),
            keep_count: partition.keep_count(),
            groups: plan_groups(partition).into_iter().map(JsonGroup::from).collect(),
            moved: None,
        }
    }

    /// Attach the outcome of executing the plan.
    #[must_use]
    pub fn with_moved(mut self, result: &BatchMoveResult) -> Self {
        self.moved = Some(JsonMoveSummary::from(result));
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
