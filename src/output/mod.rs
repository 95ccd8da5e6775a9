//! Renderers for deletion plans and duplicate statistics.
//!
//! - [`tree`]: colored terminal tree, one branch per hash
//! - [`html`]: self-contained HTML report of the same tree
//! - [`json`]: machine-readable plan for scripting
//! - [`table`]: directory ranking for `lst`
//!
//! All plan renderers share the [`PlanGroup`] view, so they list the same
//! groups in the same order.
//!
//! # Example
//!
//! ```no_run
//! use dupetree::dedupe::{Partitioner, Policy};
//! use dupetree::output::tree::TreeOutput;
//! use dupetree::store::HashStore;
//! use std::path::Path;
//!
//! let store = HashStore::open(Path::new("/tmp/dupes.sqlite")).unwrap();
//! let plan = Partitioner::new("/home/user/Downloads", ".", Policy::default())
//!     .unwrap()
//!     .partition(&store.dupes().unwrap());
//!
//! print!("{}", TreeOutput::new(&plan).render(true));
//! ```

pub mod html;
pub mod json;
pub mod table;
pub mod tree;

use std::path::PathBuf;

use crate::dedupe::Partition;
use crate::index::ContentHash;

pub use html::HtmlOutput;
pub use json::JsonPlan;
pub use table::DirTable;
pub use tree::TreeOutput;

/// Hex characters shown per branch label.
pub const SHORT_HASH_LEN: usize = 5;

/// One hash of a plan: the files it deletes and the files it keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanGroup {
    /// Content hash
    pub hash: ContentHash,
    /// Files scheduled for deletion, sorted
    pub deletions: Vec<PathBuf>,
    /// Files kept, sorted
    pub keeps: Vec<PathBuf>,
}

impl PlanGroup {
    /// Branch label: the first hash characters followed by `...`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}...", self.hash.short(SHORT_HASH_LEN))
    }
}

/// Groups of `partition`, one per deleted hash, in hash order.
///
/// Hashes that only appear among the keeps have nothing to show and are
/// left out.
#[must_use]
pub fn plan_groups(partition: &Partition) -> Vec<PlanGroup> {
    partition
        .deltable
        .sorted_keys()
        .into_iter()
        .map(|hash| PlanGroup {
            hash: hash.clone(),
            deletions: partition.deltable.snapshot(hash),
            keeps: partition.keeptable.snapshot(hash),
        })
        .collect()
}
