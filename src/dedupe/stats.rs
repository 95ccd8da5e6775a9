//! Directory ranking by number of duplicate files.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::index::HashIndex;

/// Number of duplicate files directly inside one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirCount {
    /// Parent directory
    pub dir: PathBuf,
    /// Duplicate files in it
    pub count: usize,
}

/// Count duplicate files per parent directory.
///
/// Sorted by count (descending), ties broken by directory path.
#[must_use]
pub fn dir_counts(index: &HashIndex) -> Vec<DirCount> {
    let mut counts: HashMap<PathBuf, usize> = HashMap::new();
    for path in index.all_members() {
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        *counts.entry(dir).or_default() += 1;
    }

    let mut ranked: Vec<DirCount> = counts
        .into_iter()
        .map(|(dir, count)| DirCount { dir, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.dir.cmp(&b.dir)));
    ranked
}

/// The `depth` directories with the most duplicates.
#[must_use]
pub fn most_common(index: &HashIndex, depth: usize) -> Vec<DirCount> {
    let mut ranked = dir_counts(index);
    ranked.truncate(depth);
    ranked
}
