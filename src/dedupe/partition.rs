//! Scope/pattern partitioning of a hash index.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::autoselect::rescue_full_deletions;
use super::{Partition, Policy};
use crate::index::HashIndex;
use crate::path_utils;

/// Rescue pattern used with autoselect: the first candidate stays deleted.
static MATCH_ANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(".").expect("literal pattern compiles"));

/// Rescue pattern used without autoselect: every candidate is kept.
static MATCH_NOTHING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s\S]").expect("literal pattern compiles"));

/// Split `index` into files to delete and files to keep.
///
/// Files inside `scope` whose base name matches `pattern` are deletion
/// candidates when `policy.match_deletions` is set, keep candidates
/// otherwise. The remaining in-scope files, and with `policy.dupes_global`
/// the copies outside `scope`, land on the opposite side. Hash groups with
/// no member inside `scope` never appear in the result.
///
/// With `match_deletions`, a group that would lose every copy is handed to
/// [`rescue_full_deletions`]: with `autoselect` exactly one member stays
/// scheduled for deletion, without it the whole group is kept. The keep
/// polarity does not run the rescue step.
///
/// `scope` must be absolute; it is normalized here, so callers may pass it
/// unnormalized. `pattern` is searched (not anchored) against base names.
#[must_use]
pub fn partition(index: &HashIndex, scope: &Path, pattern: &Regex, policy: Policy) -> Partition {
    let scope = path_utils::normalize(scope);

    let mut dir_index = HashIndex::new();
    let mut outside_index = HashIndex::new();
    for (hash, path) in index.pairs() {
        if path_utils::is_within_normalized(&scope, path) {
            dir_index.add(hash.clone(), path.clone());
        } else {
            outside_index.add(hash.clone(), path.clone());
        }
    }

    outside_index.retain_keys(|hash| dir_index.contains_key(hash));

    let mut match_index = HashIndex::new();
    let mut no_match_index = HashIndex::new();
    for (hash, path) in dir_index.pairs() {
        if pattern.is_match(&path_utils::file_name_lossy(path)) {
            match_index.add(hash.clone(), path.clone());
        } else {
            no_match_index.add(hash.clone(), path.clone());
        }
    }

    log::trace!(
        "Partition split: {} in scope ({} matched), {} outside",
        dir_index.len(),
        match_index.len(),
        outside_index.len()
    );

    let plan = if policy.match_deletions {
        split_match_deletions(match_index, &no_match_index, &outside_index, policy)
    } else {
        split_match_keeps(match_index, &no_match_index, &outside_index, policy)
    };

    log::debug!(
        "Partitioned '{}' under {}: {} deletions, {} keeps",
        pattern.as_str(),
        scope.display(),
        plan.deletion_count(),
        plan.keep_count()
    );

    plan
}

fn split_match_deletions(
    match_index: HashIndex,
    no_match_index: &HashIndex,
    outside_index: &HashIndex,
    policy: Policy,
) -> Partition {
    let mut deltable = match_index;
    let mut keeptable = HashIndex::new();

    let hashes: Vec<_> = deltable.keys().cloned().collect();
    for hash in &hashes {
        keeptable.extend_group(no_match_index, hash);
    }

    if policy.dupes_global {
        for hash in &hashes {
            keeptable.extend_group(outside_index, hash);
        }
    } else {
        let lone: Vec<_> = hashes
            .iter()
            .filter(|h| !keeptable.contains_key(h) && deltable.member_count(h) == 1)
            .cloned()
            .collect();
        if !lone.is_empty() {
            log::trace!("Dropping {} lone in-scope file(s)", lone.len());
        }
        deltable.delete_keys(&lone);
    }

    let rescue = if policy.autoselect {
        &*MATCH_ANY
    } else {
        &*MATCH_NOTHING
    };
    rescue_full_deletions(&mut deltable, &mut keeptable, rescue);

    Partition {
        deltable,
        keeptable,
    }
}

fn split_match_keeps(
    match_index: HashIndex,
    no_match_index: &HashIndex,
    outside_index: &HashIndex,
    policy: Policy,
) -> Partition {
    let keeptable = match_index;
    let mut deltable = HashIndex::new();

    for hash in keeptable.keys() {
        deltable.extend_group(no_match_index, hash);
        if policy.dupes_global {
            deltable.extend_group(outside_index, hash);
        }
    }

    Partition {
        deltable,
        keeptable,
    }
}
