//! Rescue of hash groups that would lose every copy.

use regex::Regex;

use crate::index::HashIndex;
use crate::path_utils;

/// Make sure no hash group is scheduled for deletion without a survivor.
///
/// For every hash present in `deltable` but absent from `keeptable` (in
/// sorted hash order):
///
/// 1. the group's members are snapshotted in sorted order and the whole
///    group moves to `keeptable`;
/// 2. the first snapshot member whose base name matches `rescue` moves back
///    to `deltable`.
///
/// A group of fewer than two members is kept whole. With a pattern that
/// matches nothing every group is kept whole; with `.` exactly one member
/// per group stays scheduled for deletion.
///
/// Returns the number of groups rescued.
pub fn rescue_full_deletions(
    deltable: &mut HashIndex,
    keeptable: &mut HashIndex,
    rescue: &Regex,
) -> usize {
    let mut orphaned: Vec<_> = deltable
        .keys()
        .filter(|hash| !keeptable.contains_key(hash))
        .cloned()
        .collect();
    orphaned.sort();

    for hash in &orphaned {
        let snapshot = deltable.snapshot(hash);
        deltable.take_group(hash);
        for path in &snapshot {
            keeptable.add(hash.clone(), path.clone());
        }

        if snapshot.len() < 2 {
            log::trace!("Keeping lone member of {}", hash.short(12));
            continue;
        }

        if let Some(victim) = snapshot
            .iter()
            .find(|p| rescue.is_match(&path_utils::file_name_lossy(p)))
        {
            keeptable.remove(hash, victim);
            deltable.add(hash.clone(), victim.clone());
            log::trace!(
                "Autoselected {} for deletion in {}",
                victim.display(),
                hash.short(12)
            );
        }
    }

    if !orphaned.is_empty() {
        log::debug!("Rescued {} hash group(s) from full deletion", orphaned.len());
    }

    orphaned.len()
}
