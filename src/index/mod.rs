//! Hash-indexed lookup of duplicate files.
//!
//! # Overview
//!
//! [`HashIndex`] is a multimap from a content hash to the *set* of paths
//! sharing that hash. It is the shape everything in the deduplication
//! pipeline speaks: the store produces one, the partitioner splits one into
//! a deletion table and a keep table, and the mover consumes the deletion
//! table.
//!
//! Members are kept in hash sets, so adding a path twice is idempotent and
//! removal is O(1) on average. Iteration order is unspecified; use
//! [`HashIndex::sorted_keys`] and [`HashIndex::snapshot`] wherever the order
//! leaks into a decision or into output.
//!
//! # Example
//!
//! ```
//! use dupetree::index::{ContentHash, HashIndex};
//! use std::path::PathBuf;
//!
//! let mut index: HashIndex = HashIndex::new();
//! let h = ContentHash::from("be1c1a22");
//! index.add(h.clone(), PathBuf::from("/photos/a.jpg"));
//! index.add(h.clone(), PathBuf::from("/backup/a.jpg"));
//! index.add(h.clone(), PathBuf::from("/photos/a.jpg")); // idempotent
//!
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.group_count(), 1);
//! assert_eq!(
//!     index.snapshot(&h),
//!     vec![PathBuf::from("/backup/a.jpg"), PathBuf::from("/photos/a.jpg")]
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shape of a digest produced by `sha256sum`-compatible hashers, with an
/// optional `:suffix` for annotated hashes.
static VALID_DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-f0-9]{64}(:.+)?$").expect("digest pattern is a valid literal")
});

/// Opaque content hash of a file.
///
/// The index treats hashes as opaque strings. [`ContentHash::is_valid_digest`]
/// checks the hex-digest shape used by the bundled hashers and the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hash string.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, used for compact display.
    #[must_use]
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Whether the hash has the 64-hex-digit digest shape.
    #[must_use]
    pub fn is_valid_digest(&self) -> bool {
        VALID_DIGEST.is_match(&self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Multimap from hash to the set of members sharing it.
///
/// Generic over key and member types; the defaults are the types the rest of
/// the crate uses. Groups never exist empty: removing the last member of a
/// group removes the group, so structural equality compares only real data.
#[derive(Debug, Clone)]
pub struct HashIndex<K = ContentHash, P = PathBuf> {
    groups: HashMap<K, HashSet<P>>,
}

impl<K, P> Default for HashIndex<K, P> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}

impl<K, P> PartialEq for HashIndex<K, P>
where
    K: Eq + Hash,
    P: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl<K, P> Eq for HashIndex<K, P>
where
    K: Eq + Hash,
    P: Eq + Hash,
{
}

impl<K, P> HashIndex<K, P>
where
    K: Eq + Hash + Clone,
    P: Eq + Hash + Clone,
{
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `path` to the group of `hash`.
    ///
    /// Returns `true` if the pair was not present before.
    pub fn add(&mut self, hash: K, path: P) -> bool {
        self.groups.entry(hash).or_default().insert(path)
    }

    /// Remove `path` from the group of `hash`.
    ///
    /// Removing a pair that is not present is a no-op and returns `false`.
    pub fn remove(&mut self, hash: &K, path: &P) -> bool {
        let Some(members) = self.groups.get_mut(hash) else {
            return false;
        };
        let removed = members.remove(path);
        if members.is_empty() {
            self.groups.remove(hash);
        }
        removed
    }

    /// Whether the pair `(hash, path)` is present.
    #[must_use]
    pub fn contains(&self, hash: &K, path: &P) -> bool {
        self.groups.get(hash).is_some_and(|m| m.contains(path))
    }

    /// Whether `hash` has at least one member.
    #[must_use]
    pub fn contains_key(&self, hash: &K) -> bool {
        self.groups.contains_key(hash)
    }

    /// Hashes present in the index, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }

    /// Members of `hash`, if the group exists.
    #[must_use]
    pub fn members(&self, hash: &K) -> Option<&HashSet<P>> {
        self.groups.get(hash)
    }

    /// Number of members of `hash` (0 if absent).
    #[must_use]
    pub fn member_count(&self, hash: &K) -> usize {
        self.groups.get(hash).map_or(0, HashSet::len)
    }

    /// Every member of every group, in unspecified order.
    pub fn all_members(&self) -> impl Iterator<Item = &P> {
        self.groups.values().flatten()
    }

    /// Every `(hash, member)` pair, in unspecified order.
    pub fn pairs(&self) -> impl Iterator<Item = (&K, &P)> {
        self.groups
            .iter()
            .flat_map(|(hash, members)| members.iter().map(move |p| (hash, p)))
    }

    /// Number of `(hash, member)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(HashSet::len).sum()
    }

    /// Whether the index holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of hash groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Copy the whole group of `hash` from `other` into this index.
    ///
    /// Members already present are left alone. Does nothing if `other` has
    /// no such group.
    pub fn extend_group(&mut self, other: &Self, hash: &K) {
        if let Some(members) = other.groups.get(hash) {
            self.groups
                .entry(hash.clone())
                .or_default()
                .extend(members.iter().cloned());
        }
    }

    /// Remove and return the whole group of `hash`.
    pub fn take_group(&mut self, hash: &K) -> Option<HashSet<P>> {
        self.groups.remove(hash)
    }

    /// Drop the groups of all given hashes. Unknown hashes are ignored.
    pub fn delete_keys<'a, I>(&mut self, hashes: I)
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        for hash in hashes {
            self.groups.remove(hash);
        }
    }

    /// Keep only the groups whose hash satisfies `keep`.
    pub fn retain_keys<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.groups.retain(|hash, _| keep(hash));
    }

    /// Set union of two indexes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (hash, members) in &other.groups {
            merged
                .groups
                .entry(hash.clone())
                .or_default()
                .extend(members.iter().cloned());
        }
        merged
    }
}

impl<K, P> HashIndex<K, P>
where
    K: Eq + Hash + Clone + Ord,
    P: Eq + Hash + Clone + Ord,
{
    /// Hashes in ascending order.
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<&K> {
        let mut keys: Vec<&K> = self.groups.keys().collect();
        keys.sort();
        keys
    }

    /// Owned, sorted copy of the members of `hash` (empty if absent).
    #[must_use]
    pub fn snapshot(&self, hash: &K) -> Vec<P> {
        let mut members: Vec<P> = self
            .groups
            .get(hash)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Deterministic copy of the whole index.
    #[must_use]
    pub fn to_sorted_map(&self) -> BTreeMap<K, BTreeSet<P>> {
        self.groups
            .iter()
            .map(|(hash, members)| (hash.clone(), members.iter().cloned().collect()))
            .collect()
    }
}

impl<K, P> FromIterator<(K, P)> for HashIndex<K, P>
where
    K: Eq + Hash + Clone,
    P: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}

impl<K, P> Extend<(K, P)> for HashIndex<K, P>
where
    K: Eq + Hash + Clone,
    P: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = (K, P)>>(&mut self, iter: I) {
        for (hash, path) in iter {
            self.add(hash, path);
        }
    }
}
