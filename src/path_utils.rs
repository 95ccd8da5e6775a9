//! Path normalization and containment utilities.
//!
//! Paths reach the deduplication core from two places: the store (written by
//! the scanner) and the command line (the scope directory). Both sides are
//! brought into the same shape before comparison:
//!
//! - **NFC**: macOS hands out NFD file names, so `café` can arrive as
//!   `cafe\u{0301}`. Everything is composed to NFC.
//! - **Lexical**: `.` and `..` components are resolved without touching the
//!   filesystem, so `/data/./photos/../music` compares as `/data/music`.
//!
//! Containment ([`is_within`]) is component-wise: `/foo2/bar` is *not*
//! inside `/foo`.
//!
//! # Example
//!
//! ```
//! use dupetree::path_utils::{is_within, normalize};
//! use std::path::Path;
//!
//! let scope = normalize(Path::new("/data/./photos"));
//! assert!(is_within(&scope, Path::new("/data/photos/2019/a.jpg")));
//! assert!(!is_within(&scope, Path::new("/data/photos2/a.jpg")));
//! assert!(!is_within(&scope, &scope));
//! ```

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (composed) form.
///
/// ```
/// use dupetree::path_utils::normalize_path_str;
///
/// assert_eq!(normalize_path_str("cafe\u{0301}.txt"), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Normalize a path to NFC form.
///
/// Paths that are not valid UTF-8 are returned unchanged.
#[must_use]
pub fn normalize_pathbuf(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if !unicode_normalization::is_nfc(s) => PathBuf::from(normalize_path_str(s)),
        _ => path.to_path_buf(),
    }
}

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` above the root stays at the root; `..` at the start of a relative
/// path is kept.
#[must_use]
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// NFC plus lexical normalization.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    normalize_lexical(&normalize_pathbuf(path))
}

/// Whether `path` lies strictly below `dir`.
///
/// Both arguments are normalized first. A directory is not within itself.
#[must_use]
pub fn is_within(dir: &Path, path: &Path) -> bool {
    let dir = normalize(dir);
    let path = normalize(path);
    path != dir && path.starts_with(&dir)
}

/// Like [`is_within`], but `dir` is already normalized.
///
/// Used in hot loops where the same directory is tested against many paths.
#[must_use]
pub fn is_within_normalized(dir: &Path, path: &Path) -> bool {
    let path = normalize(path);
    path != dir && path.starts_with(dir)
}

/// The final component of `path` as NFC text, or an empty string.
///
/// Patterns are matched against this, so `café` matches a decomposed name.
#[must_use]
pub fn file_name_lossy(path: &Path) -> Cow<'_, str> {
    match path.file_name().map(|n| n.to_string_lossy()) {
        Some(name) if unicode_normalization::is_nfc(&name) => name,
        Some(name) => Cow::Owned(normalize_path_str(&name)),
        None => Cow::Borrowed(""),
    }
}
