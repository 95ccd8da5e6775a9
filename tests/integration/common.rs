use dupetree::index::{ContentHash, HashIndex};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const H1: &str = "1111111111111111111111111111111111111111111111111111111111111111";
pub const H2: &str = "2222222222222222222222222222222222222222222222222222222222222222";

pub fn h(hash: &str) -> ContentHash {
    ContentHash::from(hash)
}

/// Index built from `(hash, path)` literals.
pub fn index(pairs: &[(&str, &str)]) -> HashIndex {
    pairs
        .iter()
        .map(|(hash, path)| (h(hash), PathBuf::from(path)))
        .collect()
}

/// Members of `hash` in `table`, sorted, as strings.
pub fn members(table: &HashIndex, hash: &str) -> Vec<String> {
    table
        .snapshot(&h(hash))
        .iter()
        .map(|p| p.display().to_string())
        .collect()
}

pub fn write(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// The on-disk tree used by the reference fixtures:
///
/// ```text
/// file_exists                    "same"
/// somedir/file_is_dupe           "same"
/// somedir/somedir2/file_is_dupe2 "same"
/// somedir/dupe_in_dir            "other"
/// somedir/dupe2_in_dir           "other"
/// unique                         "only me"
/// ```
pub fn fixture_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "file_exists", b"same");
    write(dir.path(), "somedir/file_is_dupe", b"same");
    write(dir.path(), "somedir/somedir2/file_is_dupe2", b"same");
    write(dir.path(), "somedir/dupe_in_dir", b"other");
    write(dir.path(), "somedir/dupe2_in_dir", b"other");
    write(dir.path(), "unique", b"only me");
    dir
}
