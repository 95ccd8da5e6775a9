use super::common::{fixture_tree, write};
use dupetree::dedupe::{Partitioner, Policy};
use dupetree::scanner::{index_directory, HashAlgorithm, IndexError, IndexerConfig};
use dupetree::store::HashStore;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use tempfile::TempDir;

fn sha256_hex(content: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(content))
}

#[test]
fn test_hash_tree_groups_identical_content() {
    let dir = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();

    let summary = index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.scanned, 6);
    // "unique" has a size of its own and is never hashed.
    assert_eq!(summary.hashed, 5);

    let dupes = store.dupes().unwrap();
    assert_eq!(dupes.group_count(), 2);
    assert_eq!(dupes.member_count(&sha256_hex(b"same").into()), 3);
    assert_eq!(dupes.member_count(&sha256_hex(b"other").into()), 2);
}

#[test]
fn test_same_size_different_content_is_not_a_duplicate() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a", b"aaaa");
    write(dir.path(), "b", b"bbbb");
    let mut store = HashStore::open_in_memory().unwrap();

    let summary = index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.hashed, 2);
    assert!(store.dupes().unwrap().is_empty());
}

#[test]
fn test_hashing_spans_previously_indexed_trees() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write(first.path(), "photo.jpg", b"pixels");
    write(second.path(), "photo copy.jpg", b"pixels");
    let mut store = HashStore::open_in_memory().unwrap();

    index_directory(&mut store, first.path(), &IndexerConfig::default()).unwrap();
    assert!(store.dupes().unwrap().is_empty());

    index_directory(&mut store, second.path(), &IndexerConfig::default()).unwrap();
    let dupes = store.dupes().unwrap();
    assert_eq!(dupes.len(), 2);
}

#[test]
fn test_rescan_after_modification_rehashes() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a", b"same");
    write(dir.path(), "b", b"same");
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(store.dupes().unwrap().len(), 2);

    fs::write(&a, b"diff").unwrap();
    set_file_mtime(&a, FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let summary = index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.restored, 1);
    assert_eq!(summary.hashed, 1);
    assert!(store.dupes().unwrap().is_empty());
}

#[test]
fn test_blake3_and_sha256_agree_on_groups() {
    let dir = fixture_tree();
    for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
        let mut store = HashStore::open_in_memory().unwrap();
        let config = IndexerConfig::default().with_hasher(algorithm.hasher());
        index_directory(&mut store, dir.path(), &config).unwrap();
        let dupes = store.dupes().unwrap();
        assert_eq!(dupes.group_count(), 2, "{algorithm}");
        assert_eq!(dupes.len(), 5, "{algorithm}");
    }
}

#[test]
fn test_hidden_files_are_skipped_by_default() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "visible", b"same");
    write(dir.path(), ".hidden", b"same");
    write(dir.path(), ".git/objects/blob", b"same");
    let mut store = HashStore::open_in_memory().unwrap();

    index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert!(store.dupes().unwrap().is_empty());

    let config = IndexerConfig::default().with_skip_hidden(false);
    index_directory(&mut store, dir.path(), &config).unwrap();
    assert_eq!(store.dupes().unwrap().len(), 3);
}

#[test]
fn test_index_file_root_is_an_error() {
    let dir = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    let err = index_directory(
        &mut store,
        &dir.path().join("unique"),
        &IndexerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IndexError::Root(_)));
}

#[test]
fn test_indexed_fixture_partitions_like_the_reference() {
    let dir = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();

    let root = std::path::absolute(dir.path()).unwrap();
    let plan = Partitioner::new(root.join("somedir"), "_dupe", Policy::default())
        .unwrap()
        .partition(&store.dupes().unwrap());

    let same = sha256_hex(b"same").into();
    assert_eq!(
        plan.deltable.snapshot(&same),
        vec![
            root.join("somedir/file_is_dupe"),
            root.join("somedir/somedir2/file_is_dupe2")
        ]
    );
    assert_eq!(plan.keeptable.snapshot(&same), vec![root.join("file_exists")]);
    assert!(plan.validate().is_ok());
}

#[cfg(unix)]
#[test]
fn test_decomposed_names_match_a_composed_scope() {
    let dir = TempDir::new().unwrap();
    // "café" spelled with a combining accent on disk.
    let decomposed = "cafe\u{301}";
    write(dir.path(), &format!("{decomposed}/copy"), b"same");
    write(dir.path(), "original", b"same");
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();

    let root = std::path::absolute(dir.path()).unwrap();
    let composed_scope = root.join("caf\u{e9}");
    let plan = Partitioner::new(&composed_scope, ".", Policy::default())
        .unwrap()
        .partition(&store.dupes().unwrap());

    assert_eq!(plan.deletion_count(), 1);
    assert_eq!(plan.keep_count(), 1);
    // Stored paths keep their on-disk spelling, so the file is still reachable.
    assert!(plan.validate().is_ok());
}

// macOS and most Windows filesystems refuse such names outright.
#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_reported_not_merged() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"a\xff")), b"same").unwrap();
    fs::write(dir.path().join(OsStr::from_bytes(b"a\xfe")), b"same").unwrap();
    write(dir.path(), "plain", b"same");
    write(dir.path(), "plain_copy", b"same");
    let mut store = HashStore::open_in_memory().unwrap();

    let summary = index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.scan_errors, 2);
    assert_eq!(summary.hashed, 2);
    assert_eq!(summary.hash_failures, 0);
    assert_eq!(store.lookup_count().unwrap(), 2);

    let dupes = store.dupes().unwrap();
    assert_eq!(dupes.member_count(&sha256_hex(b"same").into()), 2);
}
