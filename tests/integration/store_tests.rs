use super::common::{fixture_tree, write};
use dupetree::scanner::{index_directory, IndexerConfig};
use dupetree::store::{FileRecord, HashStore};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_hashes_survive_reopening_the_database() {
    let tree = fixture_tree();
    let db_dir = TempDir::new().unwrap();
    let db_path = db_dir.path().join("nested/hashes.sqlite");

    {
        let mut store = HashStore::open(&db_path).unwrap();
        let summary = index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();
        assert_eq!(summary.hashed, 5);
    }

    let mut store = HashStore::open(&db_path).unwrap();
    assert_eq!(store.dupes().unwrap().len(), 5);

    let summary = index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.restored, 5);
    assert_eq!(summary.hashed, 0);
}

#[test]
fn test_rescanning_a_subdirectory_keeps_the_rest() {
    let tree = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();
    let before = store.lookup_count().unwrap();

    index_directory(
        &mut store,
        &tree.path().join("somedir"),
        &IndexerConfig::default(),
    )
    .unwrap();

    assert_eq!(store.lookup_count().unwrap(), before);
    assert_eq!(store.dupes().unwrap().group_count(), 2);
}

#[test]
fn test_deleted_file_drops_out_after_rescan() {
    let tree = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();

    fs::remove_file(tree.path().join("somedir/dupe2_in_dir")).unwrap();
    index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();

    let dupes = store.dupes().unwrap();
    assert_eq!(dupes.group_count(), 1);
    assert_eq!(dupes.len(), 3);
}

#[test]
fn test_purge_forgets_scans_and_vanished_files() {
    let tree = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(store.cached_count().unwrap(), 5);

    fs::remove_file(tree.path().join("file_exists")).unwrap();
    let summary = store.purge().unwrap();

    assert_eq!(summary.lookup_cleared, 6);
    assert_eq!(summary.stale_removed, 1);
    assert_eq!(summary.invalid_removed, 0);
    assert!(store.dupes().unwrap().is_empty());
    assert_eq!(store.cached_count().unwrap(), 4);
}

#[test]
fn test_clear_cache_forces_full_rehash() {
    let tree = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();

    store.clear_cache().unwrap();
    assert_eq!(store.lookup_count().unwrap(), 0);
    assert_eq!(store.cached_count().unwrap(), 0);

    let summary = index_directory(&mut store, tree.path(), &IndexerConfig::default()).unwrap();
    assert_eq!(summary.restored, 0);
    assert_eq!(summary.hashed, 5);
}

#[test]
fn test_unhashed_rows_for_vanished_files_are_cleaned() {
    let dir = TempDir::new().unwrap();
    let gone = write(dir.path(), "gone", b"x");
    let mut store = HashStore::open_in_memory().unwrap();
    store
        .insert_records(&[FileRecord::from_path(&gone).unwrap()])
        .unwrap();
    fs::remove_file(&gone).unwrap();

    assert_eq!(store.remove_missing_unhashed().unwrap(), 1);
    assert!(store.get(&gone).unwrap().is_none());
}

#[test]
fn test_paths_with_spaces_and_unicode_round_trip() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "Fotos 2024/Urlaub am Meer.jpg", b"beach");
    let b = write(dir.path(), "写真/海.jpg", b"beach");
    let mut store = HashStore::open_in_memory().unwrap();
    index_directory(&mut store, dir.path(), &IndexerConfig::default()).unwrap();

    let root = std::path::absolute(dir.path()).unwrap();
    let dupes = store.dupes().unwrap();
    let mut members: Vec<_> = dupes.all_members().cloned().collect();
    members.sort();
    let mut expected = vec![
        root.join(a.strip_prefix(dir.path()).unwrap()),
        root.join(b.strip_prefix(dir.path()).unwrap()),
    ];
    expected.sort();
    assert_eq!(members, expected);
}
