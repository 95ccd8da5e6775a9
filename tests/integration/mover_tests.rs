use super::common::fixture_tree;
use dupetree::actions::{trash_target, Disposal, ExecuteError, MoveConfig, Mover};
use dupetree::dedupe::{Partition, Partitioner, Policy, ValidationError};
use dupetree::scanner::{index_directory, IndexerConfig};
use dupetree::store::HashStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Index `tree` and plan a cleanup of `tree/scope` with `pattern`.
fn plan(store: &mut HashStore, tree: &Path, scope: &str, pattern: &str, policy: Policy) -> Partition {
    index_directory(store, tree, &IndexerConfig::default()).unwrap();
    let root = std::path::absolute(tree).unwrap();
    Partitioner::new(root.join(scope), pattern, policy)
        .unwrap()
        .partition(&store.dupes().unwrap())
}

fn absolute(tree: &Path, relative: &str) -> PathBuf {
    std::path::absolute(tree).unwrap().join(relative)
}

#[test]
fn test_move_to_trash_dir_mirrors_original_paths() {
    let tree = fixture_tree();
    let trash = TempDir::new().unwrap();
    let mut store = HashStore::open_in_memory().unwrap();
    let partition = plan(&mut store, tree.path(), "somedir", "_dupe", Policy::default());

    let expected_target = trash_target(trash.path(), &absolute(tree.path(), "somedir/file_is_dupe"));
    let result = Mover::new(
        &mut store,
        MoveConfig::new(Disposal::TrashDir(trash.path().to_path_buf())),
    )
    .execute(&partition, None)
    .unwrap();

    assert_eq!(result.success_count(), 2);
    assert!(result.all_succeeded());
    assert_eq!(result.bytes_freed, 8);
    assert!(!tree.path().join("somedir/file_is_dupe").exists());
    assert!(!tree.path().join("somedir/somedir2/file_is_dupe2").exists());
    assert!(tree.path().join("file_exists").exists());
    assert_eq!(fs::read(expected_target).unwrap(), b"same");
}

#[test]
fn test_store_reflects_moved_files() {
    let tree = fixture_tree();
    let trash = TempDir::new().unwrap();
    let mut store = HashStore::open_in_memory().unwrap();
    let partition = plan(&mut store, tree.path(), "somedir", "_dupe", Policy::default());

    Mover::new(
        &mut store,
        MoveConfig::new(Disposal::TrashDir(trash.path().to_path_buf())),
    )
    .execute(&partition, None)
    .unwrap();

    // One "same" copy is left, so that group is no longer a duplicate.
    let dupes = store.dupes().unwrap();
    assert_eq!(dupes.group_count(), 1);
    assert!(store
        .get(&absolute(tree.path(), "somedir/file_is_dupe"))
        .unwrap()
        .is_none());
}

#[test]
fn test_permanent_delete_removes_files() {
    let tree = fixture_tree();
    let mut store = HashStore::open_in_memory().unwrap();
    let policy = Policy::default().with_autoselect(true);
    let partition = plan(&mut store, tree.path(), "somedir", "dupe", policy);

    let result = Mover::new(&mut store, MoveConfig::new(Disposal::Permanent))
        .execute(&partition, None)
        .unwrap();

    assert!(result.all_succeeded());
    assert!(result.successes.iter().all(|m| m.target.is_none()));
    // Every group still has a copy on disk.
    assert!(tree.path().join("file_exists").exists());
    let remaining_other = ["somedir/dupe_in_dir", "somedir/dupe2_in_dir"]
        .iter()
        .filter(|p| tree.path().join(p).exists())
        .count();
    assert_eq!(remaining_other, 1);
}

#[test]
fn test_missing_keep_refuses_the_whole_plan() {
    let tree = fixture_tree();
    let trash = TempDir::new().unwrap();
    let mut store = HashStore::open_in_memory().unwrap();
    let partition = plan(&mut store, tree.path(), "somedir", "_dupe", Policy::default());

    fs::remove_file(tree.path().join("file_exists")).unwrap();
    let err = Mover::new(
        &mut store,
        MoveConfig::new(Disposal::TrashDir(trash.path().to_path_buf())),
    )
    .execute(&partition, None)
    .unwrap_err();

    assert!(matches!(
        err,
        ExecuteError::Validation(ValidationError::FileNotFound(_))
    ));
    assert!(tree.path().join("somedir/file_is_dupe").exists());
    assert!(tree.path().join("somedir/somedir2/file_is_dupe2").exists());
    assert_eq!(fs::read_dir(trash.path()).unwrap().count(), 0);
}

#[test]
fn test_second_trash_of_same_path_gets_suffix() {
    let tree = fixture_tree();
    let trash = TempDir::new().unwrap();
    let disposal = Disposal::TrashDir(trash.path().to_path_buf());
    let victim = absolute(tree.path(), "somedir/file_is_dupe");

    let first = dupetree::actions::dispose(&victim, &disposal).unwrap();
    fs::write(&victim, b"same").unwrap();
    let second = dupetree::actions::dispose(&victim, &disposal).unwrap();

    let first = first.target.unwrap();
    let second = second.target.unwrap();
    assert_ne!(first, second);
    assert_eq!(second.file_name().unwrap(), "file_is_dupe_1");
    assert!(first.exists() && second.exists());
}

#[test]
fn test_empty_plan_moves_nothing() {
    let tree = fixture_tree();
    let trash = TempDir::new().unwrap();
    let mut store = HashStore::open_in_memory().unwrap();
    let partition = plan(&mut store, tree.path(), "somedir", "no-such-name", Policy::default());
    assert!(partition.has_no_deletions());

    let result = Mover::new(
        &mut store,
        MoveConfig::new(Disposal::TrashDir(trash.path().to_path_buf())),
    )
    .execute(&partition, None)
    .unwrap();

    assert_eq!(result.total_count(), 0);
    assert_eq!(store.dupes().unwrap().len(), 5);
}
