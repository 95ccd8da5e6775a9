use super::common::{h, index, members, H1, H2};
use dupetree::dedupe::{Partitioner, Policy};
use dupetree::index::HashIndex;

fn fixture() -> HashIndex {
    index(&[
        (H1, "/d/file_exists"),
        (H1, "/d/somedir/file_is_dupe"),
        (H1, "/d/somedir/somedir2/file_is_dupe2"),
        (H2, "/d/somedir/dupe_in_dir"),
        (H2, "/d/somedir/dupe2_in_dir"),
    ])
}

fn run(index: &HashIndex, scope: &str, pattern: &str, policy: Policy) -> dupetree::dedupe::Partition {
    Partitioner::new(scope, pattern, policy)
        .unwrap()
        .partition(index)
}

#[test]
fn scenario_match_deletions_global() {
    let plan = run(&fixture(), "/d/somedir", "_dupe", Policy::default());

    assert_eq!(
        members(&plan.deltable, H1),
        vec!["/d/somedir/file_is_dupe", "/d/somedir/somedir2/file_is_dupe2"]
    );
    assert_eq!(members(&plan.keeptable, H1), vec!["/d/file_exists"]);
    // Neither "dupe_in_dir" nor "dupe2_in_dir" contains "_dupe".
    assert!(!plan.deltable.contains_key(&h(H2)));
    assert!(!plan.keeptable.contains_key(&h(H2)));
}

#[test]
fn scenario_match_keeps_global() {
    let policy = Policy::default().with_match_deletions(false);
    let plan = run(&fixture(), "/d/somedir", "file_", policy);

    assert_eq!(
        members(&plan.keeptable, H1),
        vec!["/d/somedir/file_is_dupe", "/d/somedir/somedir2/file_is_dupe2"]
    );
    assert_eq!(members(&plan.deltable, H1), vec!["/d/file_exists"]);
    assert!(!plan.deltable.contains_key(&h(H2)));
}

#[test]
fn scenario_local_without_autoselect_deletes_nothing() {
    let index = index(&[
        (H1, "/d/somedir/file_is_dupe"),
        (H1, "/d/somedir/somedir2/file_is_dupe2"),
    ]);
    let policy = Policy::default().with_dupes_global(false);
    let plan = run(&index, "/d/somedir", "_dupe", policy);

    assert!(plan.deltable.is_empty());
    assert_eq!(
        members(&plan.keeptable, H1),
        vec!["/d/somedir/file_is_dupe", "/d/somedir/somedir2/file_is_dupe2"]
    );
}

#[test]
fn scenario_local_with_autoselect_deletes_one() {
    let index = index(&[
        (H1, "/d/somedir/file_is_dupe"),
        (H1, "/d/somedir/somedir2/file_is_dupe2"),
    ]);
    let policy = Policy::default()
        .with_dupes_global(false)
        .with_autoselect(true);
    let plan = run(&index, "/d/somedir", "_dupe", policy);

    assert_eq!(members(&plan.deltable, H1), vec!["/d/somedir/file_is_dupe"]);
    assert_eq!(
        members(&plan.keeptable, H1),
        vec!["/d/somedir/somedir2/file_is_dupe2"]
    );
}

#[test]
fn scenario_groups_entirely_outside_scope_are_ignored() {
    let index = index(&[
        (H1, "/d/somedir/file_is_dupe"),
        (H1, "/d/file_exists"),
        (H2, "/elsewhere/a"),
        (H2, "/elsewhere/b"),
    ]);
    let plan = run(&index, "/d/somedir", ".", Policy::default());

    assert!(!plan.deltable.contains_key(&h(H2)));
    assert!(!plan.keeptable.contains_key(&h(H2)));
    assert_eq!(members(&plan.deltable, H1), vec!["/d/somedir/file_is_dupe"]);
}

#[test]
fn match_keeps_never_rescues() {
    // No name matches the keep pattern, so no group has a keep to anchor it.
    let index = index(&[(H1, "/d/a"), (H1, "/d/b")]);
    let policy = Policy::default()
        .with_match_deletions(false)
        .with_autoselect(true);
    let plan = run(&index, "/d", "^keep", policy);

    assert!(plan.deltable.is_empty());
    assert!(plan.keeptable.is_empty());
}

#[test]
fn match_keeps_can_delete_every_outside_copy() {
    let index = index(&[(H1, "/d/keep_me"), (H1, "/x/a"), (H1, "/x/b")]);
    let policy = Policy::default().with_match_deletions(false);
    let plan = run(&index, "/d", "keep", policy);

    assert_eq!(members(&plan.deltable, H1), vec!["/x/a", "/x/b"]);
    assert_eq!(members(&plan.keeptable, H1), vec!["/d/keep_me"]);
}

#[test]
fn whole_scope_global_match_everything_keeps_one_per_group() {
    let policy = Policy::default().with_autoselect(true);
    let plan = run(&fixture(), "/d", ".", policy);

    for hash in [H1, H2] {
        assert_eq!(plan.deltable.member_count(&h(hash)), 1);
        assert!(plan.keeptable.member_count(&h(hash)) >= 1);
    }
    assert!(plan.validate().is_err(), "paths do not exist on disk");
}

#[test]
fn invalid_pattern_is_rejected_before_partitioning() {
    let err = Partitioner::new("/d", "(unclosed", Policy::default()).unwrap_err();
    assert!(err.to_string().contains("(unclosed"));
}

#[test]
fn relative_scope_is_rejected() {
    assert!(Partitioner::new("relative/dir", ".", Policy::default()).is_err());
}
