use super::common::fixture_tree;
use clap::Parser;
use dupetree::cli::Cli;
use dupetree::error::ExitCode;
use dupetree::run_app;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Isolated database, config and output locations for one test.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let db = self.path("hashes.sqlite");
        let config = self.path("config.toml");
        let mut argv = vec!["dupetree", "-q", "--no-color", "--db", db.as_str(), "--config", config.as_str()];
        argv.extend_from_slice(args);
        run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_hash_then_dry_run_writes_report_and_touches_nothing() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    let report = sandbox.path("report.html");
    let somedir = arg(&tree.path().join("somedir"));

    assert_eq!(sandbox.run(&["hash", &arg(tree.path())]).unwrap(), ExitCode::Success);
    let code = sandbox
        .run(&["dd", &somedir, "_dupe", "--outfile", &report])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("file_is_dupe"));
    assert!(html.contains("deletions: 2"));
    assert!(tree.path().join("somedir/file_is_dupe").exists());
    assert!(tree.path().join("somedir/somedir2/file_is_dupe2").exists());
}

#[test]
fn test_dry_run_without_matches_reports_no_duplicates() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    let report = sandbox.path("report.html");
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();

    let code = sandbox
        .run(&["dd", &arg(&tree.path().join("somedir")), "nothing-matches", "--outfile", &report])
        .unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    // The report is written even for an empty plan.
    assert!(Path::new(&report).exists());
}

#[test]
fn test_do_move_moves_into_trash_and_updates_database() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    let trash = sandbox.path("trash");
    let somedir = arg(&tree.path().join("somedir"));
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();

    let code = sandbox
        .run(&["dd", &somedir, "_dupe", "--do-move", "--trash", &trash])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!tree.path().join("somedir/file_is_dupe").exists());
    assert!(tree.path().join("file_exists").exists());
    assert!(Path::new(&trash).is_dir());

    // The moved files are gone from the index, so a second run finds nothing.
    let code = sandbox
        .run(&["dd", &somedir, "_dupe", "--do-move", "--trash", &trash])
        .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_refused_plan_maps_to_validation_exit_code() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    let trash = sandbox.path("trash");
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();
    fs::remove_file(tree.path().join("file_exists")).unwrap();

    let err = sandbox
        .run(&[
            "dd",
            &arg(&tree.path().join("somedir")),
            "_dupe",
            "--do-move",
            "--trash",
            &trash,
        ])
        .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::ValidationFailed);
    assert!(tree.path().join("somedir/file_is_dupe").exists());
    assert!(!Path::new(&trash).exists());
}

#[test]
fn test_invalid_pattern_is_a_general_error() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();

    let err = sandbox
        .run(&["dd", &arg(tree.path()), "[unclosed"])
        .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_hash_missing_directory_fails() {
    let sandbox = Sandbox::new();
    let err = sandbox.run(&["hash", &sandbox.path("missing")]).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("missing"));
}

#[test]
fn test_list_after_hash_and_after_clear() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();

    assert_eq!(sandbox.run(&["lst"]).unwrap(), ExitCode::NoDuplicates);
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();
    assert_eq!(sandbox.run(&["lst", "3"]).unwrap(), ExitCode::Success);

    assert_eq!(sandbox.run(&["clear-cache"]).unwrap(), ExitCode::Success);
    assert_eq!(sandbox.run(&["lst"]).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_purge_then_rehash_restores_from_cache() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();

    assert_eq!(sandbox.run(&["purge"]).unwrap(), ExitCode::Success);
    assert_eq!(sandbox.run(&["lst"]).unwrap(), ExitCode::NoDuplicates);

    assert_eq!(sandbox.run(&["hash", &arg(tree.path())]).unwrap(), ExitCode::Success);
    assert_eq!(sandbox.run(&["lst"]).unwrap(), ExitCode::Success);
}

#[test]
fn test_permanent_delete_needs_confirmation() {
    let result = Cli::try_parse_from(["dupetree", "dd", "/tmp", "--do-move", "--delete"]);
    assert!(result.is_err());

    let cli = Cli::try_parse_from(["dupetree", "dd", "/tmp", "--do-move", "--delete", "--yes"]);
    assert!(cli.is_ok());
}

#[test]
fn test_json_output_on_dry_run() {
    let tree = fixture_tree();
    let sandbox = Sandbox::new();
    let report = sandbox.path("report.html");
    sandbox.run(&["hash", &arg(tree.path())]).unwrap();

    let code = sandbox
        .run(&[
            "dd",
            &arg(&tree.path().join("somedir")),
            "_dupe",
            "--output",
            "json",
            "--outfile",
            &report,
        ])
        .unwrap();
    assert_eq!(code, ExitCode::Success);
}
