use dupetree::commands::with_database;
use dupetree::config::Config;
use dupetree::scanner::HashAlgorithm;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_environment_beats_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 2\nbatch_size = 50\n").unwrap();

    std::env::set_var("DT_IT_ENV_IO_THREADS", "16");
    let config: Config = Config::figment(Some(&path), "DT_IT_ENV_")
        .extract()
        .unwrap();
    std::env::remove_var("DT_IT_ENV_IO_THREADS");

    assert_eq!(config.io_threads, 16);
    assert_eq!(config.batch_size, 50);
}

#[test]
fn test_environment_selects_hash_algorithm() {
    std::env::set_var("DT_IT_ALGO_HASH_ALGORITHM", "blake3");
    let config: Config = Config::figment(None, "DT_IT_ALGO_").extract().unwrap();
    std::env::remove_var("DT_IT_ALGO_HASH_ALGORITHM");

    assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
}

#[test]
fn test_load_reads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dupetree.toml");
    fs::write(
        &path,
        "database = \"/srv/dupes.sqlite\"\nskip_hidden = false\n",
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.database, PathBuf::from("/srv/dupes.sqlite"));
    assert!(!config.skip_hidden);
}

#[test]
fn test_malformed_toml_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "io_threads = [\n").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_database_flag_overrides_config() {
    let config = Config::default();
    let overridden = with_database(config.clone(), Some(PathBuf::from("/tmp/other.sqlite")));
    assert_eq!(overridden.database, PathBuf::from("/tmp/other.sqlite"));
    assert_eq!(with_database(config.clone(), None), config);
}
