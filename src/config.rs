//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`<config_dir>/dupetree/config.toml`, or `--config PATH`)
//! 3. Environment variables prefixed with `DUPETREE_` (e.g. `DUPETREE_IO_THREADS=8`)
//! 4. Command-line flags, applied by the caller
//!
//! ```toml
//! database = "/home/user/.dupetree.sqlite"
//! trash = "/mnt/big/dupetreeTrash"
//! io_threads = 8
//! hash_algorithm = "blake3"
//! ```

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::HashAlgorithm;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPETREE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite hash database
    pub database: PathBuf,
    /// Trash directory for moved duplicates
    pub trash: PathBuf,
    /// HTML report written on dry runs
    pub outfile: PathBuf,
    /// Hashing threads
    pub io_threads: usize,
    /// Files hashed per committed batch
    pub batch_size: usize,
    /// Content hash algorithm
    pub hash_algorithm: HashAlgorithm,
    /// Skip hidden files and directories while scanning
    pub skip_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = home_dir();
        Self {
            database: home.join(".dupetree.sqlite"),
            trash: home.join(".dupetreeTrash"),
            outfile: home.join("dupestree.html"),
            io_threads: 4,
            batch_size: 1000,
            hash_algorithm: HashAlgorithm::default(),
            skip_hidden: true,
        }
    }
}

impl Config {
    /// Load configuration from the default file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment variable holds a
    /// value of the wrong type.
    pub fn load(config_file: Option<&Path>) -> Result<Self, figment::Error> {
        let path = config_file
            .map(Path::to_path_buf)
            .or_else(default_config_path);
        let config: Self = Self::figment(path.as_deref(), ENV_PREFIX).extract()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The layered provider behind [`Config::load`].
    #[must_use]
    pub fn figment(config_file: Option<&Path>, env_prefix: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file {
            if path.exists() {
                log::debug!("Reading config file {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(env_prefix).split("__"))
    }
}

/// Default location of the config file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dupetree").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
