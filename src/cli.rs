//! Command-line interface definitions for dupetree.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, database) come first, then one subcommand.
//!
//! # Example
//!
//! ```bash
//! # Hash a directory tree into the database
//! dupetree hash ~/Pictures
//!
//! # Dry run: show which files under ~/Downloads named "* copy*" would go
//! dupetree dd ~/Downloads ' copy'
//!
//! # Move them into the trash directory
//! dupetree dd ~/Downloads ' copy' --do-move
//!
//! # Directories with the most duplicates
//! dupetree lst 20
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::dedupe::Policy;
use crate::scanner::HashAlgorithm;

/// Directory-scoped duplicate file cleanup.
///
/// dupetree hashes directory trees into a persistent SQLite index, then
/// removes duplicates found under one directory while keeping at least one
/// copy of every file.
#[derive(Debug, Parser)]
#[command(name = "dupetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Path to the hash database (default: ~/.dupetree.sqlite)
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Hash a directory tree into the database
    Hash(HashArgs),
    /// Delete duplicates found under a directory
    #[command(name = "dd")]
    Dedupe(DedupeArgs),
    /// List the directories holding the most duplicates
    #[command(name = "lst")]
    List(ListArgs),
    /// Drop the current scan and stale cache entries
    Purge,
    /// Empty the database
    ClearCache,
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// Directory to hash
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Number of I/O threads for hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Files hashed per database commit (default: 1000)
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Content hash algorithm (default: sha256)
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub hash_algorithm: Option<HashAlgorithm>,

    /// Include hidden files and directories (starting with .)
    #[arg(long)]
    pub include_hidden: bool,
}

/// Output format for the dd subcommand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored tree on stdout
    #[default]
    Tree,
    /// JSON plan on stdout
    Json,
}

/// Arguments for the dd subcommand.
#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// Scope directory: only duplicates under it are considered for deletion
    #[arg(value_name = "DELDIR")]
    pub deldir: PathBuf,

    /// Regular expression searched in file names
    #[arg(value_name = "PATTERN", default_value = ".")]
    pub pattern: String,

    /// Files whose name matches the pattern are deleted (default)
    #[arg(long, overrides_with = "match_keeps")]
    pub match_deletions: bool,

    /// Files whose name matches the pattern are kept, the rest deleted
    #[arg(long, overrides_with = "match_deletions")]
    pub match_keeps: bool,

    /// Copies outside DELDIR count as duplicates and are kept (default)
    #[arg(long, overrides_with = "dupes_local")]
    pub dupes_global: bool,

    /// Only copies inside DELDIR count as duplicates
    #[arg(long, overrides_with = "dupes_global")]
    pub dupes_local: bool,

    /// Keep one copy of any file that would otherwise lose every copy
    #[arg(long)]
    pub autoselect: bool,

    /// Actually move files; without it only a report is produced
    #[arg(long)]
    pub do_move: bool,

    /// Delete permanently instead of moving to the trash directory
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "yes", conflicts_with = "system_trash")]
    pub delete: bool,

    /// Move to the system trash instead of the trash directory
    #[arg(long)]
    pub system_trash: bool,

    /// Trash directory (default: ~/.dupetreeTrash)
    #[arg(long, value_name = "PATH")]
    pub trash: Option<PathBuf>,

    /// HTML report written on dry runs (default: ~/dupestree.html)
    #[arg(long, value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tree")]
    pub output: OutputFormat,

    /// Confirm permanent deletion
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl DedupeArgs {
    /// Policy selected by the flags.
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy::default()
            .with_match_deletions(!self.match_keeps)
            .with_dupes_global(!self.dupes_local)
            .with_autoselect(self.autoselect)
    }
}

/// Arguments for the lst subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Number of directories to show
    #[arg(value_name = "DEPTH", default_value_t = 10)]
    pub depth: usize,
}
