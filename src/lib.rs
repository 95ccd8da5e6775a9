//! dupetree - directory-scoped duplicate file cleanup.
//!
//! Files are hashed into a persistent SQLite index (`hash`). A cleanup run
//! (`dd`) then picks, among the duplicates found under one directory, the
//! files to delete and the copies to keep, and never deletes every copy
//! of a file.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod index;
pub mod logging;
pub mod output;
pub mod path_utils;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod store;

use anyhow::{Context, Result};

use cli::{Cli, Commands};
use commands::AppContext;
use config::Config;
use error::ExitCode;

/// Run the command line application.
///
/// # Errors
///
/// Any error that ends the run; [`ExitCode::for_error`] maps it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("invalid configuration")?;
    let ctx = AppContext {
        config: commands::with_database(config, cli.database),
        quiet: cli.quiet,
        color: !cli.no_color,
    };
    log::debug!("Using database {}", ctx.config.database.display());

    match cli.command {
        Commands::Hash(ref args) => commands::hash(&ctx, args),
        Commands::Dedupe(ref args) => commands::dedupe(&ctx, args),
        Commands::List(ref args) => commands::list(&ctx, args),
        Commands::Purge => commands::purge(&ctx),
        Commands::ClearCache => commands::clear_cache(&ctx),
    }
}
