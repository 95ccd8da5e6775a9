//! Subcommand implementations behind [`run_app`](crate::run_app).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{Disposal, MoveConfig, Mover};
use crate::cli::{DedupeArgs, HashArgs, ListArgs, OutputFormat};
use crate::config::Config;
use crate::dedupe::{most_common, Partitioner};
use crate::error::ExitCode;
use crate::output::{DirTable, HtmlOutput, JsonPlan, TreeOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::{index_directory, IndexerConfig};
use crate::signal;
use crate::store::HashStore;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Merged configuration
    pub config: Config,
    /// `--quiet`
    pub quiet: bool,
    /// Colored terminal output
    pub color: bool,
}

impl AppContext {
    fn open_store(&self) -> Result<HashStore> {
        HashStore::open(&self.config.database)
            .with_context(|| format!("cannot open database {}", self.config.database.display()))
    }
}

/// `hash PATH`: index a directory tree.
///
/// # Errors
///
/// Store failures, an unusable root, or an interruption.
pub fn hash(ctx: &AppContext, args: &HashArgs) -> Result<ExitCode> {
    let mut store = ctx.open_store()?;
    let handler = signal::install_handler().context("cannot install Ctrl+C handler")?;

    let algorithm = args.hash_algorithm.unwrap_or(ctx.config.hash_algorithm);
    let config = IndexerConfig::default()
        .with_io_threads(args.io_threads.unwrap_or(ctx.config.io_threads))
        .with_batch_size(args.batch_size.unwrap_or(ctx.config.batch_size))
        .with_hasher(algorithm.hasher())
        .with_skip_hidden(ctx.config.skip_hidden && !args.include_hidden)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::new(Progress::new(ctx.quiet)));

    let summary = index_directory(&mut store, &args.path, &config)
        .with_context(|| format!("indexing {} failed", args.path.display()))?;

    if !ctx.quiet {
        println!(
            "{}: {} files scanned, {} hashed, {} reused from cache",
            summary.root.display(),
            summary.scanned,
            summary.hashed,
            summary.restored
        );
    }

    if summary.hash_failures > 0 || summary.scan_errors > 0 {
        log::warn!(
            "{} file(s) could not be read and {} could not be hashed",
            summary.scan_errors,
            summary.hash_failures
        );
        return Ok(ExitCode::PartialSuccess);
    }
    Ok(ExitCode::Success)
}

/// `dd DELDIR [PATTERN]`: plan, report and optionally execute a cleanup.
///
/// # Errors
///
/// Invalid pattern, store failures, a refused plan, or report write errors.
pub fn dedupe(ctx: &AppContext, args: &DedupeArgs) -> Result<ExitCode> {
    let mut store = ctx.open_store()?;
    let scope = std::path::absolute(&args.deldir)
        .with_context(|| format!("cannot resolve {}", args.deldir.display()))?;
    let policy = args.policy();

    let partitioner = Partitioner::new(&scope, &args.pattern, policy)?;
    let dupes = store.dupes().context("cannot read duplicates from database")?;
    let plan = partitioner.partition(&dupes);
    log::debug!(
        "Plan for {}: {} deletion(s), {} keep(s)",
        partitioner.scope().display(),
        plan.deletion_count(),
        plan.keep_count()
    );

    plan.validate().context("refusing deletion plan")?;

    let json = JsonPlan::new(&plan, partitioner.scope(), &args.pattern, policy);
    let mut stdout = std::io::stdout().lock();

    if !args.do_move {
        match args.output {
            OutputFormat::Tree if !ctx.quiet => {
                TreeOutput::new(&plan).write_to(&mut stdout, ctx.color)?;
            }
            OutputFormat::Tree => {}
            OutputFormat::Json => json.write_to(&mut stdout, true)?,
        }
        let outfile = args.outfile.as_ref().unwrap_or(&ctx.config.outfile);
        HtmlOutput::new(&plan, partitioner.scope(), &args.pattern, policy)
            .save(outfile)
            .with_context(|| format!("cannot write report {}", outfile.display()))?;
        if !ctx.quiet && args.output == OutputFormat::Tree {
            writeln!(stdout, "report written to {}", outfile.display())?;
        }
        return Ok(if plan.has_no_deletions() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        });
    }

    if plan.has_no_deletions() {
        if args.output == OutputFormat::Json {
            json.write_to(&mut stdout, true)?;
        } else if !ctx.quiet {
            writeln!(stdout, "nothing to delete")?;
        }
        return Ok(ExitCode::NoDuplicates);
    }

    let disposal = disposal_for(args, &ctx.config.trash);
    let progress = Progress::new(ctx.quiet);
    let result = Mover::new(&mut store, MoveConfig::new(disposal))
        .execute(&plan, Some(&progress as &dyn ProgressCallback))
        .context("cleanup aborted")?;

    match args.output {
        OutputFormat::Json => json.with_moved(&result).write_to(&mut stdout, true)?,
        OutputFormat::Tree if !ctx.quiet => writeln!(stdout, "{}", result.summary())?,
        OutputFormat::Tree => {}
    }
    for (path, error) in &result.failures {
        log::error!("{}: {}", path.display(), error);
    }
    for (path, error) in &result.stale_rows {
        log::error!("{} was removed but is still indexed: {}", path.display(), error);
    }

    Ok(if result.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    })
}

fn disposal_for(args: &DedupeArgs, default_trash: &Path) -> Disposal {
    if args.delete {
        Disposal::Permanent
    } else if args.system_trash {
        Disposal::SystemTrash
    } else {
        Disposal::TrashDir(
            args.trash
                .clone()
                .unwrap_or_else(|| default_trash.to_path_buf()),
        )
    }
}

/// `lst [DEPTH]`: rank directories by duplicate count.
///
/// # Errors
///
/// Store failures or write errors.
pub fn list(ctx: &AppContext, args: &ListArgs) -> Result<ExitCode> {
    let store = ctx.open_store()?;
    let dupes = store.dupes().context("cannot read duplicates from database")?;
    if dupes.is_empty() {
        if !ctx.quiet {
            println!("no duplicates in {}", ctx.config.database.display());
        }
        return Ok(ExitCode::NoDuplicates);
    }

    let table = DirTable::new(&most_common(&dupes, args.depth));
    table.write_to(&mut std::io::stdout().lock(), ctx.color)?;
    Ok(ExitCode::Success)
}

/// `purge`: drop the current scan and stale cache rows.
///
/// # Errors
///
/// Store failures.
pub fn purge(ctx: &AppContext) -> Result<ExitCode> {
    let mut store = ctx.open_store()?;
    let summary = store.purge().context("purge failed")?;
    if !ctx.quiet {
        println!(
            "cleared {} scanned file(s), removed {} stale and {} invalid cache entries",
            summary.lookup_cleared, summary.stale_removed, summary.invalid_removed
        );
    }
    Ok(ExitCode::Success)
}

/// `clear-cache`: empty the database.
///
/// # Errors
///
/// Store failures.
pub fn clear_cache(ctx: &AppContext) -> Result<ExitCode> {
    let mut store = ctx.open_store()?;
    store.clear_cache().context("clearing the database failed")?;
    if !ctx.quiet {
        println!("cleared {}", ctx.config.database.display());
    }
    Ok(ExitCode::Success)
}

/// Apply the global `--db` override.
#[must_use]
pub fn with_database(mut config: Config, database: Option<PathBuf>) -> Config {
    if let Some(database) = database {
        config.database = database;
    }
    config
}
