//! HTML report of a deletion plan.
//!
//! Written on every dry run so the plan can be inspected in a browser
//! before anything is moved. Rendered with `askama` from
//! `templates/report.html`:
//!
//! * **Self-contained**: all CSS is embedded in the file.
//! * **Collapsible**: one `<details>` section per hash.
//! * **Safe**: paths are escaped by the template engine.

use std::fs;
use std::io::Write;
use std::path::Path;

use askama::Template;
use chrono::Local;

use super::{plan_groups, PlanGroup};
use crate::dedupe::{Partition, Policy};

/// Complete HTML output structure for the Askama template.
#[derive(Template)]
#[template(path = "report.html")]
pub struct HtmlOutput {
    /// Formatted generation timestamp
    pub timestamp: String,
    /// Application version
    pub version: String,
    /// Scope directory of the run
    pub scope: String,
    /// Basename pattern of the run
    pub pattern: String,
    /// Human-readable policy flags
    pub policy: String,
    /// Number of files scheduled for deletion
    pub deletions: usize,
    /// Number of files kept
    pub keeps: usize,
    /// Groups formatted for HTML
    pub groups: Vec<HtmlGroup>,
}

/// A hash group formatted for HTML presentation.
pub struct HtmlGroup {
    /// Short label (`abcde...`)
    pub label: String,
    /// Full hash
    pub hash: String,
    /// Paths to delete
    pub deletions: Vec<String>,
    /// Paths to keep
    pub keeps: Vec<String>,
}

impl From<PlanGroup> for HtmlGroup {
    fn from(group: PlanGroup) -> Self {
        Self {
            label: group.label(),
            hash: group.hash.to_string(),
            deletions: group.deletions.iter().map(|p| p.display().to_string()).collect(),
            keeps: group.keeps.iter().map(|p| p.display().to_string()).collect(),
        }
    }
}

impl HtmlOutput {
    /// Create the report for one run.
    #[must_use]
    pub fn new(partition: &Partition, scope: &Path, pattern: &str, policy: Policy) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            scope: scope.display().to_string(),
            pattern: pattern.to_string(),
            policy: describe_policy(policy),
            deletions: partition.deletion_count(),
            keeps: partition.keep_count(),
            groups: plan_groups(partition).into_iter().map(HtmlGroup::from).collect(),
        }
    }

    /// Generate the HTML string using the embedded template.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn to_html(&self) -> Result<String, askama::Error> {
        self.render()
    }

    /// Write HTML report to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), HtmlOutputError> {
        let html = self.to_html()?;
        writer.write_all(html.as_bytes())?;
        Ok(())
    }

    /// Write the report to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), HtmlOutputError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        self.write_to(&mut file)?;
        log::debug!("Wrote HTML report to {}", path.display());
        Ok(())
    }
}

fn describe_policy(policy: Policy) -> String {
    let polarity = if policy.match_deletions {
        "match deletions"
    } else {
        "match keeps"
    };
    let reach = if policy.dupes_global { "global" } else { "local" };
    let mut text = format!("{polarity}, {reach} dupes");
    if policy.autoselect {
        text.push_str(", autoselect");
    }
    text
}

/// Errors that can occur during HTML output generation.
#[derive(thiserror::Error, Debug)]
pub enum HtmlOutputError {
    /// Template rendering error
    #[error("HTML template error: {0}")]
    Template(#[from] askama::Error),

    /// I/O error during writing
    #[error("I/O error during HTML generation: {0}")]
    Io(#[from] std::io::Error),
}
