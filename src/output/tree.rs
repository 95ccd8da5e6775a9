//! Terminal tree view of a deletion plan.
//!
//! ```text
//! deletions: 2 keeps: 1
//! Dupes Tree  red: dupes to be deleted  green: dupes to keep
//! └── 3b5d5...
//!     ├── /home/user/Downloads/a copy.jpg
//!     ├── /home/user/Downloads/a copy 2.jpg
//!     └── /home/user/Pictures/a.jpg
//! ```

use std::io::Write;
use std::path::Path;

use yansi::{Color, Paint};

use super::{plan_groups, PlanGroup};
use crate::dedupe::Partition;

/// Tree rendering of a [`Partition`].
#[derive(Debug, Clone)]
pub struct TreeOutput {
    /// Number of files scheduled for deletion
    pub deletions: usize,
    /// Number of files kept
    pub keeps: usize,
    /// One branch per deleted hash
    pub groups: Vec<PlanGroup>,
}

impl TreeOutput {
    /// Build the tree for `partition`.
    #[must_use]
    pub fn new(partition: &Partition) -> Self {
        Self {
            deletions: partition.deletion_count(),
            keeps: partition.keep_count(),
            groups: plan_groups(partition),
        }
    }

    /// Header line with the deletion and keep counts.
    #[must_use]
    pub fn header(&self, color: bool) -> String {
        format!(
            "{} {}",
            paint(&format!("deletions: {}", self.deletions), Color::Red, color),
            paint(&format!("keeps: {}", self.keeps), Color::Green, color)
        )
    }

    /// Render the header and tree; colors only when `color` is set.
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let mut out = self.header(color);
        out.push('\n');
        out.push_str(&format!(
            "Dupes Tree  {}  {}\n",
            paint("red: dupes to be deleted", Color::Red, color),
            paint("green: dupes to keep", Color::Green, color)
        ));

        let last_group = self.groups.len().saturating_sub(1);
        for (i, group) in self.groups.iter().enumerate() {
            let (branch, indent) = if i == last_group {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push_str(branch);
            out.push_str(&group.label());
            out.push('\n');

            let leaves = group
                .deletions
                .iter()
                .map(|p| (p, Color::Red))
                .chain(group.keeps.iter().map(|p| (p, Color::Green)));
            let last_leaf = group.deletions.len() + group.keeps.len() - 1;
            for (j, (path, leaf_color)) in leaves.enumerate() {
                out.push_str(indent);
                out.push_str(if j == last_leaf { "└── " } else { "├── " });
                out.push_str(&paint(&display(path), leaf_color, color));
                out.push('\n');
            }
        }
        out
    }

    /// Write the rendered tree.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, color: bool) -> std::io::Result<()> {
        writer.write_all(self.render(color).as_bytes())
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn paint(text: &str, fg: Color, color: bool) -> String {
    if color {
        text.fg(fg).to_string()
    } else {
        text.to_string()
    }
}
