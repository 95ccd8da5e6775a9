//! Aligned table of the directories holding the most duplicates.

use std::io::Write;

use yansi::Paint;

use crate::dedupe::DirCount;

const DIR_HEADER: &str = "Directory";
const COUNT_HEADER: &str = "# of dupes";

/// Directory ranking as printed by `lst`.
#[derive(Debug, Clone)]
pub struct DirTable {
    rows: Vec<(String, String)>,
}

impl DirTable {
    /// Build the table from ranked counts.
    #[must_use]
    pub fn new(counts: &[DirCount]) -> Self {
        Self {
            rows: counts
                .iter()
                .map(|c| (c.dir.display().to_string(), c.count.to_string()))
                .collect(),
        }
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with directories right-aligned, counts left-aligned.
    #[must_use]
    pub fn render(&self, color: bool) -> String {
        let dir_width = self
            .rows
            .iter()
            .map(|(dir, _)| dir.chars().count())
            .chain(std::iter::once(DIR_HEADER.len()))
            .max()
            .unwrap_or(0);
        let count_width = self
            .rows
            .iter()
            .map(|(_, count)| count.len())
            .chain(std::iter::once(COUNT_HEADER.len()))
            .max()
            .unwrap_or(0);

        let mut out = format!("{DIR_HEADER:>dir_width$} │ {COUNT_HEADER}\n");
        out.push_str(&format!(
            "{}─┼─{}\n",
            "─".repeat(dir_width),
            "─".repeat(count_width)
        ));
        for (dir, count) in &self.rows {
            let dir = format!("{dir:>dir_width$}");
            if color {
                out.push_str(&format!("{} │ {}\n", dir.cyan(), count.green()));
            } else {
                out.push_str(&format!("{dir} │ {count}\n"));
            }
        }
        out
    }

    /// Write the rendered table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, color: bool) -> std::io::Result<()> {
        writer.write_all(self.render(color).as_bytes())
    }
}
