use std::fmt;

use serde::Serialize;
use strata_core::{FileChange, FileChangeStatus};

/// Aggregated view of a set of file changes, ready for printing.
///
/// # Examples
///
/// ```
/// use strata_core::{FileChange, FileChangeStatus};
/// use strata_difflens::summary::DiffSummary;
///
/// let mut change = FileChange::new("src/lib.rs", FileChangeStatus::Modified);
/// change.additions = 4;
/// change.deletions = 1;
///
/// let summary = DiffSummary::from_changes(&[change]);
/// assert_eq!(summary.total_files, 1);
/// assert_eq!(summary.total_additions, 4);
/// assert!(summary.to_string().contains("src/lib.rs"));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    /// Number of files changed.
    pub total_files: usize,
    /// Total lines added across all files.
    pub total_additions: u64,
    /// Total lines deleted across all files.
    pub total_deletions: u64,
    /// Number of binary files.
    pub binary_files: usize,
    /// One row per file, in input order.
    pub files: Vec<FileRow>,
}

/// Summary row for a single file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRow {
    /// Display path (`old → new` for renames and copies).
    pub path: String,
    /// Change classification.
    pub status: FileChangeStatus,
    /// Lines added in this file.
    pub additions: u32,
    /// Lines deleted in this file.
    pub deletions: u32,
    /// Number of parsed hunks.
    pub hunk_count: usize,
    /// Whether the file is binary.
    pub is_binary: bool,
}

impl DiffSummary {
    /// Summarize a list of file changes.
    pub fn from_changes(changes: &[FileChange]) -> Self {
        let files: Vec<FileRow> = changes
            .iter()
            .map(|c| FileRow {
                path: c.display_path(),
                status: c.status,
                additions: c.additions,
                deletions: c.deletions,
                hunk_count: c.hunks.len(),
                is_binary: c.is_binary,
            })
            .collect();

        Self {
            total_files: files.len(),
            total_additions: files.iter().map(|f| u64::from(f.additions)).sum(),
            total_deletions: files.iter().map(|f| u64::from(f.deletions)).sum(),
            binary_files: files.iter().filter(|f| f.is_binary).count(),
            files,
        }
    }

    /// Render the summary as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Changes\n\n");
        out.push_str(&format!(
            "**{} files changed**, +{} / -{}\n\n",
            self.total_files, self.total_additions, self.total_deletions
        ));

        if !self.files.is_empty() {
            out.push_str("| File | Status | +/- | Hunks |\n");
            out.push_str("|------|--------|-----|-------|\n");
            for row in &self.files {
                let counts = if row.is_binary {
                    "binary".to_string()
                } else {
                    format!("+{}/-{}", row.additions, row.deletions)
                };
                out.push_str(&format!(
                    "| `{}` | {} | {} | {} |\n",
                    escape_table_cell(&row.path),
                    row.status,
                    counts,
                    row.hunk_count
                ));
            }
        }

        out
    }
}

/// Escape `|` so a value cannot split a Markdown table cell.
///
/// # Examples
///
/// ```
/// use strata_difflens::summary::escape_table_cell;
///
/// assert_eq!(escape_table_cell("a|b"), "a\\|b");
/// ```
pub fn escape_table_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files.is_empty() {
            return writeln!(f, "No changes.");
        }

        writeln!(f, "{:<48} {:>9} {:>12} {:>6}", "File", "Status", "+/-", "Hunks")?;
        writeln!(f, "{}", "-".repeat(78))?;
        for row in &self.files {
            let counts = if row.is_binary {
                "binary".to_string()
            } else {
                format!("+{}/-{}", row.additions, row.deletions)
            };
            writeln!(
                f,
                "{:<48} {:>9} {:>12} {:>6}",
                row.path, row.status, counts, row.hunk_count
            )?;
        }

        writeln!(f)?;
        write!(
            f,
            "{} files changed, {} insertions(+), {} deletions(-)",
            self.total_files, self.total_additions, self.total_deletions
        )?;
        if self.binary_files > 0 {
            write!(f, ", {} binary", self.binary_files)?;
        }
        writeln!(f)
    }
}
