use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Kind of a single line inside a diff hunk.
///
/// # Examples
///
/// ```
/// use strata_core::DiffLineKind;
///
/// assert_eq!(DiffLineKind::Add.marker(), '+');
/// assert_eq!(format!("{}", DiffLineKind::Context), "context");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    /// Unchanged line present on both sides.
    Context,
    /// Line present only in the new version.
    Add,
    /// Line present only in the old version.
    Delete,
}

impl DiffLineKind {
    /// The unified-diff prefix character for this kind.
    pub fn marker(self) -> char {
        match self {
            DiffLineKind::Context => ' ',
            DiffLineKind::Add => '+',
            DiffLineKind::Delete => '-',
        }
    }
}

impl fmt::Display for DiffLineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffLineKind::Context => write!(f, "context"),
            DiffLineKind::Add => write!(f, "add"),
            DiffLineKind::Delete => write!(f, "delete"),
        }
    }
}

/// A single line of a diff hunk with its position on each side.
///
/// Build lines through [`DiffLine::add`], [`DiffLine::delete`] and
/// [`DiffLine::context`]: added lines never carry an old line number and
/// deleted lines never carry a new one.
///
/// # Examples
///
/// ```
/// use strata_core::{DiffLine, DiffLineKind};
///
/// let line = DiffLine::add("let x = 1;", 12);
/// assert_eq!(line.kind, DiffLineKind::Add);
/// assert_eq!(line.old_line_no, None);
/// assert_eq!(line.new_line_no, Some(12));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    /// Line classification.
    pub kind: DiffLineKind,
    /// Line text without the leading marker character.
    pub text: String,
    /// Line number in the old version (absent for additions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_no: Option<u32>,
    /// Line number in the new version (absent for deletions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_no: Option<u32>,
}

impl DiffLine {
    /// An added line at `new_line_no` in the new version.
    pub fn add(text: impl Into<String>, new_line_no: u32) -> Self {
        Self {
            kind: DiffLineKind::Add,
            text: text.into(),
            old_line_no: None,
            new_line_no: Some(new_line_no),
        }
    }

    /// A deleted line at `old_line_no` in the old version.
    pub fn delete(text: impl Into<String>, old_line_no: u32) -> Self {
        Self {
            kind: DiffLineKind::Delete,
            text: text.into(),
            old_line_no: Some(old_line_no),
            new_line_no: None,
        }
    }

    /// An unchanged line present at both positions.
    pub fn context(text: impl Into<String>, old_line_no: u32, new_line_no: u32) -> Self {
        Self {
            kind: DiffLineKind::Context,
            text: text.into(),
            old_line_no: Some(old_line_no),
            new_line_no: Some(new_line_no),
        }
    }
}

/// A single hunk from a unified diff.
///
/// `old_count` and `new_count` are the counts declared by the hunk header.
/// They are kept as declared even when the body disagrees.
///
/// # Examples
///
/// ```
/// use strata_core::{DiffHunk, DiffLine};
///
/// let hunk = DiffHunk {
///     old_start: 10,
///     old_count: 2,
///     new_start: 10,
///     new_count: 2,
///     section: Some("fn main()".into()),
///     lines: vec![
///         DiffLine::context("let a = 1;", 10, 10),
///         DiffLine::delete("let b = 2;", 11),
///         DiffLine::add("let b = 3;", 11),
///     ],
/// };
/// assert_eq!(hunk.additions(), 1);
/// assert_eq!(hunk.deletions(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// Starting line in the old version.
    pub old_start: u32,
    /// Number of lines in the old version.
    pub old_count: u32,
    /// Starting line in the new version.
    pub new_start: u32,
    /// Number of lines in the new version.
    pub new_count: u32,
    /// Trailing header text after the closing `@@`, usually the enclosing
    /// function signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Parsed hunk body.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Number of added lines in the body.
    pub fn additions(&self) -> usize {
        self.count_kind(DiffLineKind::Add)
    }

    /// Number of deleted lines in the body.
    pub fn deletions(&self) -> usize {
        self.count_kind(DiffLineKind::Delete)
    }

    fn count_kind(&self, kind: DiffLineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// How a file changed between two versions.
///
/// # Examples
///
/// ```
/// use strata_core::FileChangeStatus;
///
/// assert_eq!(FileChangeStatus::from_letter('R'), Some(FileChangeStatus::Renamed));
/// assert_eq!(FileChangeStatus::Copied.letter(), 'C');
/// assert_eq!(FileChangeStatus::from_letter('?'), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeStatus {
    /// File did not exist before.
    Added,
    /// File content changed in place.
    Modified,
    /// File was removed.
    Deleted,
    /// File moved from `old_path`.
    Renamed,
    /// File was copied from `old_path`.
    Copied,
}

impl FileChangeStatus {
    /// Map a name-status letter to a status.
    ///
    /// Type changes (`T`) are reported as modifications. Returns `None` for
    /// letters that carry no change classification.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(FileChangeStatus::Added),
            'M' | 'T' => Some(FileChangeStatus::Modified),
            'D' => Some(FileChangeStatus::Deleted),
            'R' => Some(FileChangeStatus::Renamed),
            'C' => Some(FileChangeStatus::Copied),
            _ => None,
        }
    }

    /// The name-status letter for this status.
    pub fn letter(self) -> char {
        match self {
            FileChangeStatus::Added => 'A',
            FileChangeStatus::Modified => 'M',
            FileChangeStatus::Deleted => 'D',
            FileChangeStatus::Renamed => 'R',
            FileChangeStatus::Copied => 'C',
        }
    }

    /// Whether this status carries a source path.
    pub fn has_source(self) -> bool {
        matches!(self, FileChangeStatus::Renamed | FileChangeStatus::Copied)
    }
}

impl fmt::Display for FileChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileChangeStatus::Added => write!(f, "added"),
            FileChangeStatus::Modified => write!(f, "modified"),
            FileChangeStatus::Deleted => write!(f, "deleted"),
            FileChangeStatus::Renamed => write!(f, "renamed"),
            FileChangeStatus::Copied => write!(f, "copied"),
        }
    }
}

/// A per-file change record for a diff view.
///
/// # Examples
///
/// ```
/// use strata_core::{FileChange, FileChangeStatus};
///
/// let change = FileChange {
///     path: "new/path.ts".into(),
///     old_path: Some("old/path.ts".into()),
///     status: FileChangeStatus::Renamed,
///     similarity: Some(100),
///     additions: 3,
///     deletions: 1,
///     is_binary: false,
///     hunks: vec![],
/// };
/// assert_eq!(change.display_path(), "old/path.ts → new/path.ts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Path in the new version (the destination for renames and copies).
    pub path: String,
    /// Source path, set only for renames and copies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// Change classification.
    pub status: FileChangeStatus,
    /// Similarity score reported with a rename or copy (0–100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<u8>,
    /// Lines added.
    pub additions: u32,
    /// Lines deleted.
    pub deletions: u32,
    /// Whether the file is binary. Binary changes never carry hunks.
    pub is_binary: bool,
    /// Parsed hunks, empty when not loaded or not parseable.
    pub hunks: Vec<DiffHunk>,
}

impl FileChange {
    /// A change with zero counts and no hunks.
    pub fn new(path: impl Into<String>, status: FileChangeStatus) -> Self {
        Self {
            path: path.into(),
            old_path: None,
            status,
            similarity: None,
            additions: 0,
            deletions: 0,
            is_binary: false,
            hunks: Vec::new(),
        }
    }

    /// Path label for listings, showing the source of renames and copies.
    pub fn display_path(&self) -> String {
        match &self.old_path {
            Some(old) if self.status.has_source() => format!("{old} → {}", self.path),
            _ => self.path.clone(),
        }
    }
}

/// Aggregate line statistics for one commit.
///
/// # Examples
///
/// ```
/// use strata_core::CommitStats;
///
/// let stats = CommitStats { files_changed: 2, additions: 10, deletions: 4 };
/// assert_eq!(stats.files_changed, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitStats {
    /// Number of files touched.
    pub files_changed: usize,
    /// Total lines added.
    pub additions: u64,
    /// Total lines deleted.
    pub deletions: u64,
}

/// One commit as read from log output.
///
/// Identity is `hash`. Whether a commit is a merge is always derived from
/// its parent list through [`CommitRecord::is_merge`].
///
/// # Examples
///
/// ```
/// use strata_core::CommitRecord;
///
/// let commit = CommitRecord {
///     hash: "abc123".into(),
///     short_hash: "abc123".into(),
///     parents: vec!["def456".into(), "fed654".into()],
///     refs: vec!["HEAD -> main".into()],
///     author: "Jane".into(),
///     authored_at: None,
///     subject: "Merge branch 'feature'".into(),
///     body: None,
///     stats: None,
/// };
/// assert!(commit.is_merge());
/// assert!(!commit.is_root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Abbreviated hash as printed by the log.
    pub short_hash: String,
    /// Parent hashes, first parent first. Empty for root commits.
    pub parents: Vec<String>,
    /// Ref decorations, stored verbatim (`HEAD -> main`, `tag: v1.0`).
    pub refs: Vec<String>,
    /// Author name.
    pub author: String,
    /// Author date, `None` when the log field could not be parsed.
    pub authored_at: Option<DateTime<FixedOffset>>,
    /// First line of the commit message.
    pub subject: String,
    /// Remaining commit message, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Per-commit file and line statistics, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<CommitStats>,
}

impl CommitRecord {
    /// Whether this commit has more than one parent.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Whether this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// The first parent, which the branch line continues through.
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Output format for command results.
///
/// # Examples
///
/// ```
/// use strata_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
