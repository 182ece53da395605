//! Joins `--name-status` and `--numstat` output into [`FileChange`] records.
//!
//! Name-status gives the exact classification (including renames and copies
//! with their source paths); numstat gives line counts and flags binary
//! files. Neither alone gives both, so the two are correlated by the final
//! path of each file.

use std::collections::HashMap;

use strata_core::{FileChange, FileChangeStatus};
use tracing::debug;

use crate::parser::{unquote_path, FilePatch};

/// One parsed `--name-status` line.
///
/// # Examples
///
/// ```
/// use strata_difflens::classify::parse_name_status;
/// use strata_core::FileChangeStatus;
///
/// let entries = parse_name_status("R087\tsrc/old.rs\tsrc/new.rs\n");
/// assert_eq!(entries[0].status, FileChangeStatus::Renamed);
/// assert_eq!(entries[0].similarity, Some(87));
/// assert_eq!(entries[0].old_path.as_deref(), Some("src/old.rs"));
/// assert_eq!(entries[0].path, "src/new.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatusEntry {
    /// Change classification.
    pub status: FileChangeStatus,
    /// Similarity score that followed the status letter, if any.
    pub similarity: Option<u8>,
    /// Final path of the file.
    pub path: String,
    /// Source path for renames and copies.
    pub old_path: Option<String>,
}

/// One parsed `--numstat` line.
///
/// # Examples
///
/// ```
/// use strata_difflens::classify::parse_numstat;
///
/// let entries = parse_numstat("-\t-\tlogo.png\n12\t0\tsrc/lib.rs\n");
/// assert!(entries[0].is_binary);
/// assert_eq!(entries[1].additions, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    /// Final path of the file (the destination for renames).
    pub path: String,
    /// Lines added (0 for binary files).
    pub additions: u32,
    /// Lines deleted (0 for binary files).
    pub deletions: u32,
    /// Whether git reported `-` counts.
    pub is_binary: bool,
}

/// Parse `--name-status` output.
///
/// Lines look like `M\tpath` or `R100\told\tnew`. The similarity score after
/// the letter is stripped into [`NameStatusEntry::similarity`]. Unknown
/// letters are treated as modifications and blank or pathless lines are
/// skipped.
pub fn parse_name_status(input: &str) -> Vec<NameStatusEntry> {
    input.lines().filter_map(parse_name_status_line).collect()
}

fn parse_name_status_line(line: &str) -> Option<NameStatusEntry> {
    if line.trim().is_empty() {
        return None;
    }

    let mut fields = line.split('\t');
    let code = fields.next()?.trim();
    let mut chars = code.chars();
    let letter = chars.next()?;
    let similarity = chars.as_str().parse::<u8>().ok();

    let status = FileChangeStatus::from_letter(letter).unwrap_or_else(|| {
        debug!(status = code, "unknown name-status letter, treating as modified");
        FileChangeStatus::Modified
    });

    let Some(first) = fields.next().filter(|p| !p.is_empty()) else {
        debug!(line, "skipping name-status line without a path");
        return None;
    };

    let entry = match fields.next().filter(|p| !p.is_empty()) {
        Some(dest) if status.has_source() => NameStatusEntry {
            status,
            similarity,
            path: unquote_path(dest),
            old_path: Some(unquote_path(first)),
        },
        _ => NameStatusEntry {
            status,
            similarity,
            path: unquote_path(first),
            old_path: None,
        },
    };
    Some(entry)
}

/// Parse `--numstat` output.
///
/// Lines look like `additions\tdeletions\tpath`. A `-` in either count
/// marks a binary file. Rename paths printed as `old => new` or
/// `dir/{old => new}/file` resolve to the destination path. C-quoted paths
/// are decoded.
pub fn parse_numstat(input: &str) -> Vec<NumstatEntry> {
    input.lines().filter_map(parse_numstat_line).collect()
}

fn parse_numstat_line(line: &str) -> Option<NumstatEntry> {
    if line.trim().is_empty() {
        return None;
    }

    let mut fields = line.splitn(3, '\t');
    let (Some(added), Some(deleted), Some(path)) = (fields.next(), fields.next(), fields.next())
    else {
        debug!(line, "skipping numstat line with too few fields");
        return None;
    };

    let path = unquote_path(&resolve_rename_path(path));
    if added == "-" || deleted == "-" {
        return Some(NumstatEntry {
            path,
            additions: 0,
            deletions: 0,
            is_binary: true,
        });
    }

    match (added.parse(), deleted.parse()) {
        (Ok(additions), Ok(deletions)) => Some(NumstatEntry {
            path,
            additions,
            deletions,
            is_binary: false,
        }),
        _ => {
            debug!(line, "skipping numstat line with non-numeric counts");
            None
        }
    }
}

/// Resolve git's inline rename notation to the destination path.
fn resolve_rename_path(raw: &str) -> String {
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Some((_, new)) = raw[open + 1..close].split_once(" => ") {
                let joined = format!("{}{}{}", &raw[..open], new, &raw[close + 1..]);
                // `{old => }` and `{ => new}` leave an empty path component.
                return joined.replace("//", "/").trim_start_matches('/').to_string();
            }
        }
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => raw.to_string(),
    }
}

/// Combine name-status and numstat output into per-file change records.
///
/// Entries are joined on their final path. The result follows name-status
/// order, followed by numstat entries that had no name-status line (these
/// are classified as modifications). Name-status entries without numstat
/// counts get zero counts. Hunks are left empty; see [`attach_hunks`].
///
/// # Examples
///
/// ```
/// use strata_difflens::classify::classify;
/// use strata_core::FileChangeStatus;
///
/// let changes = classify("R100\told/path.ts\tnew/path.ts\n", "3\t1\tnew/path.ts\n");
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].status, FileChangeStatus::Renamed);
/// assert_eq!(changes[0].old_path.as_deref(), Some("old/path.ts"));
/// assert_eq!((changes[0].additions, changes[0].deletions), (3, 1));
/// ```
pub fn classify(name_status: &str, numstat: &str) -> Vec<FileChange> {
    let entries = parse_name_status(name_status);
    let stats = parse_numstat(numstat);

    // Path -> numstat indices, reversed so `pop` yields the first unused one.
    let mut by_path: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, stat) in stats.iter().enumerate().rev() {
        by_path.entry(stat.path.as_str()).or_default().push(idx);
    }
    let mut used = vec![false; stats.len()];

    let mut changes = Vec::with_capacity(entries.len().max(stats.len()));
    for entry in entries {
        let mut change = FileChange::new(entry.path, entry.status);
        if entry.status.has_source() {
            change.old_path = entry.old_path;
            change.similarity = entry.similarity;
        }
        if let Some(idx) = by_path
            .get_mut(change.path.as_str())
            .and_then(|indices| indices.pop())
        {
            used[idx] = true;
            apply_counts(&mut change, &stats[idx]);
        }
        changes.push(change);
    }

    for (stat, _) in stats.iter().zip(&used).filter(|(_, used)| !**used) {
        let mut change = FileChange::new(stat.path.clone(), FileChangeStatus::Modified);
        apply_counts(&mut change, stat);
        changes.push(change);
    }

    changes
}

fn apply_counts(change: &mut FileChange, stat: &NumstatEntry) {
    change.additions = stat.additions;
    change.deletions = stat.deletions;
    change.is_binary = stat.is_binary;
}

/// Fill in hunks from a parsed patch, matching files by path.
///
/// Patches are matched on their final path (the old path for deletions).
/// A patch reported as binary marks the change binary. Binary changes never
/// receive hunks. Changes with no matching patch keep `hunks: []`.
pub fn attach_hunks(changes: &mut [FileChange], patches: Vec<FilePatch>) {
    let mut by_path: HashMap<String, FilePatch> = HashMap::with_capacity(patches.len());
    for patch in patches {
        by_path.entry(patch.path().to_string()).or_insert(patch);
    }

    for change in changes.iter_mut() {
        let Some(patch) = by_path.remove(&change.path) else {
            continue;
        };
        if patch.is_binary {
            change.is_binary = true;
        }
        if change.is_binary {
            change.hunks.clear();
            continue;
        }
        change.hunks = patch.hunks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::split_file_patches;

    #[test]
    fn binary_numstat_line() {
        let changes = classify("", "-\t-\tpath\n");
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert!(change.is_binary);
        assert_eq!((change.additions, change.deletions), (0, 0));
        assert!(change.hunks.is_empty());
        assert_eq!(change.status, FileChangeStatus::Modified);
    }

    #[test]
    fn rename_is_correlated_by_destination() {
        let changes = classify("R100\told/path.ts\tnew/path.ts\n", "3\t1\tnew/path.ts\n");
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.status, FileChangeStatus::Renamed);
        assert_eq!(change.old_path.as_deref(), Some("old/path.ts"));
        assert_eq!(change.path, "new/path.ts");
        assert_eq!((change.additions, change.deletions), (3, 1));
        assert_eq!(change.similarity, Some(100));
    }

    #[test]
    fn rename_correlates_with_brace_numstat_path() {
        let changes = classify(
            "R090\tsrc/old/mod.rs\tsrc/new/mod.rs\n",
            "4\t2\tsrc/{old => new}/mod.rs\n",
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].additions, 4);
    }

    #[test]
    fn resolve_rename_path_variants() {
        assert_eq!(resolve_rename_path("a.rs"), "a.rs");
        assert_eq!(resolve_rename_path("a.rs => b.rs"), "b.rs");
        assert_eq!(resolve_rename_path("src/{a => b}/x.rs"), "src/b/x.rs");
        assert_eq!(resolve_rename_path("src/{ => nested}/x.rs"), "src/nested/x.rs");
        assert_eq!(resolve_rename_path("src/{nested => }/x.rs"), "src/x.rs");
        assert_eq!(resolve_rename_path("{lib => src}/x.rs"), "src/x.rs");
    }

    #[test]
    fn mixed_statuses_keep_name_status_order() {
        let name_status = "\
A\tsrc/new.rs
M\tsrc/lib.rs
D\tsrc/gone.rs
C075\tsrc/base.rs\tsrc/copy.rs
";
        let numstat = "\
10\t2\tsrc/lib.rs
5\t0\tsrc/new.rs
0\t7\tsrc/gone.rs
1\t1\tsrc/copy.rs
";
        let changes = classify(name_status, numstat);
        let summary: Vec<(&str, FileChangeStatus, u32, u32)> = changes
            .iter()
            .map(|c| (c.path.as_str(), c.status, c.additions, c.deletions))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("src/new.rs", FileChangeStatus::Added, 5, 0),
                ("src/lib.rs", FileChangeStatus::Modified, 10, 2),
                ("src/gone.rs", FileChangeStatus::Deleted, 0, 7),
                ("src/copy.rs", FileChangeStatus::Copied, 1, 1),
            ]
        );
        assert_eq!(changes[3].old_path.as_deref(), Some("src/base.rs"));
        assert!(changes[0].old_path.is_none());
    }

    #[test]
    fn unmatched_numstat_defaults_to_modified_after_named_entries() {
        let changes = classify("A\ta.rs\n", "1\t0\tb.rs\n2\t0\ta.rs\n");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "a.rs");
        assert_eq!(changes[0].additions, 2);
        assert_eq!(changes[1].path, "b.rs");
        assert_eq!(changes[1].status, FileChangeStatus::Modified);
    }

    #[test]
    fn name_status_without_numstat_has_zero_counts() {
        let changes = classify("D\tremoved.rs\n", "");
        assert_eq!(changes[0].status, FileChangeStatus::Deleted);
        assert_eq!((changes[0].additions, changes[0].deletions), (0, 0));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let entries = parse_name_status("\nM\n\nX\tweird.rs\nT\tlink\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, FileChangeStatus::Modified);
        assert_eq!(entries[1].path, "link");

        let stats = parse_numstat("abc\tdef\tfile\n1\t2\n3\t4\tok.rs\n");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].path, "ok.rs");
    }

    #[test]
    fn rename_without_destination_degrades_to_single_path() {
        let entries = parse_name_status("R100\tonly.rs\n");
        assert_eq!(entries[0].path, "only.rs");
        assert!(entries[0].old_path.is_none());
    }

    #[test]
    fn quoted_paths_decode_and_receive_hunks() {
        let mut changes = classify(
            "M\t\"caf\\303\\251.txt\"\nR100\t\"\\344\\270\\255.md\"\tplain.md\n",
            "1\t1\t\"caf\\303\\251.txt\"\n0\t0\t\"\\344\\270\\255.md\" => plain.md\n",
        );
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "café.txt");
        assert_eq!((changes[0].additions, changes[0].deletions), (1, 1));
        assert_eq!(changes[1].old_path.as_deref(), Some("中.md"));

        let patch = "\
diff --git \"a/caf\\303\\251.txt\" \"b/caf\\303\\251.txt\"
--- \"a/caf\\303\\251.txt\"
+++ \"b/caf\\303\\251.txt\"
@@ -1 +1 @@
-old
+new
";
        attach_hunks(&mut changes, split_file_patches(patch));
        assert_eq!(changes[0].hunks.len(), 1);
        assert_eq!(changes[0].hunks[0].lines[1].text, "new");
    }

    #[test]
    fn hunks_attach_by_path() {
        let mut changes = classify(
            "M\tsrc/lib.rs\nD\told.rs\nM\tlogo.png\n",
            "1\t1\tsrc/lib.rs\n0\t1\told.rs\n-\t-\tlogo.png\n",
        );
        let patch = "\
diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1 +1 @@
-a
+b
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1 +0,0 @@
-bye
diff --git a/logo.png b/logo.png
Binary files a/logo.png and b/logo.png differ
";
        attach_hunks(&mut changes, split_file_patches(patch));
        assert_eq!(changes[0].hunks.len(), 1);
        assert_eq!(changes[1].hunks.len(), 1);
        assert!(changes[2].is_binary);
        assert!(changes[2].hunks.is_empty());
    }

    #[test]
    fn binary_patch_marks_change_binary() {
        let mut changes = classify("M\tdata.bin\n", "");
        let patch = "\
diff --git a/data.bin b/data.bin
GIT binary patch
";
        attach_hunks(&mut changes, split_file_patches(patch));
        assert!(changes[0].is_binary);
        assert!(changes[0].hunks.is_empty());
    }
}
