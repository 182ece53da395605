use std::fmt;

use strata_core::{DiffHunk, DiffLine, FileChange, FileChangeStatus};
use tracing::debug;

/// Parse a unified diff into structured hunks.
///
/// Every valid `@@ -a[,b] +c[,d] @@` header opens a hunk. The lines that
/// follow are collected until the next header, a file boundary, or the end
/// of the input. Line numbers are assigned from the header start positions.
///
/// This never fails: malformed headers are skipped (together with the body
/// that follows them) and unparseable input yields an empty list. Declared
/// counts are kept as declared, even when the body disagrees with them.
///
/// # Examples
///
/// ```
/// use strata_difflens::parser::parse_unified_diff;
/// use strata_core::DiffLineKind;
///
/// let diff = "@@ -1,2 +1,3 @@ fn main()\n \
///             let a = 1;\n\
///             +let b = 2;\n \
///             let c = 3;\n";
/// let hunks = parse_unified_diff(diff);
/// assert_eq!(hunks.len(), 1);
/// assert_eq!(hunks[0].section.as_deref(), Some("fn main()"));
/// assert_eq!(hunks[0].lines[1].kind, DiffLineKind::Add);
/// assert_eq!(hunks[0].lines[1].new_line_no, Some(2));
///
/// assert!(parse_unified_diff("not a diff").is_empty());
/// ```
pub fn parse_unified_diff(input: &str) -> Vec<DiffHunk> {
    let mut collector = HunkCollector::default();
    for line in input.lines() {
        collector.feed(line);
    }
    collector.finish()
}

/// Line-at-a-time hunk parsing, shared by [`parse_unified_diff`] and
/// [`split_file_patches`].
#[derive(Default)]
struct HunkCollector {
    hunks: Vec<DiffHunk>,
    cursor: Option<HunkCursor>,
}

impl HunkCollector {
    fn feed(&mut self, line: &str) {
        if line.starts_with("@@") {
            if let Some(done) = self.cursor.take() {
                self.hunks.push(done.hunk);
            }
            match parse_hunk_header(line) {
                Some(hunk) => self.cursor = Some(HunkCursor::new(hunk)),
                None => debug!(header = line, "skipping malformed hunk header"),
            }
            return;
        }

        if let Some(active) = self.cursor.as_mut() {
            if !active.closed && !active.consume(line) {
                active.closed = true;
            }
        }
    }

    /// Whether the open hunk still expects old-side lines, so a `---` line
    /// is content rather than a file header.
    fn expects_old_lines(&self) -> bool {
        self.cursor
            .as_ref()
            .is_some_and(|c| !c.closed && c.old_remaining() > 0)
    }

    fn finish(mut self) -> Vec<DiffHunk> {
        if let Some(done) = self.cursor.take() {
            self.hunks.push(done.hunk);
        }
        self.hunks
    }
}

/// Running state for the hunk currently being collected.
struct HunkCursor {
    hunk: DiffHunk,
    old_line: u32,
    new_line: u32,
    old_seen: u32,
    new_seen: u32,
    closed: bool,
}

impl HunkCursor {
    fn new(hunk: DiffHunk) -> Self {
        Self {
            old_line: hunk.old_start,
            new_line: hunk.new_start,
            hunk,
            old_seen: 0,
            new_seen: 0,
            closed: false,
        }
    }

    fn old_remaining(&self) -> u32 {
        self.hunk.old_count.saturating_sub(self.old_seen)
    }

    fn new_remaining(&self) -> u32 {
        self.hunk.new_count.saturating_sub(self.new_seen)
    }

    /// Consume one body line. Returns `false` when the line ends the hunk.
    fn consume(&mut self, line: &str) -> bool {
        if let Some(text) = line.strip_prefix('+') {
            // `+++` is a file header unless the hunk still expects new lines.
            if text.starts_with("++") && self.new_remaining() == 0 {
                return false;
            }
            self.push_add(text);
            true
        } else if let Some(text) = line.strip_prefix('-') {
            if text.starts_with("--") && self.old_remaining() == 0 {
                return false;
            }
            self.push_delete(text);
            true
        } else if let Some(text) = line.strip_prefix(' ') {
            self.push_context(text);
            true
        } else if line.starts_with('\\') {
            // "\ No newline at end of file"
            true
        } else if line.is_empty() && self.old_remaining() > 0 && self.new_remaining() > 0 {
            // Context line whose leading space was stripped by a mail client or editor.
            self.push_context("");
            true
        } else {
            false
        }
    }

    fn push_add(&mut self, text: &str) {
        self.hunk.lines.push(DiffLine::add(text, self.new_line));
        self.new_line = self.new_line.saturating_add(1);
        self.new_seen = self.new_seen.saturating_add(1);
    }

    fn push_delete(&mut self, text: &str) {
        self.hunk.lines.push(DiffLine::delete(text, self.old_line));
        self.old_line = self.old_line.saturating_add(1);
        self.old_seen = self.old_seen.saturating_add(1);
    }

    fn push_context(&mut self, text: &str) {
        self.hunk
            .lines
            .push(DiffLine::context(text, self.old_line, self.new_line));
        self.old_line = self.old_line.saturating_add(1);
        self.new_line = self.new_line.saturating_add(1);
        self.old_seen = self.old_seen.saturating_add(1);
        self.new_seen = self.new_seen.saturating_add(1);
    }
}

/// Parse `@@ -old_start[,old_count] +new_start[,new_count] @@[ section]`.
///
/// Combined-diff headers (`@@@ … @@@`) are not accepted.
fn parse_hunk_header(line: &str) -> Option<DiffHunk> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let mut ranges = rest[..end].split_whitespace();

    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;
    if ranges.next().is_some() {
        return None;
    }

    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;

    let section = rest[end + 3..].trim();

    Some(DiffHunk {
        old_start,
        old_count,
        new_start,
        new_count,
        section: (!section.is_empty()).then(|| section.to_string()),
        lines: Vec::new(),
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// One file's section of a multi-file patch.
///
/// # Examples
///
/// ```
/// use strata_difflens::parser::split_file_patches;
///
/// let diff = "diff --git a/hello.rs b/hello.rs\n\
///             --- a/hello.rs\n\
///             +++ b/hello.rs\n\
///             @@ -1,2 +1,3 @@\n \
///             fn main() {\n\
///             +    println!(\"hello\");\n \
///             }\n";
/// let patches = split_file_patches(diff);
/// assert_eq!(patches.len(), 1);
/// assert_eq!(patches[0].path(), "hello.rs");
/// assert_eq!(patches[0].hunks.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Path in the old version (`/dev/null` for new files).
    pub old_path: String,
    /// Path in the new version (`/dev/null` for deleted files).
    pub new_path: String,
    /// Parsed hunks for this file.
    pub hunks: Vec<DiffHunk>,
    /// Whether this is a newly created file.
    pub is_new_file: bool,
    /// Whether this file was deleted.
    pub is_deleted_file: bool,
    /// Whether this file was renamed.
    pub is_rename: bool,
    /// Whether this file was copied.
    pub is_copy: bool,
    /// Whether git reported the content as binary.
    pub is_binary: bool,
    /// Rename/copy similarity from the `similarity index` header.
    pub similarity: Option<u8>,
}

impl FilePatch {
    fn empty() -> Self {
        Self {
            old_path: String::new(),
            new_path: String::new(),
            hunks: Vec::new(),
            is_new_file: false,
            is_deleted_file: false,
            is_rename: false,
            is_copy: false,
            is_binary: false,
            similarity: None,
        }
    }

    /// The path this file is known by after the change.
    ///
    /// Deleted files are known by their old path.
    pub fn path(&self) -> &str {
        if self.is_deleted_file {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    /// Classification implied by the patch headers.
    pub fn status(&self) -> FileChangeStatus {
        if self.is_new_file {
            FileChangeStatus::Added
        } else if self.is_deleted_file {
            FileChangeStatus::Deleted
        } else if self.is_rename {
            FileChangeStatus::Renamed
        } else if self.is_copy {
            FileChangeStatus::Copied
        } else {
            FileChangeStatus::Modified
        }
    }

    /// Convert into a [`FileChange`], counting lines from the hunk bodies.
    pub fn into_file_change(self) -> FileChange {
        let status = self.status();
        let mut change = FileChange::new(self.path(), status);
        if status.has_source() {
            change.old_path = Some(self.old_path.clone());
            change.similarity = self.similarity;
        }
        if self.is_binary {
            change.is_binary = true;
            return change;
        }
        change.additions = count_u32(self.hunks.iter().map(DiffHunk::additions).sum());
        change.deletions = count_u32(self.hunks.iter().map(DiffHunk::deletions).sum());
        change.hunks = self.hunks;
        change
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl fmt::Display for FilePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hunks)", self.path(), self.hunks.len())
    }
}

/// Accumulates one file section until the next file boundary.
struct PatchBuilder {
    patch: FilePatch,
    body: HunkCollector,
    in_body: bool,
    /// Started from `---`/`+++` headers rather than a `diff --git` line.
    implicit: bool,
}

impl PatchBuilder {
    fn from_git_header(rest: &str) -> Self {
        let mut patch = FilePatch::empty();
        let (old, new) = parse_git_header_paths(rest);
        patch.old_path = old;
        patch.new_path = new;
        Self {
            patch,
            body: HunkCollector::default(),
            in_body: false,
            implicit: false,
        }
    }

    fn implicit() -> Self {
        Self {
            patch: FilePatch::empty(),
            body: HunkCollector::default(),
            in_body: false,
            implicit: true,
        }
    }

    fn header_line(&mut self, line: &str) {
        let patch = &mut self.patch;
        if line.starts_with("new file mode") {
            patch.is_new_file = true;
        } else if line.starts_with("deleted file mode") {
            patch.is_deleted_file = true;
        } else if let Some(path) = line.strip_prefix("rename from ") {
            patch.is_rename = true;
            patch.old_path = unquote_path(path);
        } else if let Some(path) = line.strip_prefix("rename to ") {
            patch.is_rename = true;
            patch.new_path = unquote_path(path);
        } else if let Some(path) = line.strip_prefix("copy from ") {
            patch.is_copy = true;
            patch.old_path = unquote_path(path);
        } else if let Some(path) = line.strip_prefix("copy to ") {
            patch.is_copy = true;
            patch.new_path = unquote_path(path);
        } else if let Some(score) = line.strip_prefix("similarity index ") {
            patch.similarity = score.trim_end_matches('%').parse().ok();
        } else if (line.starts_with("Binary files ") && line.ends_with(" differ"))
            || line == "GIT binary patch"
        {
            patch.is_binary = true;
        } else if let Some(path) = line.strip_prefix("--- ") {
            if path == "/dev/null" {
                patch.is_new_file = true;
            }
            patch.old_path = parse_path(path);
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if path == "/dev/null" {
                patch.is_deleted_file = true;
            }
            patch.new_path = parse_path(path);
        }
    }

    fn finish(self) -> FilePatch {
        let mut patch = self.patch;
        if !patch.is_binary {
            patch.hunks = self.body.finish();
        }
        patch
    }
}

/// Split a multi-file patch into per-file sections with parsed hunks.
///
/// Sections start at `diff --git` lines. Plain patches without that line
/// start a file at each `---`/`+++` header pair, unless the open hunk still
/// expects deleted lines. Binary files are kept and flagged rather than
/// dropped.
pub fn split_file_patches(input: &str) -> Vec<FilePatch> {
    let mut patches = Vec::new();
    let mut current: Option<PatchBuilder> = None;
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(done) = current.take() {
                patches.push(done.finish());
            }
            current = Some(PatchBuilder::from_git_header(rest));
            continue;
        }

        let next_is_new_header = lines.peek().is_some_and(|l| l.starts_with("+++ "));
        if line.starts_with("--- ") && next_is_new_header {
            let starts_file = match current.as_ref() {
                None => true,
                Some(builder) => {
                    builder.implicit && builder.in_body && !builder.body.expects_old_lines()
                }
            };
            if starts_file {
                if let Some(done) = current.take() {
                    patches.push(done.finish());
                }
                current = Some(PatchBuilder::implicit());
            }
        }

        let Some(builder) = current.as_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            builder.in_body = true;
        }
        if builder.in_body {
            builder.body.feed(line);
        } else {
            builder.header_line(line);
        }
    }

    if let Some(done) = current.take() {
        patches.push(done.finish());
    }

    patches
}

/// Extract the two paths from the remainder of a `diff --git` line.
fn parse_git_header_paths(rest: &str) -> (String, String) {
    if rest.starts_with('"') {
        // "a/with space" "b/with space"
        if let Some(split) = rest.find("\" \"") {
            return (parse_path(&rest[..=split]), parse_path(&rest[split + 2..]));
        }
    }
    match rest.rfind(" b/").or_else(|| rest.rfind(" \"b/")) {
        Some(split) => (parse_path(&rest[..split]), parse_path(&rest[split + 1..])),
        None => (String::new(), String::new()),
    }
}

/// Decode a path that git printed in C-quoted form.
///
/// With `core.quotePath` (the default) git wraps paths containing control
/// characters, quotes, backslashes or non-ASCII bytes in double quotes and
/// escapes those bytes, e.g. `"caf\303\251.txt"`. Unquoted input is returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use strata_difflens::parser::unquote_path;
///
/// assert_eq!(unquote_path("\"caf\\303\\251.txt\""), "café.txt");
/// assert_eq!(unquote_path("\"tab\\there\""), "tab\there");
/// assert_eq!(unquote_path("plain/path.rs"), "plain/path.rs");
/// ```
pub fn unquote_path(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(byte) = iter.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        match iter.next() {
            Some(digit @ b'0'..=b'7') => {
                let mut value = u32::from(digit - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(u8::try_from(value).unwrap_or(u8::MAX));
            }
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b't') => bytes.push(b'\t'),
            Some(b'n') => bytes.push(b'\n'),
            Some(b'v') => bytes.push(0x0b),
            Some(b'f') => bytes.push(0x0c),
            Some(b'r') => bytes.push(b'\r'),
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn parse_path(raw: &str) -> String {
    // Non-git diffs append a tab and a timestamp after the path.
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = unquote_path(raw.trim_end());

    if normalized == "/dev/null" {
        return normalized;
    }

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .map(str::to_string);
    stripped.unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::DiffLineKind;

    fn kinds(hunk: &DiffHunk) -> Vec<DiffLineKind> {
        hunk.lines.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn empty_input_returns_no_hunks() {
        assert!(parse_unified_diff("").is_empty());
        assert!(split_file_patches("").is_empty());
    }

    #[test]
    fn single_hunk_line_numbers() {
        let diff = "\
@@ -10,3 +10,4 @@
 keep
-old
+new
+extra
 tail
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count),
            (10, 3, 10, 4)
        );
        assert_eq!(
            kinds(hunk),
            vec![
                DiffLineKind::Context,
                DiffLineKind::Delete,
                DiffLineKind::Add,
                DiffLineKind::Add,
                DiffLineKind::Context,
            ]
        );
        assert_eq!(hunk.lines[0], DiffLine::context("keep", 10, 10));
        assert_eq!(hunk.lines[1], DiffLine::delete("old", 11));
        assert_eq!(hunk.lines[2], DiffLine::add("new", 11));
        assert_eq!(hunk.lines[3], DiffLine::add("extra", 12));
        assert_eq!(hunk.lines[4], DiffLine::context("tail", 12, 13));
    }

    #[test]
    fn missing_counts_default_to_one() {
        let hunks = parse_unified_diff("@@ -5 +7 @@\n-a\n+b\n");
        assert_eq!(hunks[0].old_count, 1);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(hunks[0].old_start, 5);
        assert_eq!(hunks[0].new_start, 7);
    }

    #[test]
    fn empty_hunk_body_is_kept() {
        let diff = "@@ -1,0 +1,0 @@\n@@ -4,1 +4,1 @@\n-x\n+y\n";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks.len(), 2);
        assert!(hunks[0].lines.is_empty());
        assert_eq!(hunks[1].lines.len(), 2);
    }

    #[test]
    fn malformed_header_skips_its_body() {
        let diff = "\
@@ -a,b +c,d @@
+ignored
@@ -1 +1,2 @@
 kept
+added
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 2);
    }

    #[test]
    fn combined_diff_header_is_not_accepted() {
        let diff = "@@@ -1,2 -1,2 +1,3 @@@\n  a\n+ b\n";
        assert!(parse_unified_diff(diff).is_empty());
    }

    #[test]
    fn unknown_line_terminates_hunk() {
        let diff = "\
@@ -1,2 +1,2 @@
 a
garbage here
 b
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks[0].lines.len(), 1);
    }

    #[test]
    fn no_newline_marker_does_not_terminate() {
        let diff = "\
@@ -1 +1 @@
-old
\\ No newline at end of file
+new
\\ No newline at end of file
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(kinds(&hunks[0]), vec![DiffLineKind::Delete, DiffLineKind::Add]);
        assert_eq!(hunks[0].lines[1].text, "new");
    }

    #[test]
    fn triple_marker_lines_are_content_while_counts_remain() {
        let diff = "\
@@ -1,1 +1,1 @@
--- a comment
+++ counter
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks[0].lines[0], DiffLine::delete("-- a comment", 1));
        assert_eq!(hunks[0].lines[1], DiffLine::add("++ counter", 1));
    }

    #[test]
    fn file_headers_end_hunk_once_counts_are_used() {
        let diff = "\
--- a/one.rs
+++ b/one.rs
@@ -1 +1 @@
-a
+b
--- a/two.rs
+++ b/two.rs
@@ -3 +3 @@
-c
+d
";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[1].lines[0], DiffLine::delete("c", 3));
    }

    #[test]
    fn stripped_blank_context_line_is_context() {
        let diff = "@@ -1,3 +1,3 @@\n a\n\n-b\n+c\n";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks[0].lines[1], DiffLine::context("", 2, 2));
        assert_eq!(hunks[0].lines.len(), 4);
    }

    #[test]
    fn count_mismatch_is_tolerated() {
        let diff = "@@ -1,1 +1,1 @@\n a\n b\n c\n";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks[0].old_count, 1);
        assert_eq!(hunks[0].lines.len(), 3);
    }

    #[test]
    fn crlf_input_is_handled() {
        let diff = "@@ -1 +1 @@\r\n-old\r\n+new\r\n";
        let hunks = parse_unified_diff(diff);
        assert_eq!(hunks[0].lines[0].text, "old");
        assert_eq!(hunks[0].lines[1].text, "new");
    }

    #[test]
    fn single_file_patch() {
        let diff = "\
diff --git a/src/main.rs b/src/main.rs
index abc1234..def5678 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"hello\");
     let x = 1;
 }
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path(), "src/main.rs");
        assert_eq!(patches[0].status(), FileChangeStatus::Modified);
        assert_eq!(patches[0].hunks[0].additions(), 1);
    }

    #[test]
    fn multiple_files_with_git_headers() {
        let diff = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1,2 @@
 line1
+line2
diff --git a/b.rs b/b.rs
--- a/b.rs
+++ b/b.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].path(), "a.rs");
        assert_eq!(patches[1].path(), "b.rs");
        assert_eq!(patches[1].hunks.len(), 1);
    }

    #[test]
    fn new_and_deleted_files() {
        let diff = "\
diff --git a/new.rs b/new.rs
new file mode 100644
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn hello() {
+}
diff --git a/old.rs b/old.rs
deleted file mode 100644
--- a/old.rs
+++ /dev/null
@@ -1,2 +0,0 @@
-fn goodbye() {
-}
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 2);
        assert!(patches[0].is_new_file);
        assert_eq!(patches[0].old_path, "/dev/null");
        assert_eq!(patches[0].status(), FileChangeStatus::Added);
        assert!(patches[1].is_deleted_file);
        assert_eq!(patches[1].path(), "old.rs");

        let change = patches[1].clone().into_file_change();
        assert_eq!(change.status, FileChangeStatus::Deleted);
        assert_eq!(change.deletions, 2);
        assert_eq!(change.path, "old.rs");
    }

    #[test]
    fn pure_rename_has_no_hunks() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 100%
rename from old_name.rs
rename to new_name.rs
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 1);
        assert!(patches[0].is_rename);
        assert_eq!(patches[0].similarity, Some(100));

        let change = patches[0].clone().into_file_change();
        assert_eq!(change.status, FileChangeStatus::Renamed);
        assert_eq!(change.old_path.as_deref(), Some("old_name.rs"));
        assert_eq!(change.path, "new_name.rs");
        assert!(change.hunks.is_empty());
    }

    #[test]
    fn copy_headers_are_recognised() {
        let diff = "\
diff --git a/base.rs b/copy.rs
similarity index 90%
copy from base.rs
copy to copy.rs
--- a/base.rs
+++ b/copy.rs
@@ -1 +1 @@
-a
+b
";
        let change = split_file_patches(diff).remove(0).into_file_change();
        assert_eq!(change.status, FileChangeStatus::Copied);
        assert_eq!(change.similarity, Some(90));
        assert_eq!(change.old_path.as_deref(), Some("base.rs"));
    }

    #[test]
    fn binary_files_are_flagged_not_dropped() {
        let diff = "\
diff --git a/image.png b/image.png
Binary files a/image.png and b/image.png differ
diff --git a/code.rs b/code.rs
--- a/code.rs
+++ b/code.rs
@@ -1 +1,2 @@
 line1
+line2
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 2);
        assert!(patches[0].is_binary);
        assert!(patches[0].hunks.is_empty());

        let change = patches[0].clone().into_file_change();
        assert!(change.is_binary);
        assert_eq!((change.additions, change.deletions), (0, 0));
        assert!(!patches[1].is_binary);
    }

    #[test]
    fn plain_patch_with_several_files() {
        let diff = "\
--- a/one.txt
+++ b/one.txt
@@ -1 +1 @@
-1
+one
--- a/two.txt
+++ b/two.txt
@@ -1 +1 @@
-2
+two
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].path(), "one.txt");
        assert_eq!(patches[1].path(), "two.txt");
        assert_eq!(patches[1].hunks[0].lines[1].text, "two");
    }

    #[test]
    fn quoted_paths_are_unquoted() {
        assert_eq!(parse_path("\"a/src/my file.rs\""), "src/my file.rs");
        let (old, new) = parse_git_header_paths("\"a/my file.rs\" \"b/my file.rs\"");
        assert_eq!(old, "my file.rs");
        assert_eq!(new, "my file.rs");
    }

    #[test]
    fn octal_escapes_are_decoded() {
        assert_eq!(parse_path("\"a/caf\\303\\251.txt\""), "café.txt");
        assert_eq!(unquote_path("\"say \\\"hi\\\".txt\""), "say \"hi\".txt");
        assert_eq!(unquote_path("\"back\\\\slash\""), "back\\slash");
        let (old, new) = parse_git_header_paths("a/plain.txt \"b/caf\\303\\251.txt\"");
        assert_eq!((old.as_str(), new.as_str()), ("plain.txt", "café.txt"));
    }

    #[test]
    fn dash_lines_inside_a_plain_hunk_stay_in_the_file() {
        let diff = "\
--- a/q.sql
+++ b/q.sql
@@ -1,2 +1,2 @@
--- dash
+++ plus
 ctx
";
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path(), "q.sql");
        assert_eq!(patches[0].hunks.len(), 1);
        let lines = &patches[0].hunks[0].lines;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], DiffLine::delete("-- dash", 1));
        assert_eq!(lines[1], DiffLine::add("++ plus", 1));
        assert_eq!(lines[2], DiffLine::context("ctx", 2, 2));
    }

    #[test]
    fn git_header_paths_without_prefix_headers() {
        let (old, new) = parse_git_header_paths("a/dir/x.rs b/dir/y.rs");
        assert_eq!((old.as_str(), new.as_str()), ("dir/x.rs", "dir/y.rs"));
    }

    #[test]
    fn real_world_fixture() {
        let diff = include_str!("../tests/fixtures/simple.diff");
        let patches = split_file_patches(diff);
        assert_eq!(patches.len(), 3);
        for patch in &patches {
            assert!(!patch.hunks.is_empty() || patch.is_rename || patch.is_binary);
        }
    }
}
