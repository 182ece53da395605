use strata_core::{DiffLineKind, FileChangeStatus};
use strata_difflens::parser::{parse_unified_diff, split_file_patches};

#[test]
fn parse_patch_without_git_header() {
    let diff = "\
--- /dev/null
+++ b/demos/bad_code.rs
@@ -0,0 +1,3 @@
+fn main() {
+    println!(\"hello\");
+}
";
    let patches = split_file_patches(diff);
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path(), "demos/bad_code.rs");
    assert_eq!(patches[0].status(), FileChangeStatus::Added);
    assert_eq!(patches[0].hunks[0].additions(), 3);
}

#[test]
fn hunks_from_whole_commit_patch_stay_in_order() {
    let diff = include_str!("fixtures/simple.diff");
    let hunks = parse_unified_diff(diff);
    assert_eq!(hunks.len(), 2);
    assert_eq!(hunks[0].old_start, 12);
    assert_eq!(hunks[1].new_start, 41);
    assert_eq!(hunks[1].additions(), 3);
    assert!(hunks[1]
        .lines
        .iter()
        .any(|l| l.kind == DiffLineKind::Add && l.text.is_empty()));
}

#[test]
fn fixture_converts_to_file_changes() {
    let diff = include_str!("fixtures/simple.diff");
    let changes: Vec<_> = split_file_patches(diff)
        .into_iter()
        .map(|p| p.into_file_change())
        .collect();

    assert_eq!(changes.len(), 3);
    assert_eq!(changes[0].path, "src/config.rs");
    assert_eq!((changes[0].additions, changes[0].deletions), (5, 1));
    assert_eq!(changes[1].status, FileChangeStatus::Renamed);
    assert_eq!(changes[1].old_path.as_deref(), Some("docs/old-guide.md"));
    assert!(changes[2].is_binary);
    assert!(changes[2].hunks.is_empty());
}
