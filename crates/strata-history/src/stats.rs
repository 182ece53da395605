//! History and change loading through a [`CommandRunner`].
//!
//! Per-commit stats cost one extra git call per commit. They run on tokio's
//! blocking pool, bounded by a semaphore, and can be skipped entirely when
//! only the graph shape is needed.

use std::sync::Arc;

use strata_core::{CommitRecord, CommitStats, DiffConfig, FileChange, HistoryConfig, StrataError};
use strata_difflens::classify::{attach_hunks, classify, parse_numstat};
use strata_difflens::parser::split_file_patches;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::filter::{apply_filter, SubjectPrefixFilter};
use crate::log::{parse_log, LogFormat};
use crate::runner::CommandRunner;

/// Options for [`load_history`].
///
/// # Examples
///
/// ```
/// use strata_core::HistoryConfig;
/// use strata_history::stats::HistoryOptions;
///
/// let opts = HistoryOptions::from_config(&HistoryConfig::default());
/// assert_eq!(opts.max_count, 500);
/// assert_eq!(opts.checkpoint_prefix.as_deref(), Some("checkpoint:"));
/// assert!(opts.revision.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Maximum number of commits to read.
    pub max_count: usize,
    /// Revision to start from (default: HEAD).
    pub revision: Option<String>,
    /// Skip the per-commit stats pass.
    pub skip_stats: bool,
    /// Maximum number of stats calls in flight.
    pub stats_concurrency: usize,
    /// Log field layout.
    pub format: LogFormat,
    /// Drop commits whose subject starts with this prefix.
    pub checkpoint_prefix: Option<String>,
}

impl HistoryOptions {
    /// Build options from the `[history]` config section.
    pub fn from_config(config: &HistoryConfig) -> Self {
        Self {
            max_count: config.max_count,
            revision: None,
            skip_stats: config.skip_stats,
            stats_concurrency: config.stats_concurrency,
            format: LogFormat::with_delimiter(config.delimiter.clone()),
            checkpoint_prefix: config
                .exclude_checkpoints
                .then(|| config.checkpoint_prefix.clone()),
        }
    }
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self::from_config(&HistoryConfig::default())
    }
}

/// Sum `--numstat` output into commit stats.
///
/// Binary files count as changed files with no line counts.
///
/// # Examples
///
/// ```
/// use strata_history::stats::commit_stats_from_numstat;
///
/// let stats = commit_stats_from_numstat("3\t1\tsrc/lib.rs\n-\t-\tlogo.png\n");
/// assert_eq!(stats.files_changed, 2);
/// assert_eq!(stats.additions, 3);
/// assert_eq!(stats.deletions, 1);
/// ```
pub fn commit_stats_from_numstat(text: &str) -> CommitStats {
    parse_numstat(text)
        .iter()
        .fold(CommitStats::default(), |mut stats, entry| {
            stats.files_changed += 1;
            stats.additions += u64::from(entry.additions);
            stats.deletions += u64::from(entry.deletions);
            stats
        })
}

/// Attach [`CommitStats`] to each record, at most `concurrency` calls at once.
///
/// Output order matches input order. A commit whose stats cannot be read
/// keeps `stats: None` and the failure is logged.
pub async fn attach_stats<R>(
    runner: Arc<R>,
    mut records: Vec<CommitRecord>,
    concurrency: usize,
) -> Vec<CommitRecord>
where
    R: CommandRunner + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, record) in records.iter().enumerate() {
        if record.hash.is_empty() {
            continue;
        }
        let runner = Arc::clone(&runner);
        let semaphore = Arc::clone(&semaphore);
        let hash = record.hash.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = tokio::task::spawn_blocking(move || {
                runner.run(&[
                    "show",
                    "--numstat",
                    "--format=",
                    "--diff-merges=first-parent",
                    hash.as_str(),
                ])
            })
            .await
            .map_err(|e| StrataError::Git(format!("stats task failed: {e}")))
            .and_then(|r| r);
            (index, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(numstat))) => {
                records[index].stats = Some(commit_stats_from_numstat(&numstat));
            }
            Ok((index, Err(e))) => {
                warn!(hash = %records[index].hash, error = %e, "failed to load commit stats");
            }
            Err(e) => warn!(error = %e, "stats task panicked"),
        }
    }

    records
}

/// Load, filter and optionally annotate the commit history.
///
/// Commits come back newest first, children always before their parents.
///
/// # Errors
///
/// Returns [`StrataError::Git`] if the log cannot be read.
pub async fn load_history<R>(
    runner: Arc<R>,
    options: &HistoryOptions,
) -> Result<Vec<CommitRecord>, StrataError>
where
    R: CommandRunner + ?Sized + 'static,
{
    let args = vec![
        "log".to_string(),
        "--date-order".to_string(),
        format!("--max-count={}", options.max_count),
        format!("--format={}", options.format.git_format()),
        options.revision.clone().unwrap_or_else(|| "HEAD".into()),
    ];
    let log_runner = Arc::clone(&runner);
    let text = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        log_runner.run(&args)
    })
    .await
    .map_err(|e| StrataError::Git(format!("log task failed: {e}")))??;

    let mut records = parse_log(&text, &options.format);
    let parsed = records.len();
    if let Some(prefix) = &options.checkpoint_prefix {
        records = apply_filter(records, &SubjectPrefixFilter::new(prefix.as_str()));
    }
    debug!(parsed, kept = records.len(), "parsed log");

    if !options.skip_stats {
        records = attach_stats(runner, records, options.stats_concurrency).await;
    }

    info!(commits = records.len(), stats = !options.skip_stats, "loaded history");
    Ok(records)
}

/// Load the file changes of one commit, with hunks.
///
/// Merge commits are compared against their first parent.
///
/// # Errors
///
/// Returns [`StrataError::Git`] if any of the underlying git calls fails.
pub fn load_commit_changes<R>(
    runner: &R,
    hash: &str,
    options: &DiffConfig,
) -> Result<Vec<FileChange>, StrataError>
where
    R: CommandRunner + ?Sized,
{
    collect_changes(
        runner,
        &["show", "--format=", "--diff-merges=first-parent"],
        &[hash],
        options,
    )
}

/// Load uncommitted changes, either in the working tree or in the index.
///
/// # Errors
///
/// Returns [`StrataError::Git`] if any of the underlying git calls fails.
pub fn load_worktree_changes<R>(
    runner: &R,
    staged: bool,
    options: &DiffConfig,
) -> Result<Vec<FileChange>, StrataError>
where
    R: CommandRunner + ?Sized,
{
    let prefix: &[&str] = if staged {
        &["diff", "--cached"]
    } else {
        &["diff"]
    };
    collect_changes(runner, prefix, &[], options)
}

fn collect_changes<R>(
    runner: &R,
    prefix: &[&str],
    suffix: &[&str],
    options: &DiffConfig,
) -> Result<Vec<FileChange>, StrataError>
where
    R: CommandRunner + ?Sized,
{
    let renames: &[&str] = if options.find_renames {
        &["-M", "-C"]
    } else {
        &["--no-renames"]
    };
    let context = format!("-U{}", options.context_lines);

    let run = |mode: &[&str]| {
        let mut args = prefix.to_vec();
        args.extend_from_slice(mode);
        args.extend_from_slice(renames);
        args.extend_from_slice(suffix);
        runner.run(&args)
    };

    let name_status = run(&["--name-status"])?;
    let numstat = run(&["--numstat"])?;
    let patch = run(&["--patch", "--no-color", "--no-ext-diff", context.as_str()])?;

    let mut changes = classify(&name_status, &numstat);
    attach_hunks(&mut changes, split_file_patches(&patch));
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Answers by the last argument (the commit hash) or by the mode flag.
    #[derive(Default)]
    struct ScriptedRunner {
        responses: HashMap<String, String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn respond(mut self, key: &str, output: &str) -> Self {
            self.responses.insert(key.into(), output.into());
            self
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, args: &[&str]) -> Result<String, StrataError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(args.iter().map(|a| a.to_string()).collect());
            }
            let key = match args {
                ["log", ..] => "log".to_string(),
                ["show", "--numstat", "--format=", _, hash] => format!("stats:{hash}"),
                _ => args
                    .iter()
                    .find(|a| matches!(**a, "--name-status" | "--numstat" | "--patch"))
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
            };
            self.responses
                .get(&key)
                .cloned()
                .ok_or_else(|| StrataError::Git(format!("unexpected call: {args:?}")))
        }
    }

    fn options() -> HistoryOptions {
        HistoryOptions {
            format: LogFormat::with_delimiter("|"),
            ..HistoryOptions::default()
        }
    }

    const LOG: &str = "c|c|third|Jane|2024-01-03|b|HEAD -> main\n\
                       b|b|checkpoint: autosave|Jane|2024-01-02|a|\n\
                       a|a|first|Jane|2024-01-01||\n";

    #[test]
    fn numstat_totals() {
        let stats = commit_stats_from_numstat("10\t2\ta.rs\n0\t5\tb.rs\n\n");
        assert_eq!(
            stats,
            CommitStats {
                files_changed: 2,
                additions: 10,
                deletions: 7
            }
        );
        assert_eq!(commit_stats_from_numstat(""), CommitStats::default());
    }

    #[tokio::test]
    async fn history_filters_checkpoints_and_attaches_stats() {
        let runner = Arc::new(
            ScriptedRunner::default()
                .respond("log", LOG)
                .respond("stats:c", "1\t1\tsrc/lib.rs\n")
                .respond("stats:a", "5\t0\tREADME.md\n2\t0\tsrc/lib.rs\n"),
        );
        let commits = load_history(Arc::clone(&runner), &options()).await.unwrap();

        let hashes: Vec<_> = commits.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c", "a"]);
        assert_eq!(commits[0].stats.map(|s| s.additions), Some(1));
        assert_eq!(commits[1].stats.map(|s| s.files_changed), Some(2));

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].contains(&"--format=%H|%h|%s|%an|%aI|%P|%D".to_string()));
        assert!(calls[0].contains(&"--max-count=500".to_string()));
    }

    #[tokio::test]
    async fn skip_stats_makes_a_single_call() {
        let runner = Arc::new(ScriptedRunner::default().respond("log", LOG));
        let opts = HistoryOptions {
            skip_stats: true,
            checkpoint_prefix: None,
            ..options()
        };
        let commits = load_history(Arc::clone(&runner), &opts).await.unwrap();
        assert_eq!(commits.len(), 3);
        assert!(commits.iter().all(|c| c.stats.is_none()));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_stats_leave_none() {
        let runner = Arc::new(ScriptedRunner::default().respond("stats:a", "1\t0\tx\n"));
        let records = parse_log("b|b|s|J||a|\na|a|s|J|||\n", &LogFormat::with_delimiter("|"));
        let records = attach_stats(runner, records, 1).await;
        assert!(records[0].stats.is_none());
        assert_eq!(records[1].stats.map(|s| s.additions), Some(1));
    }

    #[tokio::test]
    async fn records_without_hash_are_not_queried() {
        let runner = Arc::new(ScriptedRunner::default().respond("stats:a", "1\t0\tx\n"));
        let records = parse_log("|x|no hash|J|||\na|a|s|J|||\n", &LogFormat::with_delimiter("|"));
        let records = attach_stats(Arc::clone(&runner), records, 2).await;
        assert!(records[0].stats.is_none());
        assert!(records[1].stats.is_some());
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn log_failure_is_an_error() {
        let runner = Arc::new(ScriptedRunner::default());
        let result = load_history(runner, &options()).await;
        assert!(matches!(result, Err(StrataError::Git(_))));
    }

    #[test]
    fn commit_changes_combine_all_three_views() {
        let runner = ScriptedRunner::default()
            .respond("--name-status", "M\tsrc/lib.rs\nR100\told.md\tnew.md\n")
            .respond("--numstat", "2\t1\tsrc/lib.rs\n0\t0\told.md => new.md\n")
            .respond(
                "--patch",
                "diff --git a/src/lib.rs b/src/lib.rs\n\
                 --- a/src/lib.rs\n\
                 +++ b/src/lib.rs\n\
                 @@ -1,2 +1,3 @@\n\
                 -old\n\
                 +new\n\
                 +more\n \
                 same\n",
            );

        let changes = load_commit_changes(&runner, "abc", &DiffConfig::default()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!((changes[0].additions, changes[0].deletions), (2, 1));
        assert_eq!(changes[0].hunks.len(), 1);
        assert_eq!(changes[1].old_path.as_deref(), Some("old.md"));
        assert!(changes[1].hunks.is_empty());

        let calls = runner.calls.lock().unwrap();
        assert!(calls.iter().all(|c| c.last().map(String::as_str) == Some("abc")));
        assert!(calls.iter().all(|c| c.contains(&"-M".to_string())));
        assert!(calls[2].contains(&"-U3".to_string()));
    }

    #[test]
    fn staged_changes_use_cached_diff() {
        let runner = ScriptedRunner::default()
            .respond("--name-status", "A\tnew.rs\n")
            .respond("--numstat", "1\t0\tnew.rs\n")
            .respond("--patch", "");
        let config = DiffConfig {
            find_renames: false,
            context_lines: 0,
        };

        let changes = load_worktree_changes(&runner, true, &config).unwrap();
        assert_eq!(changes[0].status, strata_core::FileChangeStatus::Added);

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0][..2], ["diff".to_string(), "--cached".to_string()]);
        assert!(calls[0].contains(&"--no-renames".to_string()));
    }
}
