use std::io::IsTerminal;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use strata_core::{CommitRecord, FileChange, OutputFormat, StrataConfig};
use strata_difflens::parser::split_file_patches;
use strata_difflens::summary::{escape_table_cell, DiffSummary};
use strata_history::lanes::{assign_lanes, LaneRow};
use strata_history::log::{parse_log, LogFormat};
use strata_history::runner::{CommandRunner, GitCli};
use strata_history::stats::{load_commit_changes, load_history, load_worktree_changes, HistoryOptions};
use strata_treemap::scan::{scan_line_counts, ScanOptions};
use strata_treemap::squarify::{squarify_tree, Rect};

const CONFIG_FILE: &str = ".strata.toml";

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Commit history, diff and treemap inspection for git repositories",
    long_about = "Strata reads a repository's history and diffs into structured records,\n\
                   lays commits out into graph lanes, and maps the working tree by line count.\n\n\
                   Examples:\n  \
                     strata log --graph                  Commit graph with lanes\n  \
                     strata log --format json --stats    Commits with file and line stats\n  \
                     strata show HEAD                    Files and hunks of one commit\n  \
                     git diff main | strata diff         Summarize a patch from stdin\n  \
                     strata treemap --depth 3            Line-count treemap of the tree\n  \
                     strata doctor                       Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .strata.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging unless STRATA_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Show commit history with graph lanes
    #[command(long_about = "Show commit history with graph lanes.\n\n\
        Commits are listed newest first. Each commit is assigned a lane so that\n\
        branch lines stay in one column. Checkpoint commits are hidden unless\n\
        --all-commits is given.")]
    Log {
        /// Repository path
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Maximum number of commits (default from config: 500)
        #[arg(long, short = 'n')]
        max_count: Option<usize>,

        /// Revision to start from (default: HEAD)
        #[arg(long)]
        rev: Option<String>,

        /// Load per-commit file and line stats
        #[arg(long)]
        stats: bool,

        /// Draw the lane graph next to each commit
        #[arg(long)]
        graph: bool,

        /// Include checkpoint commits
        #[arg(long)]
        all_commits: bool,
    },
    /// Show the file changes of one commit
    Show {
        /// Commit hash or revision
        hash: String,

        /// Repository path
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Summarize a unified diff
    #[command(long_about = "Summarize a unified diff.\n\n\
        Reads a patch from --file or stdin. With --path or --staged, diffs the\n\
        working tree (or the index) of that repository instead.")]
    Diff {
        /// Read the patch from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,

        /// Diff the index instead of the working tree
        #[arg(long)]
        staged: bool,

        /// Diff the working tree of this repository
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Lay out the working tree as a line-count treemap
    Treemap {
        /// Directory to scan
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Layout width (default from config: 120)
        #[arg(long)]
        width: Option<f64>,

        /// Layout height (default from config: 40)
        #[arg(long)]
        height: Option<f64>,

        /// Directory levels to lay out (default from config: 2)
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Create a default .strata.toml configuration file
    #[command(long_about = "Create a default .strata.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .strata.toml already exists.")]
    Init,
    /// Check your Strata setup and environment
    #[command(long_about = "Check your Strata setup and environment.\n\n\
        Runs diagnostics for the git repository, config file and git executable.\n\
        Use --format json for machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mstrata\x1b[0m v{version} — history, diffs and lanes for git repositories\n");
        println!("Commands:");
        println!("  \x1b[32mlog\x1b[0m       Commit history with graph lanes");
        println!("  \x1b[32mshow\x1b[0m      File changes and hunks of one commit");
        println!("  \x1b[32mdiff\x1b[0m      Summarize a patch or the working tree");
        println!("  \x1b[32mtreemap\x1b[0m   Line-count treemap of the working tree");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("strata v{version} — history, diffs and lanes for git repositories\n");
        println!("Commands:");
        println!("  log       Commit history with graph lanes");
        println!("  show      File changes and hunks of one commit");
        println!("  diff      Summarize a patch or the working tree");
        println!("  treemap   Line-count treemap of the working tree");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'strata <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STRATA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<StrataConfig> {
    let config = match path {
        Some(path) => StrataConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                StrataConfig::from_file(default_path)?
            } else {
                StrataConfig::default()
            }
        }
    };
    Ok(config)
}

fn read_diff_input(file: &Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

/// One `log --format json` entry: the commit plus its lane placement.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry<'a> {
    #[serde(flatten)]
    commit: &'a CommitRecord,
    lane: usize,
    is_merge: bool,
    parent_lanes: &'a [usize],
    passing_lanes: &'a [usize],
}

/// Graph column for one row: `*` on the commit's lane, `|` on lanes passing through.
fn graph_prefix(row: &LaneRow, columns: usize) -> String {
    (0..columns)
        .map(|lane| {
            if lane == row.lane {
                '*'
            } else if row.passing_lanes.contains(&lane) {
                '|'
            } else {
                ' '
            }
        })
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

fn short_date(commit: &CommitRecord) -> String {
    commit
        .authored_at
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn markdown_log_row(commit: &CommitRecord, lane: usize) -> String {
    format!(
        "| `{}` | {lane} | {} | {} | {} | {} |",
        commit.short_hash,
        escape_table_cell(&commit.subject),
        escape_table_cell(&commit.refs.join(", ")),
        escape_table_cell(&commit.author),
        short_date(commit)
    )
}

fn print_commit_line(commit: &CommitRecord, prefix: &str, use_color: bool) {
    let refs = if commit.refs.is_empty() {
        String::new()
    } else if use_color {
        format!(" \x1b[32m({})\x1b[0m", commit.refs.join(", "))
    } else {
        format!(" ({})", commit.refs.join(", "))
    };
    let stats = commit
        .stats
        .map(|s| format!("  [{} files, +{} -{}]", s.files_changed, s.additions, s.deletions))
        .unwrap_or_default();
    let hash = if use_color {
        format!("\x1b[33m{}\x1b[0m", commit.short_hash)
    } else {
        commit.short_hash.clone()
    };
    println!(
        "{prefix}{hash}{refs} {} — {} {}{stats}",
        commit.subject,
        commit.author,
        short_date(commit)
    );
}

fn print_changes(changes: &[FileChange], format: OutputFormat) -> Result<()> {
    let summary = DiffSummary::from_changes(changes);
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "summary": summary,
            "files": changes,
        })),
        OutputFormat::Markdown => {
            print!("{}", summary.to_markdown());
            Ok(())
        }
        OutputFormat::Text => {
            print!("{summary}");
            Ok(())
        }
    }
}

fn spinner(message: &str) -> indicatif::ProgressBar {
    if !std::io::stderr().is_terminal() {
        return indicatif::ProgressBar::hidden();
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(config_path: Option<&Path>, format: OutputFormat, use_color: bool) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();
    let cwd = std::env::current_dir().into_diagnostic()?;

    // 1. Git repository
    let repo = git2::Repository::discover(&cwd).ok();
    match repo.as_ref().and_then(|r| r.workdir()) {
        Some(root) => checks.push(CheckResult::pass(
            "git_repository",
            format!("detected at {}", root.display()),
        )),
        None => checks.push(CheckResult::fail(
            "git_repository",
            "not a git repository",
            "run strata from inside a git working tree",
        )),
    }

    // 2. Config file
    let path = config_path.unwrap_or(Path::new(CONFIG_FILE));
    if path.exists() {
        match StrataConfig::from_file(path) {
            Ok(_) => checks.push(CheckResult::pass(
                "config_file",
                format!("{} found", path.display()),
            )),
            Err(e) => checks.push(CheckResult::fail(
                "config_file",
                format!("{} is invalid: {e}", path.display()),
                "fix the value or run 'strata init' in a fresh directory for a template",
            )),
        }
    } else {
        checks.push(CheckResult::info(
            "config_file",
            format!("{} not found, using defaults", path.display()),
        ));
    }

    // 3. git executable
    match GitCli::new(&cwd).run(&["--version"]) {
        Ok(version) => checks.push(CheckResult::pass("git_executable", version.trim())),
        Err(e) => checks.push(CheckResult::fail(
            "git_executable",
            e.to_string(),
            "install git and make sure it is on PATH",
        )),
    }

    // 4. History
    if let Some(repo) = &repo {
        let count = repo.revwalk().ok().and_then(|mut walk| {
            walk.push_head().ok()?;
            Some(walk.take(10_000).filter(|oid| oid.is_ok()).count())
        });
        match count {
            Some(10_000) => checks.push(CheckResult::info("git_history", "10000+ commits reachable from HEAD")),
            Some(n) => checks.push(CheckResult::info("git_history", format!("{n} commits reachable from HEAD"))),
            None => checks.push(CheckResult::info("git_history", "no commits yet")),
        }
    }

    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            print_json(&serde_json::json!({
                "version": version,
                "checks": checks,
            }))?;
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("Strata v{version} — Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Strata Configuration

[history]
# max_count = 500
# Field delimiter for `git log --format`; must never occur in log output.
# delimiter = ""
# skip_stats = false
# stats_concurrency = 8
# exclude_checkpoints = true
# checkpoint_prefix = "checkpoint:"

[diff]
# find_renames = true
# context_lines = 3

[treemap]
# width = 120.0
# height = 40.0
# max_depth = 2
# max_file_size = 1048576
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Log {
            ref path,
            max_count,
            ref rev,
            stats,
            graph,
            all_commits,
        }) => {
            let mut options = HistoryOptions::from_config(&config.history);
            if let Some(n) = max_count {
                options.max_count = n;
            }
            options.revision = rev.clone();
            options.skip_stats = !stats && (graph || config.history.skip_stats);
            if all_commits {
                options.checkpoint_prefix = None;
            }

            let runner = Arc::new(GitCli::discover(path)?);
            let pb = if options.skip_stats {
                indicatif::ProgressBar::hidden()
            } else {
                spinner("Loading commit stats...")
            };
            let commits = load_history(runner, &options).await;
            pb.finish_and_clear();
            let commits = commits?;

            let layout = assign_lanes(&commits);
            match cli.format {
                OutputFormat::Json => {
                    let entries: Vec<LogEntry<'_>> = commits
                        .iter()
                        .zip(&layout.rows)
                        .map(|(commit, row)| LogEntry {
                            commit,
                            lane: row.lane,
                            is_merge: commit.is_merge(),
                            parent_lanes: &row.parent_lanes,
                            passing_lanes: &row.passing_lanes,
                        })
                        .collect();
                    print_json(&entries)?;
                }
                OutputFormat::Markdown => {
                    println!("| Commit | Lane | Subject | Refs | Author | Date |");
                    println!("|--------|------|---------|------|--------|------|");
                    for (commit, row) in commits.iter().zip(&layout.rows) {
                        println!("{}", markdown_log_row(commit, row.lane));
                    }
                }
                OutputFormat::Text => {
                    if commits.is_empty() {
                        println!("No commits.");
                    }
                    let columns = layout.lane_count();
                    for (commit, row) in commits.iter().zip(&layout.rows) {
                        let prefix = if graph {
                            format!("{}  ", graph_prefix(row, columns))
                        } else {
                            String::new()
                        };
                        print_commit_line(commit, &prefix, use_color);
                    }
                }
            }
        }
        Some(Command::Show { ref hash, ref path }) => {
            let runner = GitCli::discover(path)?;
            let format = LogFormat::default();
            let log = runner.run(&[
                "log",
                "-1",
                &format!("--format={}", format.git_format()),
                hash.as_str(),
            ])?;
            let commit = parse_log(&log, &format).into_iter().next();
            let changes = load_commit_changes(&runner, hash, &config.diff)?;

            match cli.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "commit": commit,
                    "files": changes,
                }))?,
                _ => {
                    if let Some(commit) = &commit {
                        print_commit_line(commit, "", use_color);
                        println!();
                    }
                    print_changes(&changes, cli.format)?;
                }
            }
        }
        Some(Command::Diff {
            ref file,
            staged,
            ref path,
        }) => {
            let changes = if path.is_some() || staged {
                let root = path.clone().unwrap_or_else(|| PathBuf::from("."));
                let runner = GitCli::discover(&root)?;
                load_worktree_changes(&runner, staged, &config.diff)?
            } else {
                let input = read_diff_input(file)?;
                if input.trim().is_empty() {
                    eprintln!("hint: no diff input. Try: git diff | strata diff");
                }
                split_file_patches(&input)
                    .into_iter()
                    .map(|patch| patch.into_file_change())
                    .collect()
            };
            print_changes(&changes, cli.format)?;
        }
        Some(Command::Treemap {
            ref path,
            width,
            height,
            depth,
        }) => {
            let width = width.unwrap_or(config.treemap.width);
            let height = height.unwrap_or(config.treemap.height);
            if !(width > 0.0 && height > 0.0) {
                miette::bail!("treemap dimensions must be positive, got {width}x{height}");
            }
            let depth = depth.unwrap_or(config.treemap.max_depth);

            let tree = scan_line_counts(path, &ScanOptions::from_config(&config.treemap))?;
            let rects = squarify_tree(&tree, Rect::new(0.0, 0.0, width, height), depth);

            match cli.format {
                OutputFormat::Json => print_json(&rects)?,
                OutputFormat::Markdown => {
                    println!("| Path | Lines | x | y | Width | Height |");
                    println!("|------|-------|---|---|-------|--------|");
                    for r in &rects {
                        let lines = tree.find(&r.node_id).map(|n| n.weight).unwrap_or_default();
                        println!(
                            "| `{}` | {lines} | {:.1} | {:.1} | {:.1} | {:.1} |",
                            escape_table_cell(&r.node_id),
                            r.x,
                            r.y,
                            r.width,
                            r.height
                        );
                    }
                }
                OutputFormat::Text => {
                    if rects.is_empty() {
                        println!("No text files found under {}.", path.display());
                    }
                    for r in &rects {
                        let lines = tree.find(&r.node_id).map(|n| n.weight).unwrap_or_default();
                        let name = tree.find(&r.node_id).map(|n| n.name()).unwrap_or(&r.node_id);
                        println!(
                            "{:>8} lines  {:>6.1} x {:<6.1} at ({:>6.1}, {:>6.1})  {}{name}",
                            lines,
                            r.width,
                            r.height,
                            r.x,
                            r.y,
                            "  ".repeat(r.depth)
                        );
                    }
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(cli.config.as_deref(), cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "strata", &mut std::io::stdout());
        }
    }

    Ok(())
}
