//! Repository scanning for the line-count treemap.

use std::path::Path;

use strata_core::{StrataError, TreemapConfig};
use tracing::debug;

use crate::tree::WeightedTree;

/// Number of bytes checked for NUL when detecting binary files.
const BINARY_CHECK_SIZE: usize = 8192;

/// Which files [`scan_line_counts`] weighs.
///
/// # Examples
///
/// ```
/// use strata_treemap::scan::ScanOptions;
///
/// let opts = ScanOptions::default();
/// assert_eq!(opts.max_file_size, 1_048_576);
/// assert!(!opts.hidden);
/// ```
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Skip files larger than this many bytes.
    pub max_file_size: u64,
    /// Include hidden files and directories.
    pub hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&TreemapConfig::default())
    }
}

impl ScanOptions {
    pub fn from_config(config: &TreemapConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            hidden: false,
        }
    }
}

/// Walk `root`, respecting `.gitignore`, and weigh each text file by its
/// line count.
///
/// Binary files (a NUL byte in the first 8 KiB), files over the size limit
/// and unreadable entries are skipped. Node ids are `/`-separated paths
/// relative to `root`.
///
/// # Errors
///
/// Returns [`StrataError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use strata_treemap::scan::{scan_line_counts, ScanOptions};
///
/// let tree = scan_line_counts(Path::new("."), &ScanOptions::default()).unwrap();
/// println!("{} lines", tree.weight);
/// ```
pub fn scan_line_counts(root: &Path, options: &ScanOptions) -> Result<WeightedTree, StrataError> {
    if !root.is_dir() {
        return Err(StrataError::FileNotFound(root.to_path_buf()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .hidden(!options.hidden)
        .build();
    let mut entries = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.len() > options.max_file_size {
            debug!(path = %path.display(), size = metadata.len(), "skipping large file");
            continue;
        }

        let Ok(bytes) = std::fs::read(path) else {
            continue;
        };
        let check_len = bytes.len().min(BINARY_CHECK_SIZE);
        if bytes[..check_len].contains(&0) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((id, count_lines(&bytes) as f64));
    }

    debug!(files = entries.len(), root = %root.display(), "scanned");
    let root_id = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".into());
    Ok(WeightedTree::from_paths(root_id, entries))
}

/// Newline count, plus one for a final line without a trailing newline.
fn count_lines(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
