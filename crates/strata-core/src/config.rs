use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Private-use-area character used as the default log field delimiter.
///
/// It never appears in git's own output, so subjects, author names and ref
/// decorations can contain any printable character without splitting a
/// record in the wrong place.
pub const DEFAULT_LOG_DELIMITER: &str = "\u{e000}";

/// Top-level configuration loaded from `.strata.toml`.
///
/// Resolution order: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use strata_core::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.history.max_count, 500);
/// assert_eq!(config.history.checkpoint_prefix, "checkpoint:");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    /// History loading settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Diff loading settings.
    #[serde(default)]
    pub diff: DiffConfig,
    /// File-size treemap settings.
    #[serde(default)]
    pub treemap: TreemapConfig,
}

impl StrataConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if the file does not exist,
    /// [`StrataError::Io`] if it cannot be read, [`StrataError::Toml`] if the
    /// content is not valid TOML, and [`StrataError::Config`] if a value is
    /// out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use strata_core::StrataConfig;
    /// use std::path::Path;
    ///
    /// let config = StrataConfig::from_file(Path::new(".strata.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, StrataError> {
        if !path.exists() {
            return Err(StrataError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Toml`] if parsing fails, or
    /// [`StrataError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::StrataConfig;
    ///
    /// let toml = r#"
    /// [history]
    /// max_count = 50
    /// skip_stats = true
    /// "#;
    /// let config = StrataConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.history.max_count, 50);
    /// assert!(config.history.skip_stats);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, StrataError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), StrataError> {
        let delimiter = &self.history.delimiter;
        if delimiter.is_empty() {
            return Err(StrataError::Config("history.delimiter must not be empty".into()));
        }
        if delimiter.contains('\n') || delimiter.contains('\u{1e}') {
            return Err(StrataError::Config(
                "history.delimiter must not contain a record separator".into(),
            ));
        }
        if self.history.stats_concurrency == 0 {
            return Err(StrataError::Config(
                "history.stats_concurrency must be at least 1".into(),
            ));
        }
        if !(self.treemap.width > 0.0 && self.treemap.height > 0.0) {
            return Err(StrataError::Config(format!(
                "treemap dimensions must be positive, got {}x{}",
                self.treemap.width, self.treemap.height
            )));
        }
        Ok(())
    }
}

/// History loading configuration.
///
/// # Examples
///
/// ```
/// use strata_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert_eq!(config.stats_concurrency, 8);
/// assert!(config.exclude_checkpoints);
/// assert!(!config.skip_stats);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of commits to load (default: 500).
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Field delimiter passed to `git log --format` (default: U+E000).
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Skip the per-commit stats pass (one extra git call per commit).
    #[serde(default)]
    pub skip_stats: bool,
    /// Maximum number of concurrent stats invocations (default: 8).
    #[serde(default = "default_stats_concurrency")]
    pub stats_concurrency: usize,
    /// Hide commits whose subject starts with `checkpoint_prefix`.
    #[serde(default = "default_true")]
    pub exclude_checkpoints: bool,
    /// Subject prefix that marks synthetic checkpoint commits.
    #[serde(default = "default_checkpoint_prefix")]
    pub checkpoint_prefix: String,
}

fn default_max_count() -> usize {
    500
}

fn default_delimiter() -> String {
    DEFAULT_LOG_DELIMITER.into()
}

fn default_stats_concurrency() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_checkpoint_prefix() -> String {
    "checkpoint:".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            delimiter: default_delimiter(),
            skip_stats: false,
            stats_concurrency: default_stats_concurrency(),
            exclude_checkpoints: true,
            checkpoint_prefix: default_checkpoint_prefix(),
        }
    }
}

/// Diff loading configuration.
///
/// # Examples
///
/// ```
/// use strata_core::DiffConfig;
///
/// let config = DiffConfig::default();
/// assert!(config.find_renames);
/// assert_eq!(config.context_lines, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Ask git to detect renames and copies (`-M -C`).
    #[serde(default = "default_true")]
    pub find_renames: bool,
    /// Context lines around each hunk (`-U`).
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
}

fn default_context_lines() -> u32 {
    3
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            find_renames: true,
            context_lines: default_context_lines(),
        }
    }
}

/// Treemap rendering configuration.
///
/// # Examples
///
/// ```
/// use strata_core::TreemapConfig;
///
/// let config = TreemapConfig::default();
/// assert_eq!(config.max_depth, 2);
/// assert_eq!(config.max_file_size, 1_048_576);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreemapConfig {
    /// Width of the layout area (default: 120).
    #[serde(default = "default_treemap_width")]
    pub width: f64,
    /// Height of the layout area (default: 40).
    #[serde(default = "default_treemap_height")]
    pub height: f64,
    /// How many directory levels to lay out (default: 2).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Files larger than this many bytes are left out (default: 1 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_treemap_width() -> f64 {
    120.0
}

fn default_treemap_height() -> f64 {
    40.0
}

fn default_max_depth() -> usize {
    2
}

fn default_max_file_size() -> u64 {
    1_048_576
}

impl Default for TreemapConfig {
    fn default() -> Self {
        Self {
            width: default_treemap_width(),
            height: default_treemap_height(),
            max_depth: default_max_depth(),
            max_file_size: default_max_file_size(),
        }
    }
}
