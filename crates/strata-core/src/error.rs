use std::path::PathBuf;

/// Errors that can occur across the Strata workspace.
///
/// The parsing and layout engines never produce these: they degrade to empty
/// or partial results instead. Errors come from the edges — running git,
/// loading configuration, walking the filesystem. The binary crate turns
/// them into `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use strata_core::StrataError;
///
/// let err = StrataError::Config("stats_concurrency must be at least 1".into());
/// assert!(err.to_string().contains("stats_concurrency"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StrataError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check the values in .strata.toml"))]
    Config(String),

    /// A git invocation failed or the repository could not be opened.
    #[error("git error: {0}")]
    Git(String),

    /// Input that could not be interpreted at all.
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StrataError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn git_error_displays_message() {
        let err = StrataError::Git("fatal: bad revision 'nope'".into());
        assert_eq!(err.to_string(), "git error: fatal: bad revision 'nope'");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = StrataError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert!(err.to_string().contains("/tmp/missing.toml"));
    }

    #[test]
    fn config_error_carries_help() {
        use miette::Diagnostic;

        let err = StrataError::Config("bad".into());
        let help = err.help().map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some("check the values in .strata.toml"));
    }
}
