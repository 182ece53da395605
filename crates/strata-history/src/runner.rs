//! The seam between history loading and the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use strata_core::StrataError;
use tracing::debug;

/// Runs a VCS subcommand and returns its standard output.
///
/// History loading only talks to git through this trait, so tests can swap in
/// canned output.
pub trait CommandRunner: Send + Sync {
    /// Run `git <args>` and return stdout.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Git`] if the command cannot be started or exits
    /// with a non-zero status.
    fn run(&self, args: &[&str]) -> Result<String, StrataError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for std::sync::Arc<R> {
    fn run(&self, args: &[&str]) -> Result<String, StrataError> {
        (**self).run(args)
    }
}

/// Runs the `git` executable inside a working directory.
///
/// # Examples
///
/// ```no_run
/// use strata_history::runner::{CommandRunner, GitCli};
///
/// let git = GitCli::discover(".").unwrap();
/// let head = git.run(&["rev-parse", "HEAD"]).unwrap();
/// println!("{}", head.trim());
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
    program: String,
}

impl GitCli {
    /// Run git in `workdir` as given.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            program: "git".into(),
        }
    }

    /// Find the repository containing `path` and run git at its top level.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Git`] if `path` is not inside a repository or
    /// the repository has no working tree.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, StrataError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|e| {
            StrataError::Git(format!("not a git repository: {}: {e}", path.display()))
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| StrataError::Git("bare repositories have no working tree".into()))?;
        Ok(Self::new(workdir))
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Directory git runs in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl CommandRunner for GitCli {
    fn run(&self, args: &[&str]) -> Result<String, StrataError> {
        debug!(program = %self.program, ?args, "running");
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .output()
            .map_err(|e| StrataError::Git(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StrataError::Git(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitCli::discover(dir.path());
        assert!(matches!(result, Err(StrataError::Git(_))));
    }

    #[test]
    fn discover_finds_top_level_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let git = GitCli::discover(&nested).unwrap();
        assert_eq!(
            git.workdir().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn missing_program_is_a_git_error() {
        let git = GitCli::new(".").with_program("definitely-not-a-real-git-binary");
        let result = git.run(&["status"]);
        assert!(matches!(result, Err(StrataError::Git(msg)) if msg.contains("failed to run")));
    }
}
