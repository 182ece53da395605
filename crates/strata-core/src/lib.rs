//! Core types, configuration, and error handling for Strata.
//!
//! This crate provides the shared foundation used by the other Strata crates:
//! - [`StrataError`] — unified error type using `thiserror` and `miette`
//! - [`StrataConfig`] — configuration loaded from `.strata.toml`
//! - The parsed history/diff data model: [`CommitRecord`], [`FileChange`],
//!   [`DiffHunk`], [`DiffLine`], plus [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    DiffConfig, HistoryConfig, StrataConfig, TreemapConfig, DEFAULT_LOG_DELIMITER,
};
pub use error::StrataError;
pub use types::{
    CommitRecord, CommitStats, DiffHunk, DiffLine, DiffLineKind, FileChange, FileChangeStatus,
    OutputFormat,
};

/// A convenience `Result` type for Strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
