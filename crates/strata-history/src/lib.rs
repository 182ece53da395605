//! Commit history extraction and commit-graph layout.
//!
//! Provides:
//! - [`log`]: commit records from `git log` output
//! - [`filter`]: post-parse commit predicates (checkpoint hiding)
//! - [`graph`]: hash-indexed commit graph over a truncated window
//! - [`lanes`]: streaming lane assignment for graph rendering
//! - [`runner`]: the `git` process seam
//! - [`stats`]: async history loading with per-commit stats and per-commit changes

pub mod filter;
pub mod graph;
pub mod lanes;
pub mod log;
pub mod runner;
pub mod stats;
