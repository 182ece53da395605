//! Unified-diff parsing and per-file change classification.
//!
//! Turns the textual output of `git diff`, `--numstat` and `--name-status`
//! into [`strata_core::FileChange`] records with nested hunks. Every entry
//! point fails soft: malformed input degrades to fewer (or empty) results,
//! never to an error.

pub mod classify;
pub mod parser;
pub mod summary;
