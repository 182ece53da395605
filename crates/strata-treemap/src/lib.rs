//! Squarified treemap layout for weighted trees.
//!
//! [`squarify::squarify`] lays out one level of siblings; [`squarify::squarify_tree`]
//! nests levels. [`scan::scan_line_counts`] builds the input tree from a
//! working copy.

pub mod scan;
pub mod squarify;
pub mod tree;
