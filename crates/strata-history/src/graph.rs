//! Commit graph assembly over a (possibly truncated) history window.

use std::collections::{HashMap, HashSet};

use strata_core::CommitRecord;

/// Commits indexed by hash, in their original order.
///
/// Parent hashes are not required to resolve: a history window usually ends
/// before the root, and the commits just past the window are simply absent.
///
/// # Examples
///
/// ```
/// use strata_history::graph::CommitGraph;
/// use strata_history::log::{parse_log, LogFormat};
///
/// let log = "c|c|third|J||b|\nb|b|second|J||a|\n";
/// let graph = CommitGraph::build(parse_log(log, &LogFormat::with_delimiter("|")));
///
/// assert_eq!(graph.len(), 2);
/// assert_eq!(graph.parents_of("c")[0].subject, "second");
/// assert!(graph.parents_of("b").is_empty());
/// assert_eq!(graph.boundary_parents(), vec!["a"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommitGraph {
    commits: Vec<CommitRecord>,
    index: HashMap<String, usize>,
}

impl CommitGraph {
    /// Index `records` by hash. The first occurrence of a repeated hash wins.
    pub fn build(records: Vec<CommitRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, commit) in records.iter().enumerate() {
            index.entry(commit.hash.clone()).or_insert(i);
        }
        Self {
            commits: records,
            index,
        }
    }

    /// The commit with `hash`, if it is inside the window.
    pub fn lookup(&self, hash: &str) -> Option<&CommitRecord> {
        self.index_of(hash).map(|i| &self.commits[i])
    }

    /// Position of `hash` in the original order.
    pub fn index_of(&self, hash: &str) -> Option<usize> {
        self.index.get(hash).copied()
    }

    /// Resolved parents of `hash`, in parent-list order.
    ///
    /// Parents outside the window are omitted. Unknown hashes have no parents.
    pub fn parents_of(&self, hash: &str) -> Vec<&CommitRecord> {
        self.lookup(hash)
            .map(|commit| {
                commit
                    .parents
                    .iter()
                    .filter_map(|p| self.lookup(p))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent hashes referenced by the window but not contained in it.
    ///
    /// These are where loading more history would continue from. Order is
    /// first reference, without duplicates.
    pub fn boundary_parents(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.commits
            .iter()
            .flat_map(|c| c.parents.iter())
            .map(String::as_str)
            .filter(|p| !self.index.contains_key(*p) && seen.insert(*p))
            .collect()
    }

    /// Walk first parents starting at `hash` (inclusive) while they resolve.
    pub fn first_parent_chain<'a>(&'a self, hash: &str) -> FirstParentChain<'a> {
        FirstParentChain {
            graph: self,
            next: self.lookup(hash),
            steps: 0,
        }
    }

    /// Number of commits in the window.
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the window holds no commits.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// All commits in their original order.
    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    /// Iterate commits in their original order.
    pub fn iter(&self) -> std::slice::Iter<'_, CommitRecord> {
        self.commits.iter()
    }
}

impl<'a> IntoIterator for &'a CommitGraph {
    type Item = &'a CommitRecord;
    type IntoIter = std::slice::Iter<'a, CommitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`CommitGraph::first_parent_chain`].
#[derive(Debug)]
pub struct FirstParentChain<'a> {
    graph: &'a CommitGraph,
    next: Option<&'a CommitRecord>,
    steps: usize,
}

impl<'a> Iterator for FirstParentChain<'a> {
    type Item = &'a CommitRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        // Malformed input can form a parent cycle; a chain never exceeds the window.
        self.steps += 1;
        if self.steps < self.graph.len() {
            self.next = current.first_parent().and_then(|p| self.graph.lookup(p));
        }
        Some(current)
    }
}
