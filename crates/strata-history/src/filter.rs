//! Post-parse commit filtering.
//!
//! Filters run after [`crate::log::parse_log`], so the parser output always
//! maps one-to-one onto the log text.

use strata_core::CommitRecord;

/// Decides whether a commit stays in the history view.
///
/// Closures implement this trait, so ad-hoc predicates need no wrapper type.
///
/// # Examples
///
/// ```
/// use strata_history::filter::{apply_filter, CommitFilter};
/// # use strata_core::CommitRecord;
/// # fn commit(author: &str) -> CommitRecord {
/// #     CommitRecord {
/// #         hash: author.into(), short_hash: author.into(), parents: vec![], refs: vec![],
/// #         author: author.into(), authored_at: None, subject: String::new(),
/// #         body: None, stats: None,
/// #     }
/// # }
///
/// let only_jane = |c: &CommitRecord| c.author == "Jane";
/// let kept = apply_filter(vec![commit("Jane"), commit("Bot")], &only_jane);
/// assert_eq!(kept.len(), 1);
/// ```
pub trait CommitFilter {
    /// Return `true` to keep the commit.
    fn keep(&self, commit: &CommitRecord) -> bool;
}

impl<F> CommitFilter for F
where
    F: Fn(&CommitRecord) -> bool,
{
    fn keep(&self, commit: &CommitRecord) -> bool {
        self(commit)
    }
}

/// Drops commits whose subject starts with a reserved prefix.
///
/// Used to hide synthetic checkpoint commits created by tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectPrefixFilter {
    prefix: String,
}

impl SubjectPrefixFilter {
    /// Exclude subjects starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The excluded prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl CommitFilter for SubjectPrefixFilter {
    fn keep(&self, commit: &CommitRecord) -> bool {
        self.prefix.is_empty() || !commit.subject.starts_with(&self.prefix)
    }
}

/// Keep the records accepted by `filter`, preserving order.
pub fn apply_filter<F>(records: Vec<CommitRecord>, filter: &F) -> Vec<CommitRecord>
where
    F: CommitFilter + ?Sized,
{
    records.into_iter().filter(|c| filter.keep(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(hash: &str, subject: &str) -> CommitRecord {
        CommitRecord {
            hash: hash.into(),
            short_hash: hash.into(),
            parents: vec![],
            refs: vec![],
            author: "Jane".into(),
            authored_at: None,
            subject: subject.into(),
            body: None,
            stats: None,
        }
    }

    #[test]
    fn checkpoint_commits_are_dropped() {
        let records = vec![
            commit("a", "feat: real work"),
            commit("b", "checkpoint: autosave"),
            commit("c", "fix: checkpoint: not a prefix"),
        ];
        let kept = apply_filter(records, &SubjectPrefixFilter::new("checkpoint:"));
        let hashes: Vec<_> = kept.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "c"]);
    }

    #[test]
    fn empty_prefix_keeps_everything() {
        let records = vec![commit("a", ""), commit("b", "anything")];
        assert_eq!(apply_filter(records, &SubjectPrefixFilter::new("")).len(), 2);
    }

    #[test]
    fn closures_are_filters() {
        let records = vec![commit("a", "x"), commit("b", "y")];
        let kept = apply_filter(records, &|c: &CommitRecord| c.hash == "b");
        assert_eq!(kept[0].hash, "b");
    }

    #[test]
    fn trait_objects_are_filters() {
        let filter: Box<dyn CommitFilter> = Box::new(SubjectPrefixFilter::new("wip"));
        let kept = apply_filter(vec![commit("a", "wip: x"), commit("b", "done")], &*filter);
        assert_eq!(kept.len(), 1);
    }
}
