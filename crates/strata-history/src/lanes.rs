//! Lane layout for commit graphs.
//!
//! Commits are laid out newest first, one at a time, and every decision is
//! final once made. A renderer can therefore draw each row as soon as
//! [`LaneLayout::push`] returns it, without waiting for the rest of the
//! history.
//!
//! Rules applied to each commit:
//!
//! 1. Take the lane reserved for it by an earlier child, or else the lowest
//!    lane not in use.
//! 2. Its first parent continues in the same lane. If another child already
//!    reserved a lane for that parent, that reservation stands and this lane
//!    stays occupied until the parent shows up.
//! 3. Every further parent without a reservation gets the lowest free lane.
//! 4. A root commit releases its lane at once.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use strata_core::CommitRecord;
use tracing::debug;

/// What a renderer needs to draw one commit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneRow {
    /// Commit hash.
    pub hash: String,
    /// Lane holding the commit.
    pub lane: usize,
    /// Lane of each parent still to be drawn, in parent-list order.
    pub parent_lanes: Vec<usize>,
    /// Other lanes with a line passing through this row, ascending.
    pub passing_lanes: Vec<usize>,
}

/// Final lane of every commit laid out so far.
///
/// # Examples
///
/// ```
/// use strata_history::lanes::assign_lanes;
/// use strata_history::log::{parse_log, LogFormat};
///
/// let log = "m|m|merge|J||a f|\nf|f|feature|J||a|\na|a|base|J|||\n";
/// let commits = parse_log(log, &LogFormat::with_delimiter("|"));
/// let layout = assign_lanes(&commits);
///
/// assert_eq!(layout.lane_of("m"), Some(0));
/// assert_eq!(layout.lane_of("f"), Some(1));
/// assert_eq!(layout.lane_of("a"), Some(0));
/// assert_eq!(layout.lane_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneAssignment {
    /// Lane per commit hash.
    pub lanes: HashMap<String, usize>,
    /// Highest lane id used.
    pub max_lane: usize,
    /// One row per commit, in input order.
    pub rows: Vec<LaneRow>,
}

impl LaneAssignment {
    /// Lane of `hash`, if that commit was laid out.
    pub fn lane_of(&self, hash: &str) -> Option<usize> {
        self.lanes.get(hash).copied()
    }

    /// Number of columns needed to draw the graph.
    pub fn lane_count(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.max_lane + 1
        }
    }
}

/// Streaming lane layout state.
///
/// # Examples
///
/// ```
/// use strata_history::lanes::LaneLayout;
/// use strata_history::log::{parse_log, LogFormat};
///
/// let log = "b|b|second|J||a|\na|a|first|J|||\n";
/// let mut layout = LaneLayout::new();
/// for commit in parse_log(log, &LogFormat::with_delimiter("|")) {
///     let row = layout.push(&commit);
///     assert_eq!(row.lane, 0);
/// }
/// assert_eq!(layout.finish().lane_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LaneLayout {
    active: BTreeSet<usize>,
    reserved: HashMap<String, usize>,
    parked: HashMap<String, Vec<usize>>,
    assignment: LaneAssignment,
}

impl LaneLayout {
    /// An empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out the next commit and return its row.
    pub fn push(&mut self, commit: &CommitRecord) -> LaneRow {
        if let Some(lane) = self.assignment.lane_of(&commit.hash) {
            debug!(hash = %commit.hash, "commit laid out twice, keeping first lane");
            let row = LaneRow {
                hash: commit.hash.clone(),
                lane,
                parent_lanes: Vec::new(),
                passing_lanes: self.passing(lane),
            };
            self.assignment.rows.push(row.clone());
            return row;
        }

        let lane = match self.reserved.remove(&commit.hash) {
            Some(lane) => lane,
            None => self.lowest_free(),
        };
        self.occupy(lane);

        // Lines parked on this commit merge into it here.
        if let Some(waiting) = self.parked.remove(&commit.hash) {
            for other in waiting {
                if other != lane {
                    self.active.remove(&other);
                }
            }
        }
        self.assignment.lanes.insert(commit.hash.clone(), lane);
        let passing_lanes = self.passing(lane);

        let mut parent_lanes = Vec::with_capacity(commit.parents.len());
        let mut continues = false;
        for (i, parent) in commit.parents.iter().enumerate() {
            if self.assignment.lanes.contains_key(parent) {
                debug!(hash = %commit.hash, parent = %parent, "parent already laid out");
                continue;
            }

            if let Some(&claimed) = self.reserved.get(parent) {
                if i == 0 && claimed != lane {
                    self.parked.entry(parent.clone()).or_default().push(lane);
                }
                continues |= i == 0;
                parent_lanes.push(claimed);
            } else if i == 0 {
                self.reserved.insert(parent.clone(), lane);
                continues = true;
                parent_lanes.push(lane);
            } else {
                let branch = self.lowest_free();
                self.occupy(branch);
                self.reserved.insert(parent.clone(), branch);
                parent_lanes.push(branch);
            }
        }

        // Nothing continues below a root, or below a commit whose first parent was already drawn.
        if !continues {
            self.active.remove(&lane);
        }

        let row = LaneRow {
            hash: commit.hash.clone(),
            lane,
            parent_lanes,
            passing_lanes,
        };
        self.assignment.rows.push(row.clone());
        row
    }

    /// Snapshot of the layout so far.
    pub fn assignment(&self) -> &LaneAssignment {
        &self.assignment
    }

    /// Consume the layout and return the final assignment.
    pub fn finish(self) -> LaneAssignment {
        self.assignment
    }

    fn lowest_free(&self) -> usize {
        (0..).find(|l| !self.active.contains(l)).unwrap_or(0)
    }

    fn occupy(&mut self, lane: usize) {
        self.active.insert(lane);
        self.assignment.max_lane = self.assignment.max_lane.max(lane);
    }

    fn passing(&self, lane: usize) -> Vec<usize> {
        self.active.iter().copied().filter(|&l| l != lane).collect()
    }
}

/// Lay out `commits`, given newest first, in one pass.
pub fn assign_lanes(commits: &[CommitRecord]) -> LaneAssignment {
    let mut layout = LaneLayout::new();
    for commit in commits {
        layout.push(commit);
    }
    layout.finish()
}
