use serde::{Deserialize, Serialize};

use crate::squarify::WeightedNode;

/// A weighted hierarchy, usually a directory tree weighted by line count.
///
/// Leaves carry their own weight. Inner nodes built through
/// [`WeightedTree::node`] or [`WeightedTree::from_paths`] weigh the sum of
/// their children.
///
/// # Examples
///
/// ```
/// use strata_treemap::tree::WeightedTree;
///
/// let tree = WeightedTree::node(
///     "src",
///     vec![WeightedTree::leaf("src/lib.rs", 120.0), WeightedTree::leaf("src/main.rs", 30.0)],
/// );
/// assert_eq!(tree.weight, 150.0);
/// assert_eq!(tree.child_nodes()[1].id, "src/main.rs");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTree {
    pub id: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<WeightedTree>,
}

impl WeightedTree {
    pub fn leaf(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
            children: Vec::new(),
        }
    }

    /// An inner node weighing the sum of its children.
    pub fn node(id: impl Into<String>, children: Vec<WeightedTree>) -> Self {
        let weight = children.iter().map(|c| c.weight).sum();
        Self {
            id: id.into(),
            weight,
            children,
        }
    }

    /// Build a directory tree from `/`-separated paths.
    ///
    /// Every node's id is its path from the root (`src`, `src/lib.rs`), so ids
    /// are unique. Repeated paths add up. Children keep first-seen order.
    ///
    /// A path that is both an entry and a prefix of other entries (`a` and
    /// `a/b`) keeps its own weight on top of its children's, so an inner
    /// node can weigh more than its children. A path with no segments adds
    /// to the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_treemap::tree::WeightedTree;
    ///
    /// let tree = WeightedTree::from_paths(
    ///     ".",
    ///     [("src/a.rs", 10.0), ("src/b/c.rs", 5.0), ("README.md", 2.0)],
    /// );
    /// assert_eq!(tree.weight, 17.0);
    /// assert_eq!(tree.children[0].id, "src");
    /// assert_eq!(tree.children[0].children[1].id, "src/b");
    /// assert_eq!(tree.find("src/b/c.rs").map(|n| n.weight), Some(5.0));
    /// ```
    pub fn from_paths<I, P>(root_id: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (P, f64)>,
        P: AsRef<str>,
    {
        let mut root = Self::leaf(root_id, 0.0);
        for (path, weight) in entries {
            let parts: Vec<&str> = path
                .as_ref()
                .split('/')
                .filter(|p| !p.is_empty() && *p != ".")
                .collect();
            root.insert("", &parts, weight);
        }
        root.sum_children();
        root
    }

    fn insert(&mut self, prefix: &str, parts: &[&str], weight: f64) {
        let Some((head, rest)) = parts.split_first() else {
            self.weight += weight;
            return;
        };
        let id = if prefix.is_empty() {
            (*head).to_string()
        } else {
            format!("{prefix}/{head}")
        };

        let index = match self.children.iter().position(|c| c.id == id) {
            Some(index) => index,
            None => {
                self.children.push(Self::leaf(id.clone(), 0.0));
                self.children.len() - 1
            }
        };
        let child = &mut self.children[index];
        if rest.is_empty() {
            child.weight += weight;
        } else {
            child.insert(&id, rest, weight);
        }
    }

    fn sum_children(&mut self) {
        if self.children.is_empty() {
            return;
        }
        for child in &mut self.children {
            child.sum_children();
        }
        self.weight += self.children.iter().map(|c| c.weight).sum::<f64>();
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Last path segment of the id, for labels.
    pub fn name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// The direct children as layout input.
    pub fn child_nodes(&self) -> Vec<WeightedNode> {
        self.children
            .iter()
            .map(|c| WeightedNode::new(c.id.clone(), c.weight))
            .collect()
    }

    /// Depth-first search for the node with `id`.
    pub fn find(&self, id: &str) -> Option<&WeightedTree> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}
