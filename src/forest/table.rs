//! Flat node-table view of a trained ensemble.
//!
//! This is the shape a tree-fitting library hands back: parallel arrays
//! indexed by node id, root at index 0, with [`NO_FEATURE`] in the feature
//! column marking a leaf. The codec's encode side reads only this view.

/// Feature column value reserved for leaves.
pub const NO_FEATURE: i64 = -2;

/// Child column value used by leaves.
pub const NO_CHILD: i64 = -1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub value: Vec<f64>,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.feature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature.is_empty()
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.feature[node] == NO_FEATURE
    }

    pub fn push_leaf(&mut self, value: f64) -> usize {
        self.push(NO_FEATURE, 0.0, value)
    }

    /// Adds a split node with no children yet; wire them with
    /// [`set_children`](Self::set_children) once they exist. `value` is the
    /// mean target at this node, kept for parity with fitted tables.
    pub fn push_split(&mut self, feature: usize, threshold: f64, value: f64) -> usize {
        self.push(feature as i64, threshold, value)
    }

    pub fn set_children(&mut self, node: usize, left: usize, right: usize) {
        self.children_left[node] = left as i64;
        self.children_right[node] = right as i64;
    }

    fn push(&mut self, feature: i64, threshold: f64, value: f64) -> usize {
        let id = self.feature.len();
        self.feature.push(feature);
        self.threshold.push(threshold);
        self.children_left.push(NO_CHILD);
        self.children_right.push(NO_CHILD);
        self.value.push(value);
        id
    }

    /// Direct evaluation without going through the portable format.
    ///
    /// Follows the same `<=` goes left rule as the decoded tree. Returns `None`
    /// if the table is empty or a walk leaves the table (malformed input).
    pub fn evaluate(&self, features: &[f64]) -> Option<f64> {
        let mut node = 0usize;
        for _ in 0..=self.len() {
            if node >= self.len() {
                return None;
            }
            if self.is_leaf(node) {
                return Some(self.value[node]);
            }
            let feature = usize::try_from(self.feature[node]).ok()?;
            let next = if *features.get(feature)? <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
            node = usize::try_from(next).ok()?;
        }
        None
    }
}

/// A fitted ensemble exposing one node table per tree.
pub trait TrainedEnsemble {
    fn node_tables(&self) -> &[NodeTable];

    /// Unweighted mean of per-tree outputs, or `None` for an empty ensemble.
    fn predict(&self, features: &[f64]) -> Option<f64> {
        let tables = self.node_tables();
        if tables.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for table in tables {
            total += table.evaluate(features)?;
        }
        Some(total / tables.len() as f64)
    }
}

impl TrainedEnsemble for Vec<NodeTable> {
    fn node_tables(&self) -> &[NodeTable] {
        self
    }
}
