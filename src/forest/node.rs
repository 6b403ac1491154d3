use serde::Serialize;

/// One node of a portable decision tree.
///
/// Serializes to the wire format: an internally tagged object with
/// `"type": "leaf"` or `"type": "node"`. Children are boxed and owned by
/// their parent, so a tree can never share or cycle. Decoding goes through
/// [`ForestCodec`](super::ForestCodec), which validates as it builds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DecisionNode {
    #[serde(rename = "leaf")]
    Leaf { value: f64 },

    #[serde(rename = "node")]
    Internal {
        #[serde(rename = "feature")]
        feature_name: String,
        feature_index: usize,
        threshold: f64,
        left: Box<DecisionNode>,
        right: Box<DecisionNode>,
    },
}

impl DecisionNode {
    pub fn leaf(value: f64) -> Self {
        DecisionNode::Leaf { value }
    }

    pub fn internal(
        feature_name: impl Into<String>,
        feature_index: usize,
        threshold: f64,
        left: DecisionNode,
        right: DecisionNode,
    ) -> Self {
        DecisionNode::Internal {
            feature_name: feature_name.into(),
            feature_index,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, DecisionNode::Leaf { .. })
    }
}

/// A single tree: one root node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tree {
    root: DecisionNode,
}

impl Tree {
    pub fn new(root: DecisionNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &DecisionNode {
        &self.root
    }

    /// Number of internal nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                DecisionNode::Leaf { .. } => deepest = deepest.max(depth),
                DecisionNode::Internal { left, right, .. } => {
                    stack.push((left.as_ref(), depth + 1));
                    stack.push((right.as_ref(), depth + 1));
                }
            }
        }
        deepest
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&DecisionNode> = vec![&self.root];
        while let Some(node) = stack.pop() {
            count += 1;
            if let DecisionNode::Internal { left, right, .. } = node {
                stack.push(left.as_ref());
                stack.push(right.as_ref());
            }
        }
        count
    }
}

/// An ordered ensemble of trees over one feature ordering.
///
/// Immutable once built. A published forest is only ever replaced, never
/// edited, so it can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    depth_limit: usize,
}

impl Forest {
    pub(crate) fn from_parts(trees: Vec<Tree>, feature_names: Vec<String>, depth_limit: usize) -> Self {
        Self {
            trees,
            feature_names,
            depth_limit,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Upper bound on steps any traversal of this forest can take.
    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }
}
