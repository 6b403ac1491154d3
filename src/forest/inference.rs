use super::node::{DecisionNode, Forest, Tree};

impl Tree {
    /// Walks from the root to a leaf: `features[i] <= threshold` goes left,
    /// anything else (including NaN) goes right.
    ///
    /// Iterative, so the walk costs no stack regardless of depth; decoded
    /// trees are already bounded by the codec's depth limit.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut node = self.root();
        loop {
            match node {
                DecisionNode::Leaf { value } => return *value,
                DecisionNode::Internal {
                    feature_index,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if features[*feature_index] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }
}

impl Forest {
    /// Arithmetic mean of every tree's output, or `None` for an empty
    /// (untrained) forest.
    ///
    /// # Panics
    ///
    /// If `features` does not match the forest's feature ordering length.
    /// Callers build vectors with the feature encoder, so a mismatch is a
    /// programming error rather than bad input.
    pub fn predict(&self, features: &[f64]) -> Option<f64> {
        assert_eq!(
            features.len(),
            self.n_features(),
            "feature vector length does not match forest feature ordering"
        );

        if self.is_empty() {
            return None;
        }

        let total: f64 = self.trees().iter().map(|tree| tree.evaluate(features)).sum();
        Some(total / self.len() as f64)
    }
}
