use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::node::{DecisionNode, Forest, Tree};
use super::table::{NodeTable, TrainedEnsemble, NO_FEATURE};
use crate::core::error::{ConsensusError, MalformedReason, Result};

pub const MODEL_VERSION: &str = "v1.0";
pub const MODEL_LOGIC: &str = "Predicts User Sensitivity (Weight)";

/// Default bound on decoded tree depth. Well above any trainer depth in use,
/// well below anything that could exhaust the stack.
pub const DEFAULT_MAX_DECODE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub logic: String,
    pub features: Vec<String>,
}

/// Body of the read endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDocument<'a> {
    pub metadata: ModelMetadata,
    pub model_forest: &'a [Tree],
}

impl<'a> ModelDocument<'a> {
    pub fn from_forest(forest: &'a Forest) -> Self {
        Self {
            metadata: ModelMetadata {
                version: MODEL_VERSION.to_string(),
                logic: MODEL_LOGIC.to_string(),
                features: forest.feature_names().to_vec(),
            },
            model_forest: forest.trees(),
        }
    }
}

/// Trees stay untyped until the codec has walked and checked them.
#[derive(Debug, Deserialize)]
struct RawModelDocument {
    metadata: ModelMetadata,
    model_forest: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct ForestCodec {
    max_decode_depth: usize,
}

impl Default for ForestCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECODE_DEPTH)
    }
}

impl ForestCodec {
    pub fn new(max_decode_depth: usize) -> Self {
        Self { max_decode_depth }
    }

    pub fn max_decode_depth(&self) -> usize {
        self.max_decode_depth
    }

    // === ENCODE (trainer side) ===

    /// Converts every node table into a portable tree by recursive descent
    /// from the root. Zero tables yields zero trees ("not trained").
    pub fn encode<E>(&self, ensemble: &E, feature_names: &[String]) -> Result<Vec<Tree>>
    where
        E: TrainedEnsemble + ?Sized,
    {
        ensemble
            .node_tables()
            .iter()
            .enumerate()
            .map(|(tree_index, table)| {
                if table.is_empty() {
                    return Err(ConsensusError::InvalidNodeTable {
                        tree_index,
                        message: "empty node table".to_string(),
                    });
                }
                encode_node(table, 0, 0, feature_names, tree_index).map(Tree::new)
            })
            .collect()
    }

    /// Encodes and wraps the result as a servable forest.
    pub fn encode_forest<E>(&self, ensemble: &E, feature_names: &[String]) -> Result<Forest>
    where
        E: TrainedEnsemble + ?Sized,
    {
        let trees = self.encode(ensemble, feature_names)?;
        let depth_limit = trees.iter().map(Tree::depth).max().unwrap_or(0);
        Ok(Forest::from_parts(trees, feature_names.to_vec(), depth_limit))
    }

    // === DECODE (edge side) ===

    /// Parses a full model document and checks that its feature ordering has
    /// the length this device encodes.
    pub fn decode_document(&self, body: &str, expected_features: usize) -> Result<Forest> {
        let raw: RawModelDocument = serde_json::from_str(body).map_err(|e| {
            ConsensusError::malformed_document(MalformedReason::Structure(e.to_string()))
        })?;

        if raw.metadata.features.len() != expected_features {
            return Err(ConsensusError::malformed_document(
                MalformedReason::FeatureOrderingMismatch {
                    found: raw.metadata.features.len(),
                    expected: expected_features,
                },
            ));
        }

        self.decode(&raw.model_forest, raw.metadata.features)
    }

    /// Validates and builds each tree. Any single bad tree rejects the whole
    /// forest.
    pub fn decode(&self, model_forest: &[Value], feature_names: Vec<String>) -> Result<Forest> {
        let n_features = feature_names.len();
        let mut trees = Vec::with_capacity(model_forest.len());
        let mut depth_limit = 0;

        for (tree_index, raw) in model_forest.iter().enumerate() {
            let root = self
                .decode_node(raw, 0, &feature_names)
                .map_err(|reason| ConsensusError::malformed(tree_index, reason))?;
            let tree = Tree::new(root);
            depth_limit = depth_limit.max(tree.depth());
            trees.push(tree);
        }

        tracing::debug!(
            "🌲 Decoded forest: {} trees, {} features, depth {}",
            trees.len(),
            n_features,
            depth_limit
        );

        Ok(Forest::from_parts(trees, feature_names, depth_limit))
    }

    fn decode_node(
        &self,
        raw: &Value,
        depth: usize,
        feature_names: &[String],
    ) -> std::result::Result<DecisionNode, MalformedReason> {
        if depth > self.max_decode_depth {
            return Err(MalformedReason::DepthExceeded {
                limit: self.max_decode_depth,
            });
        }

        let node = raw
            .as_object()
            .ok_or_else(|| MalformedReason::Structure("node is not an object".to_string()))?;

        match node.get("type").and_then(Value::as_str) {
            Some("leaf") => Ok(DecisionNode::Leaf {
                value: finite_field(node, "value")?,
            }),
            Some("node") => {
                let raw_index = node
                    .get("feature_index")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        MalformedReason::Structure("missing integer feature_index".to_string())
                    })?;
                let feature_index = usize::try_from(raw_index)
                    .ok()
                    .filter(|index| *index < feature_names.len())
                    .ok_or(MalformedReason::FeatureIndexOutOfRange {
                        index: raw_index,
                        len: feature_names.len(),
                    })?;
                let threshold = finite_field(node, "threshold")?;
                let feature_name = node
                    .get("feature")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| feature_names[feature_index].clone());

                let left = self.decode_child(node, "left", depth, feature_names)?;
                let right = self.decode_child(node, "right", depth, feature_names)?;

                Ok(DecisionNode::Internal {
                    feature_name,
                    feature_index,
                    threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            Some(other) => Err(MalformedReason::Structure(format!(
                "unknown node type {:?}",
                other
            ))),
            None => Err(MalformedReason::Structure("missing node type".to_string())),
        }
    }

    fn decode_child(
        &self,
        node: &Map<String, Value>,
        side: &'static str,
        depth: usize,
        feature_names: &[String],
    ) -> std::result::Result<DecisionNode, MalformedReason> {
        let child = node
            .get(side)
            .ok_or_else(|| MalformedReason::Structure(format!("missing {} child", side)))?;
        self.decode_node(child, depth + 1, feature_names)
    }
}

fn finite_field(
    node: &Map<String, Value>,
    field: &'static str,
) -> std::result::Result<f64, MalformedReason> {
    node.get(field)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or(MalformedReason::NonFiniteNumber { field })
}

fn encode_node(
    table: &NodeTable,
    node: usize,
    depth: usize,
    feature_names: &[String],
    tree_index: usize,
) -> Result<DecisionNode> {
    let invalid = |message: String| ConsensusError::InvalidNodeTable {
        tree_index,
        message,
    };

    // A path longer than the table can only come from a cycle.
    if node >= table.len() || depth > table.len() {
        return Err(invalid(format!("node {} unreachable or cyclic", node)));
    }

    if table.feature[node] == NO_FEATURE {
        return Ok(DecisionNode::Leaf {
            value: table.value[node],
        });
    }

    let feature_index = usize::try_from(table.feature[node])
        .ok()
        .filter(|index| *index < feature_names.len())
        .ok_or_else(|| invalid(format!("feature {} out of range", table.feature[node])))?;

    let child = |raw: i64| {
        usize::try_from(raw).map_err(|_| invalid(format!("node {} has no child {}", node, raw)))
    };
    let left = child(table.children_left[node])?;
    let right = child(table.children_right[node])?;

    Ok(DecisionNode::Internal {
        feature_name: feature_names[feature_index].clone(),
        feature_index,
        threshold: table.threshold[node],
        left: Box::new(encode_node(table, left, depth + 1, feature_names, tree_index)?),
        right: Box::new(encode_node(table, right, depth + 1, feature_names, tree_index)?),
    })
}
