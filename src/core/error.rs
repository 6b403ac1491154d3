use thiserror::Error;

/// Why a decoded tree was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedReason {
    #[error("invalid structure: {0}")]
    Structure(String),

    #[error("feature index {index} out of range for {len} features")]
    FeatureIndexOutOfRange { index: i64, len: usize },

    #[error("non-finite {field}")]
    NonFiniteNumber { field: &'static str },

    #[error("depth exceeds safety bound of {limit}")]
    DepthExceeded { limit: usize },

    #[error("feature ordering has {found} names, expected {expected}")]
    FeatureOrderingMismatch { found: usize, expected: usize },
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Structurally invalid forest. Fatal to that decode only; `tree_index`
    /// is `None` when the document envelope itself is at fault.
    #[error("malformed tree{}: {reason}", describe_index(.tree_index))]
    MalformedTree {
        tree_index: Option<usize>,
        reason: MalformedReason,
    },

    #[error("invalid node table for tree #{tree_index}: {message}")]
    InvalidNodeTable { tree_index: usize, message: String },

    #[error("insufficient training data: {found} valid profiles, need at least {required}")]
    InsufficientTrainingData { found: usize, required: usize },

    #[error("no model snapshot available")]
    ModelUnavailable,

    #[error("model fetch failed: {0}")]
    NetworkFetchFailure(String),

    #[error("profile store error: {0}")]
    ProfileStore(String),
}

impl ConsensusError {
    pub fn malformed(tree_index: usize, reason: MalformedReason) -> Self {
        ConsensusError::MalformedTree {
            tree_index: Some(tree_index),
            reason,
        }
    }

    pub fn malformed_document(reason: MalformedReason) -> Self {
        ConsensusError::MalformedTree {
            tree_index: None,
            reason,
        }
    }
}

fn describe_index(tree_index: &Option<usize>) -> String {
    match tree_index {
        Some(index) => format!(" #{}", index),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
