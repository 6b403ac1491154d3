//! Portable decision forest: the node model, the codec that moves it between
//! trainer and edge, traversal, and the active-snapshot registry.

pub mod codec;
pub mod inference;
pub mod node;
pub mod registry;
pub mod table;

pub use codec::{ForestCodec, ModelDocument, ModelMetadata, DEFAULT_MAX_DECODE_DEPTH};
pub use node::{DecisionNode, Forest, Tree};
pub use registry::{ForestSnapshot, ModelRegistry, ModelState};
pub use table::{NodeTable, TrainedEnsemble, NO_FEATURE};
