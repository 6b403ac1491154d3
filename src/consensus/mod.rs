pub mod resolver;

pub use resolver::{ConsensusResolver, EnvironmentDecision, WeightedTarget};
