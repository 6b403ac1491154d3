pub mod features;
pub mod store;
pub mod types;

pub use features::{feature_names, FeatureEncoder, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use store::{InMemoryProfileStore, JsonFileProfileStore, ProfileStore};
pub use types::{EnvironmentPreference, PersonProfile};
