pub mod aggregator;
pub mod recency;

pub use aggregator::{stress_bonus, WeightAggregator, WeightBreakdown, FALLBACK_PREDICTION};
pub use recency::{hours_elapsed, parse_timestamp, recency_bonus, STALE_HOURS};
