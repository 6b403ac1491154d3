use serde::{Deserialize, Serialize};

use crate::profile::EnvironmentPreference;

/// One person's targets for this cycle plus how much they count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedTarget {
    pub target: EnvironmentPreference,
    pub weight: f64,
}

impl WeightedTarget {
    pub fn new(target: EnvironmentPreference, weight: f64) -> Self {
        Self { target, weight }
    }
}

/// The single fused setting for the shared space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDecision {
    /// Degrees, one decimal place.
    pub temperature: f64,
    pub humidity: i64,
    pub brightness: i64,
}

pub struct ConsensusResolver;

impl ConsensusResolver {
    /// Weighted mean per channel. `None` when the total weight is zero (or
    /// not finite), in which case the caller keeps its current state.
    pub fn resolve(targets: &[WeightedTarget]) -> Option<EnvironmentDecision> {
        let mut total_weight = 0.0;
        let mut temperature = 0.0;
        let mut humidity = 0.0;
        let mut brightness = 0.0;

        for t in targets {
            total_weight += t.weight;
            temperature += t.target.temperature * t.weight;
            humidity += t.target.humidity * t.weight;
            brightness += t.target.brightness * t.weight;
        }

        if total_weight == 0.0 || !total_weight.is_finite() {
            return None;
        }

        Some(EnvironmentDecision {
            temperature: round_to_tenth(temperature / total_weight),
            humidity: round_to_integer(humidity / total_weight),
            brightness: round_to_integer(brightness / total_weight),
        })
    }
}

/// Rounds the exact binary value to one decimal, ties to even. Scaling by
/// ten first would manufacture ties (21.85 is really 21.850000000000001...).
fn round_to_tenth(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

fn round_to_integer(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(temperature: f64, humidity: f64, brightness: f64, weight: f64) -> WeightedTarget {
        WeightedTarget::new(
            EnvironmentPreference {
                temperature,
                humidity,
                brightness,
            },
            weight,
        )
    }

    #[test]
    fn test_weighted_temperature() {
        let targets = [
            target(20.0, 3.0, 5.0, 2.0),
            target(24.0, 3.0, 5.0, 2.0),
            target(26.0, 3.0, 5.0, 4.0),
        ];
        let decision = ConsensusResolver::resolve(&targets).unwrap();
        assert_eq!(decision.temperature, 24.0);
        assert_eq!(decision.humidity, 3);
        assert_eq!(decision.brightness, 5);
    }

    #[test]
    fn test_equal_weights_reduce_to_mean() {
        let targets = [
            target(21.0, 2.0, 4.0, 1.7),
            target(23.0, 4.0, 8.0, 1.7),
            target(25.6, 3.0, 6.0, 1.7),
        ];
        let decision = ConsensusResolver::resolve(&targets).unwrap();
        assert_eq!(decision.temperature, 23.2);
        assert_eq!(decision.humidity, 3);
        assert_eq!(decision.brightness, 6);
    }

    #[test]
    fn test_zero_total_weight_emits_nothing() {
        assert_eq!(ConsensusResolver::resolve(&[]), None);
        assert_eq!(ConsensusResolver::resolve(&[target(20.0, 1.0, 1.0, 0.0)]), None);
    }

    #[test]
    fn test_rounding() {
        let decision = ConsensusResolver::resolve(&[
            target(22.0, 2.0, 4.0, 3.0),
            target(23.0, 3.0, 5.0, 1.0),
        ])
        .unwrap();
        // 22.25 / 2.25 / 4.25
        assert_eq!(decision.temperature, 22.2);
        assert_eq!(decision.humidity, 2);
        assert_eq!(decision.brightness, 4);
    }

    #[test]
    fn test_tenth_rounding_uses_exact_value() {
        assert_eq!(round_to_tenth(21.85), 21.9);
        assert_eq!(round_to_tenth(23.15), 23.1);
        assert_eq!(round_to_tenth(22.25), 22.2);

        let decision = ConsensusResolver::resolve(&[target(21.85, 3.0, 5.0, 1.0)]).unwrap();
        assert_eq!(decision.temperature, 21.9);
    }

    #[test]
    fn test_single_person_gets_their_preference() {
        let decision = ConsensusResolver::resolve(&[target(19.5, 1.0, 9.0, 0.0003)]).unwrap();
        assert_eq!(decision.temperature, 19.5);
        assert_eq!(decision.humidity, 1);
        assert_eq!(decision.brightness, 9);
    }
}
