use anyhow::Result;

use crate::consensus::EnvironmentDecision;

/// Applies a fused decision to the shared space.
pub trait Actuator: Send + Sync {
    fn apply(&self, decision: &EnvironmentDecision) -> Result<()>;
}

/// Reports decisions in the log instead of driving hardware.
#[derive(Debug, Default)]
pub struct LoggingActuator;

impl Actuator for LoggingActuator {
    fn apply(&self, decision: &EnvironmentDecision) -> Result<()> {
        tracing::info!(
            "▶ [FINAL DECISION] Temp: {:.1}°C / Hum: {} / Light: {}",
            decision.temperature,
            decision.humidity,
            decision.brightness
        );
        Ok(())
    }
}
