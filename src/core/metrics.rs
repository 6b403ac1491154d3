use anyhow::Result;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Prometheus counters shared by the trainer service and the edge host.
#[derive(Clone)]
pub struct ServiceMetrics {
    registry: Registry,
    pub trainings_completed: IntCounter,
    pub trainings_skipped: IntCounter,
    pub retrains_triggered: IntCounter,
    pub model_fetch_failures: IntCounter,
    pub decision_cycles: IntCounter,
    pub decisions_skipped: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let trainings_completed = register_counter(
            &registry,
            "trainings_completed_total",
            "Training runs that published a new forest snapshot",
        )?;
        let trainings_skipped = register_counter(
            &registry,
            "trainings_skipped_total",
            "Training runs skipped for insufficient profile data",
        )?;
        let retrains_triggered = register_counter(
            &registry,
            "retrains_triggered_total",
            "Background retrains requested through the trigger endpoint",
        )?;
        let model_fetch_failures = register_counter(
            &registry,
            "model_fetch_failures_total",
            "Edge model refreshes that kept the previous snapshot",
        )?;
        let decision_cycles = register_counter(
            &registry,
            "decision_cycles_total",
            "Resolve-and-act cycles executed",
        )?;
        let decisions_skipped = register_counter(
            &registry,
            "decisions_skipped_total",
            "Cycles that emitted no decision because total weight was zero",
        )?;

        Ok(Self {
            registry,
            trainings_completed,
            trainings_skipped,
            retrains_triggered,
            model_fetch_failures,
            decision_cycles,
            decisions_skipped,
        })
    }

    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}
