use anyhow::Result;
use edge_consensus::core::{logging, Config, ServiceMetrics};
use edge_consensus::edge::{EdgeHost, LoggingActuator, ModelClient};
use edge_consensus::profile::JsonFileProfileStore;
use std::sync::Arc;

/// Runs one decision cycle for the identifiers given on the command line.
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_logging(&config.monitoring.log_level);

    let present: Vec<String> = std::env::args().skip(1).collect();
    if present.is_empty() {
        tracing::warn!("⚠️  No users present, nothing to decide");
        return Ok(());
    }

    let store = Arc::new(JsonFileProfileStore::new(&config.store.profile_store_path));
    let client = ModelClient::new(&config.edge)?;
    let host = EdgeHost::new(
        store,
        Some(client),
        Arc::new(LoggingActuator),
        ServiceMetrics::new()?,
    );

    host.refresh_model().await;
    let report = host.run_cycle(&present).await;

    tracing::info!(
        "🏁 Cycle {} finished with {} participants",
        report.cycle_id,
        report.participants.len()
    );
    Ok(())
}
