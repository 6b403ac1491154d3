use anyhow::Result;
use edge_consensus::core::{logging, Config, HealthChecker, ServiceMetrics};
use edge_consensus::profile::JsonFileProfileStore;
use edge_consensus::server;
use edge_consensus::trainer::{ModelTrainer, RandomForestTrainer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 Weight model server starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Profile store: {}", config.store.profile_store_path);

    let metrics = ServiceMetrics::new()?;
    let health = HealthChecker::new();

    let store = Arc::new(JsonFileProfileStore::new(&config.store.profile_store_path));
    let fitter = Arc::new(RandomForestTrainer::from_config(&config.trainer));
    let trainer = Arc::new(ModelTrainer::new(
        store,
        fitter,
        config.trainer.min_profiles,
        metrics,
        health,
    ));

    // Initial training; the server still starts untrained on failure
    match trainer.reload_and_train().await {
        Ok(Some(version)) => tracing::info!("✅ Startup training done (v{})", version),
        Ok(None) => tracing::warn!("⚠️  Serving untrained until enough profiles exist"),
        Err(e) => tracing::error!("❌ Startup training failed: {:#}", e),
    }

    server::serve(trainer, config.server.host, config.server.port).await;
    Ok(())
}
