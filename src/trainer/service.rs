use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::fitter::EnsembleTrainer;
use crate::core::{ConsensusError, HealthChecker, ServiceMetrics};
use crate::forest::{ForestCodec, ModelRegistry};
use crate::profile::{feature_names, FeatureEncoder, PersonProfile, ProfileStore};
use crate::weighting::WeightAggregator;

/// Trainer side of the system: turns the profile collection into a published
/// forest snapshot, on startup and on every retrain trigger.
pub struct ModelTrainer {
    store: Arc<dyn ProfileStore>,
    trainer: Arc<dyn EnsembleTrainer>,
    registry: ModelRegistry,
    codec: ForestCodec,
    aggregator: WeightAggregator,
    min_profiles: usize,
    metrics: ServiceMetrics,
    health: HealthChecker,
    retrain_lock: Mutex<()>,
}

impl ModelTrainer {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        trainer: Arc<dyn EnsembleTrainer>,
        min_profiles: usize,
        metrics: ServiceMetrics,
        health: HealthChecker,
    ) -> Self {
        Self {
            store,
            trainer,
            registry: ModelRegistry::new(),
            codec: ForestCodec::default(),
            aggregator: WeightAggregator::new(),
            min_profiles,
            metrics,
            health,
            retrain_lock: Mutex::new(()),
        }
    }

    /// Pins the clock used for label generation.
    pub fn with_aggregator(mut self, aggregator: WeightAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn health(&self) -> &HealthChecker {
        &self.health
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    /// Feature rows and `1 + recency + stress` labels, one per profile.
    pub fn training_set(&self, profiles: &[PersonProfile]) -> (Vec<Vec<f64>>, Vec<f64>) {
        profiles
            .iter()
            .map(|profile| {
                let features = FeatureEncoder::encode(profile).as_slice().to_vec();
                (features, self.aggregator.training_label(profile))
            })
            .unzip()
    }

    /// Fits, encodes and publishes. Fails with
    /// [`ConsensusError::InsufficientTrainingData`] below the minimum profile
    /// count, leaving the current snapshot in place.
    pub async fn train_on(&self, profiles: &[PersonProfile]) -> Result<u64> {
        if profiles.len() < self.min_profiles {
            return Err(ConsensusError::InsufficientTrainingData {
                found: profiles.len(),
                required: self.min_profiles,
            }
            .into());
        }

        let (samples, labels) = self.training_set(profiles);
        let trainer = self.trainer.clone();
        let ensemble = tokio::task::spawn_blocking(move || trainer.fit(&samples, &labels))
            .await
            .context("Training task panicked")??;

        let forest = self.codec.encode_forest(ensemble.as_ref(), &feature_names())?;
        let version = self
            .registry
            .publish(forest)
            .await
            .ok_or(ConsensusError::ModelUnavailable)?;

        self.metrics.trainings_completed.inc();
        self.health.update_component("model", true).await;
        tracing::info!("✅ Model trained with {} users (snapshot v{})", profiles.len(), version);

        Ok(version)
    }

    /// Reloads every profile from the store and retrains. Too little data is
    /// not an error here: it is logged and `Ok(None)` is returned.
    pub async fn reload_and_train(&self) -> Result<Option<u64>> {
        let _guard = self.retrain_lock.lock().await;

        let profiles = match self.store.list_profiles().await {
            Ok(profiles) => {
                self.health.update_component("profile_store", true).await;
                profiles
            }
            Err(e) => {
                self.health.update_component("profile_store", false).await;
                return Err(e.context("Failed to load profiles for training"));
            }
        };

        match self.train_on(&profiles).await {
            Ok(version) => Ok(Some(version)),
            Err(e) => match e.downcast_ref::<ConsensusError>() {
                Some(ConsensusError::InsufficientTrainingData { found, .. }) => {
                    self.metrics.trainings_skipped.inc();
                    tracing::warn!("⚠️  Not enough data ({}). Skip training.", found);
                    Ok(None)
                }
                _ => Err(e),
            },
        }
    }

    /// Schedules [`reload_and_train`](Self::reload_and_train) in the
    /// background and returns at once. Overlapping triggers queue on the
    /// retrain lock, so retrains never run concurrently.
    pub fn trigger_retrain(self: &Arc<Self>) {
        self.metrics.retrains_triggered.inc();
        let trainer = Arc::clone(self);
        tokio::spawn(async move {
            match trainer.reload_and_train().await {
                Ok(Some(version)) => tracing::info!("🔄 DB reloaded & retrained (v{})", version),
                Ok(None) => tracing::info!("🔄 DB reloaded, previous snapshot kept"),
                Err(e) => tracing::error!("❌ Retrain error: {:#}", e),
            }
        });
    }
}
