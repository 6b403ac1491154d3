use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::actuator::Actuator;
use super::client::ModelClient;
use crate::consensus::{ConsensusResolver, EnvironmentDecision, WeightedTarget};
use crate::core::{ConsensusError, ServiceMetrics};
use crate::forest::ModelRegistry;
use crate::profile::{FeatureEncoder, ProfileStore};
use crate::weighting::{WeightAggregator, WeightBreakdown};

/// One person's contribution to a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantWeight {
    pub id: String,
    pub target_temperature: f64,
    pub weight: WeightBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub model_version: Option<u64>,
    pub participants: Vec<ParticipantWeight>,
    pub decision: Option<EnvironmentDecision>,
}

/// Edge decision loop for one shared space.
///
/// Holds the last good forest snapshot and the last applied decision. A
/// failed fetch, an unknown identifier or a store error degrades the cycle
/// but never aborts it.
pub struct EdgeHost {
    store: Arc<dyn ProfileStore>,
    registry: ModelRegistry,
    client: Option<ModelClient>,
    aggregator: WeightAggregator,
    actuator: Arc<dyn Actuator>,
    active: RwLock<Option<EnvironmentDecision>>,
    metrics: ServiceMetrics,
}

impl EdgeHost {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        client: Option<ModelClient>,
        actuator: Arc<dyn Actuator>,
        metrics: ServiceMetrics,
    ) -> Self {
        Self {
            store,
            registry: ModelRegistry::new(),
            client,
            aggregator: WeightAggregator::new(),
            actuator,
            active: RwLock::new(None),
            metrics,
        }
    }

    pub fn with_aggregator(mut self, aggregator: WeightAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn active_decision(&self) -> Option<EnvironmentDecision> {
        *self.active.read().await
    }

    /// Pulls the trainer's current forest. On any failure the previous
    /// snapshot (or the untrained state) stays in place.
    pub async fn refresh_model(&self) -> bool {
        let Some(client) = &self.client else {
            tracing::debug!("No model client configured, skipping refresh");
            return false;
        };

        match client.fetch().await {
            Ok(forest) => match self.registry.publish(forest).await {
                Some(version) => {
                    tracing::info!("✅ AI model loaded (snapshot v{})", version);
                    true
                }
                None => {
                    self.metrics.model_fetch_failures.inc();
                    tracing::warn!("⚠️  Fetched forest has no trees, keeping last snapshot");
                    false
                }
            },
            Err(e) => {
                self.metrics.model_fetch_failures.inc();
                tracing::warn!("⚠️  Model refresh failed, keeping last snapshot: {}", e);
                false
            }
        }
    }

    /// Runs one resolve-and-act cycle for the people currently present.
    pub async fn run_cycle(&self, present: &[String]) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        self.metrics.decision_cycles.inc();

        let snapshot = self.registry.current().await;
        let model_version = snapshot.as_ref().map(|s| s.version);
        if snapshot.is_none() {
            tracing::warn!(
                "⚠️  {}, using fallback prediction for everyone",
                ConsensusError::ModelUnavailable
            );
        }

        tracing::info!("--- Optimizing for users: {:?} ---", present);

        let mut participants = Vec::with_capacity(present.len());
        let mut targets = Vec::with_capacity(present.len());

        for id in present {
            let profile = match self.store.get_profile(id).await {
                Ok(Some(profile)) => profile,
                Ok(None) => {
                    tracing::debug!("User {} not found, skipping", id);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("⚠️  Failed to load user {}: {:#}", id, e);
                    continue;
                }
            };

            let features = FeatureEncoder::encode(&profile);
            let prediction = snapshot
                .as_ref()
                .and_then(|s| s.forest.predict(features.as_slice()));
            let weight = self.aggregator.final_weight(&profile, prediction);

            tracing::info!(
                " > User[{}] Target:{} | Weight: {:.2} (AI:{:.2} + Time:{:.2})",
                id,
                profile.preferences.temperature,
                weight.final_weight,
                weight.ai_prediction,
                weight.recency_bonus
            );

            targets.push(WeightedTarget::new(profile.preferences, weight.final_weight));
            participants.push(ParticipantWeight {
                id: id.clone(),
                target_temperature: profile.preferences.temperature,
                weight,
            });
        }

        let decision = ConsensusResolver::resolve(&targets);
        match decision {
            Some(decision) => self.apply(decision).await,
            None => {
                self.metrics.decisions_skipped.inc();
                tracing::info!("⏸️  No decision this cycle, keeping current environment");
            }
        }

        CycleReport {
            cycle_id,
            model_version,
            participants,
            decision,
        }
    }

    async fn apply(&self, decision: EnvironmentDecision) {
        match self.actuator.apply(&decision) {
            Ok(()) => {
                *self.active.write().await = Some(decision);
            }
            Err(e) => {
                tracing::error!("❌ Actuation failed, active state unchanged: {:#}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{ForestCodec, NodeTable};
    use crate::profile::store::MockProfileStore;
    use crate::profile::{feature_names, EnvironmentPreference, PersonProfile};
    use crate::weighting::parse_timestamp;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    const NOW: &str = "202510191230";

    #[derive(Default)]
    struct RecordingActuator {
        applied: Mutex<Vec<EnvironmentDecision>>,
    }

    impl Actuator for RecordingActuator {
        fn apply(&self, decision: &EnvironmentDecision) -> anyhow::Result<()> {
            self.applied.lock().unwrap().push(*decision);
            Ok(())
        }
    }

    struct FailingActuator;

    impl Actuator for FailingActuator {
        fn apply(&self, _decision: &EnvironmentDecision) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("relay offline"))
        }
    }

    fn person(id: &str, temperature: f64) -> PersonProfile {
        PersonProfile::new(id, "ISFP")
            .with_updated_at(NOW)
            .with_preferences(EnvironmentPreference {
                temperature,
                humidity: 3.0,
                brightness: 5.0,
            })
    }

    fn host(store: MockProfileStore, actuator: Arc<dyn Actuator>) -> EdgeHost {
        EdgeHost::new(Arc::new(store), None, actuator, ServiceMetrics::new().unwrap())
            .with_aggregator(WeightAggregator::at(parse_timestamp(NOW).unwrap()))
    }

    fn constant_forest(value: f64) -> crate::forest::Forest {
        let mut table = NodeTable::new();
        table.push_leaf(value);
        ForestCodec::default()
            .encode_forest(&vec![table], &feature_names())
            .unwrap()
    }

    #[tokio::test]
    async fn test_untrained_cycle_uses_fallback() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .with(eq("a"))
            .returning(|_| Ok(Some(person("a", 20.0))));
        store
            .expect_get_profile()
            .with(eq("b"))
            .returning(|_| Ok(Some(person("b", 26.0))));

        let actuator = Arc::new(RecordingActuator::default());
        let host = host(store, actuator.clone());

        let report = host.run_cycle(&["a".to_string(), "b".to_string()]).await;
        assert_eq!(report.model_version, None);
        assert_eq!(report.participants.len(), 2);
        for p in &report.participants {
            assert_eq!(p.weight.ai_prediction, 1.0);
            assert!(p.weight.used_fallback);
            assert!((p.weight.final_weight - 4.0).abs() < 1e-9);
        }

        let decision = report.decision.unwrap();
        assert_eq!(decision.temperature, 23.0);
        assert_eq!(actuator.applied.lock().unwrap().len(), 1);
        assert_eq!(host.active_decision().await, Some(decision));
    }

    #[tokio::test]
    async fn test_trained_cycle_uses_forest() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .returning(|id| Ok(Some(person(id, 22.0))));

        let host = host(store, Arc::new(RecordingActuator::default()));
        host.registry().publish(constant_forest(2.5)).await;

        let report = host.run_cycle(&["x".to_string()]).await;
        assert_eq!(report.model_version, Some(1));
        let weight = report.participants[0].weight;
        assert_eq!(weight.ai_prediction, 2.5);
        assert!((weight.final_weight - 5.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_and_failing_users_are_skipped() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .with(eq("ghost"))
            .returning(|_| Ok(None));
        store
            .expect_get_profile()
            .with(eq("broken"))
            .returning(|_| Err(anyhow::anyhow!("store timeout")));
        store
            .expect_get_profile()
            .with(eq("ok"))
            .returning(|_| Ok(Some(person("ok", 21.0))));

        let host = host(store, Arc::new(RecordingActuator::default()));
        let report = host
            .run_cycle(&["ghost".to_string(), "broken".to_string(), "ok".to_string()])
            .await;

        assert_eq!(report.participants.len(), 1);
        assert_eq!(report.decision.unwrap().temperature, 21.0);
    }

    #[tokio::test]
    async fn test_no_decision_retains_previous_state() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .with(eq("a"))
            .returning(|_| Ok(Some(person("a", 25.0))));
        store.expect_get_profile().with(eq("gone")).returning(|_| Ok(None));

        let host = host(store, Arc::new(RecordingActuator::default()));
        let first = host.run_cycle(&["a".to_string()]).await.decision;
        assert!(first.is_some());

        let second = host.run_cycle(&["gone".to_string()]).await;
        assert_eq!(second.decision, None);
        assert_eq!(host.active_decision().await, first);

        let empty = host.run_cycle(&[]).await;
        assert_eq!(empty.decision, None);
        assert_eq!(host.active_decision().await, first);
    }

    #[tokio::test]
    async fn test_failed_actuation_keeps_state() {
        let mut store = MockProfileStore::new();
        store
            .expect_get_profile()
            .returning(|id| Ok(Some(person(id, 25.0))));

        let host = host(store, Arc::new(FailingActuator));
        let report = host.run_cycle(&["a".to_string()]).await;
        assert!(report.decision.is_some());
        assert_eq!(host.active_decision().await, None);
    }

    #[tokio::test]
    async fn test_refresh_without_client_stays_untrained() {
        let host = host(MockProfileStore::new(), Arc::new(RecordingActuator::default()));
        assert!(!host.refresh_model().await);
        assert!(host.registry().current().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_fetched_forest_keeps_snapshot() {
        use warp::Filter;

        let body = serde_json::json!({
            "metadata": {
                "version": "v1.0",
                "logic": "Predicts User Sensitivity (Weight)",
                "features": feature_names(),
            },
            "model_forest": [],
        });
        let route = warp::path("weight-model").map(move || warp::reply::json(&body));
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let config = crate::core::config::EdgeConfig {
            model_url: format!("http://{}/weight-model", addr),
            ..Default::default()
        };
        let client = ModelClient::new(&config).unwrap();
        let host = EdgeHost::new(
            Arc::new(MockProfileStore::new()),
            Some(client),
            Arc::new(RecordingActuator::default()),
            ServiceMetrics::new().unwrap(),
        );
        host.registry().publish(constant_forest(1.5)).await;

        assert!(!host.refresh_model().await);
        assert_eq!(host.registry().current().await.unwrap().version, 1);
        assert_eq!(host.metrics.model_fetch_failures.get(), 1);
    }
}
