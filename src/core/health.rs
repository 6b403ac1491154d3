use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub profile_store: bool,
    pub model: bool,
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    status: Arc<RwLock<ComponentHealth>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            status: Arc::new(RwLock::new(ComponentHealth {
                profile_store: false,
                model: false,
            })),
        }
    }

    /// An untrained service is still "degraded" rather than down: it answers
    /// every request, it just has no model to hand out.
    pub async fn get_status(&self) -> HealthStatus {
        let components = self.status.read().await.clone();

        HealthStatus {
            status: if components.profile_store && components.model {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    pub async fn update_component(&self, component: &str, healthy: bool) {
        let mut status = self.status.write().await;
        match component {
            "profile_store" => status.profile_store = healthy,
            "model" => status.model = healthy,
            other => tracing::warn!("⚠️  Unknown health component {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_degraded_until_model_ready() {
        let checker = HealthChecker::new();
        checker.update_component("profile_store", true).await;
        assert_eq!(checker.get_status().await.status, "degraded");

        checker.update_component("model", true).await;
        let status = checker.get_status().await;
        assert_eq!(status.status, "healthy");
        assert!(status.components.model);
    }

    #[tokio::test]
    async fn test_unknown_component_is_ignored() {
        let checker = HealthChecker::new();
        checker.update_component("actuator", true).await;
        let status = checker.get_status().await;
        assert!(!status.components.profile_store);
        assert!(!status.components.model);
        assert_eq!(status.status, "degraded");
    }
}
