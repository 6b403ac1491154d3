use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::node::Forest;

/// One published, immutable forest version.
#[derive(Debug)]
pub struct ForestSnapshot {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub forest: Forest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelState {
    Untrained,
    Trained { version: u64 },
}

/// Holds the currently active forest.
///
/// Readers take a cloned `Arc` and traverse with no lock held; `publish`
/// swaps in a brand-new snapshot, and the old one is dropped when its last
/// reader finishes. There is no way back to `Untrained`.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    current: Arc<RwLock<Option<Arc<ForestSnapshot>>>>,
    next_version: Arc<AtomicU64>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `forest` as the active snapshot and returns its version.
    /// An empty forest is refused and the previous state is kept.
    pub async fn publish(&self, forest: Forest) -> Option<u64> {
        if forest.is_empty() {
            tracing::warn!("⚠️  Refusing to publish an empty forest, keeping current snapshot");
            return None;
        }

        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(ForestSnapshot {
            version,
            published_at: Utc::now(),
            forest,
        });

        let trees = snapshot.forest.len();
        *self.current.write().await = Some(snapshot);

        tracing::info!("📦 Forest snapshot v{} published ({} trees)", version, trees);
        Some(version)
    }

    pub async fn current(&self) -> Option<Arc<ForestSnapshot>> {
        self.current.read().await.clone()
    }

    pub async fn state(&self) -> ModelState {
        match self.current.read().await.as_ref() {
            Some(snapshot) => ModelState::Trained {
                version: snapshot.version,
            },
            None => ModelState::Untrained,
        }
    }
}
