use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::PersonProfile;
use crate::core::ConsensusError;

/// Read-only access to person profiles keyed by identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Latest profile for `id`, or `None` if the store has no such record.
    async fn get_profile(&self, id: &str) -> Result<Option<PersonProfile>>;

    /// Every profile the store holds. Records that cannot be read as a
    /// profile at all are skipped.
    async fn list_profiles(&self) -> Result<Vec<PersonProfile>>;
}

#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<String, PersonProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = PersonProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            profiles: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn upsert(&self, profile: PersonProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, id: &str) -> Result<Option<PersonProfile>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<PersonProfile>> {
        let mut profiles: Vec<PersonProfile> = self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(profiles)
    }
}

/// Profiles kept as a JSON object of `{ "<id>": { ...record... } }`.
///
/// The file is re-read on every call so each decision cycle sees the latest
/// records.
#[derive(Debug, Clone)]
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load_records(&self) -> Result<serde_json::Map<String, Value>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read profile store {}", self.path.display()))?;

        match serde_json::from_str::<Value>(&body)
            .with_context(|| format!("Failed to parse profile store {}", self.path.display()))?
        {
            Value::Object(records) => Ok(records),
            _ => Err(ConsensusError::ProfileStore(format!(
                "{} is not a JSON object",
                self.path.display()
            ))
            .into()),
        }
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn get_profile(&self, id: &str) -> Result<Option<PersonProfile>> {
        let records = self.load_records().await?;
        Ok(records
            .get(id)
            .and_then(|record| PersonProfile::from_record(id, record)))
    }

    async fn list_profiles(&self) -> Result<Vec<PersonProfile>> {
        let records = self.load_records().await?;
        let total = records.len();

        let profiles: Vec<PersonProfile> = records
            .iter()
            .filter_map(|(id, record)| PersonProfile::from_record(id.as_str(), record))
            .collect();

        if profiles.len() < total {
            tracing::warn!(
                "⚠️  Skipped {} unreadable profile records",
                total - profiles.len()
            );
        }

        Ok(profiles)
    }
}
