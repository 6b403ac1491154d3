use anyhow::Result;
use reqwest::Client;

use crate::core::config::EdgeConfig;
use crate::core::ConsensusError;
use crate::forest::{Forest, ForestCodec};
use crate::profile::FEATURE_COUNT;

/// Fetches and decodes the trainer's current forest.
///
/// Every request is bounded by the configured timeout; a slow or dead
/// trainer costs the edge at most that long.
pub struct ModelClient {
    client: Client,
    url: String,
    codec: ForestCodec,
}

impl ModelClient {
    pub fn new(config: &EdgeConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.fetch_timeout()).build()?;

        Ok(Self {
            client,
            url: config.model_url.clone(),
            codec: ForestCodec::new(config.max_decode_depth),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> std::result::Result<Forest, ConsensusError> {
        tracing::info!("📡 Fetching model from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ConsensusError::NetworkFetchFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsensusError::NetworkFetchFailure(format!(
                "server returned {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConsensusError::NetworkFetchFailure(e.to_string()))?;

        self.codec.decode_document(&body, FEATURE_COUNT)
    }
}
