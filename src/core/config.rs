use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub trainer: TrainerConfig,
    pub edge: EdgeConfig,
    pub store: StoreConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: [u8; 4],
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainerConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub min_profiles: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    pub model_url: String,
    pub fetch_timeout_secs: u64,
    pub max_decode_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub profile_store_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_estimators: 15,
            max_depth: 6,
            seed: 42,
            min_profiles: 3,
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            model_url: "http://localhost:8000/weight-model".to_string(),
            fetch_timeout_secs: 5,
            max_decode_depth: 32,
        }
    }
}

impl EdgeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_host(raw: &str) -> Option<[u8; 4]> {
    let parts: Vec<u8> = raw
        .split('.')
        .map(|p| p.parse().ok())
        .collect::<Option<Vec<u8>>>()?;
    parts.try_into().ok()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let trainer_defaults = TrainerConfig::default();
        let edge_defaults = EdgeConfig::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST")
                    .ok()
                    .and_then(|h| parse_host(&h))
                    .unwrap_or([0, 0, 0, 0]),
                port: env_or("SERVER_PORT", 8000),
            },
            trainer: TrainerConfig {
                n_estimators: env_or("TRAINER_N_ESTIMATORS", trainer_defaults.n_estimators),
                max_depth: env_or("TRAINER_MAX_DEPTH", trainer_defaults.max_depth),
                seed: env_or("TRAINER_SEED", trainer_defaults.seed),
                min_profiles: env_or("TRAINER_MIN_PROFILES", trainer_defaults.min_profiles),
            },
            edge: EdgeConfig {
                model_url: env::var("MODEL_URL").unwrap_or(edge_defaults.model_url),
                fetch_timeout_secs: env_or(
                    "MODEL_FETCH_TIMEOUT_SECS",
                    edge_defaults.fetch_timeout_secs,
                ),
                max_decode_depth: env_or("MAX_DECODE_DEPTH", edge_defaults.max_decode_depth),
            },
            store: StoreConfig {
                profile_store_path: env::var("PROFILE_STORE_PATH")
                    .unwrap_or_else(|_| "users.json".to_string()),
            },
            monitoring: MonitoringConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host() {
        assert_eq!(parse_host("127.0.0.1"), Some([127, 0, 0, 1]));
        assert_eq!(parse_host("10.0.0"), None);
        assert_eq!(parse_host("localhost"), None);
    }

    #[test]
    fn test_trainer_defaults() {
        let trainer = TrainerConfig::default();
        assert_eq!(trainer.n_estimators, 15);
        assert_eq!(trainer.max_depth, 6);
        assert_eq!(trainer.min_profiles, 3);
    }
}
