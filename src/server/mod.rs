//! HTTP surface of the trainer service.
//!
//! - `GET  /weight-model`     current forest, or 503 `{"error": "Model not trained"}`
//! - `POST /trigger-retrain`  schedules a background reload-and-retrain
//! - `GET  /health`           component health
//! - `GET  /metrics`          Prometheus text exposition

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::forest::ModelDocument;
use crate::trainer::ModelTrainer;

#[derive(Debug, Clone, Deserialize)]
pub struct RetrainRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainResponse {
    pub status: String,
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn routes(
    trainer: Arc<ModelTrainer>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let weight_model = warp::path("weight-model")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_trainer(trainer.clone()))
        .and_then(get_weight_model);

    let trigger_retrain = warp::path("trigger-retrain")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_trainer(trainer.clone()))
        .and_then(post_trigger_retrain);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_trainer(trainer.clone()))
        .and_then(get_health);

    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_trainer(trainer))
        .and_then(get_metrics);

    weight_model.or(trigger_retrain).or(health).or(metrics)
}

pub async fn serve(trainer: Arc<ModelTrainer>, host: [u8; 4], port: u16) {
    tracing::info!("🌐 Weight model server listening on port {}", port);
    warp::serve(routes(trainer)).run((host, port)).await;
}

fn with_trainer(
    trainer: Arc<ModelTrainer>,
) -> impl Filter<Extract = (Arc<ModelTrainer>,), Error = Infallible> + Clone {
    warp::any().map(move || trainer.clone())
}

async fn get_weight_model(trainer: Arc<ModelTrainer>) -> Result<warp::reply::Response, Rejection> {
    match trainer.registry().current().await {
        Some(snapshot) => {
            let document = ModelDocument::from_forest(&snapshot.forest);
            Ok(warp::reply::json(&document).into_response())
        }
        None => Ok(warp::reply::with_status(
            warp::reply::json(&ErrorResponse {
                error: "Model not trained".to_string(),
            }),
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .into_response()),
    }
}

async fn post_trigger_retrain(
    request: RetrainRequest,
    trainer: Arc<ModelTrainer>,
) -> Result<impl Reply, Rejection> {
    tracing::info!("📨 Retrain requested after update by {}", request.user_id);
    trainer.trigger_retrain();

    Ok(warp::reply::json(&RetrainResponse {
        status: "ok".to_string(),
        msg: "Retraining started.".to_string(),
    }))
}

async fn get_health(trainer: Arc<ModelTrainer>) -> Result<impl Reply, Rejection> {
    let status = trainer.health().get_status().await;
    Ok(warp::reply::json(&status))
}

async fn get_metrics(trainer: Arc<ModelTrainer>) -> Result<warp::reply::Response, Rejection> {
    match trainer.metrics().render() {
        Ok(text) => Ok(warp::reply::with_header(
            text,
            "content-type",
            "text/plain; version=0.0.4",
        )
        .into_response()),
        Err(e) => {
            tracing::error!("❌ Failed to render metrics: {}", e);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
