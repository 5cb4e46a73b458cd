//! HTTP endpoint serving a model's predictions

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::model::{Model, ModelOutput};

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn model_router(model: Arc<dyn Model>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(model)
}

/// Serve `model` until the process is stopped
pub async fn run_http_server(model: Arc<dyn Model>, server: &ServerConfig) -> Result<()> {
    let addr = server.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Model server listening on http://{}", addr);
    axum::serve(listener, model_router(model)).await?;
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn predict_handler(
    State(model): State<Arc<dyn Model>>,
    body: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<ModelOutput>> {
    let Json(body) = body?;
    Ok(Json(model.predict(&body.query).await?))
}
