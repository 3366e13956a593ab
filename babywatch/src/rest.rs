use crate::model::StatusReport;
use crate::pipeline::Pipeline;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/", get(root))
        .route("/baby", get(get_baby))
        .route("/api/v1/status", get(get_status))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Baby monitor API – use /baby for live stats" }))
}

/// Plain-text status line. Never fails: degraded answers are still 200.
async fn get_baby(State(state): State<AppState>) -> String {
    state.pipeline.get_status().await.to_string()
}

async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.pipeline.get_status().await)
}
