// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::sync::{SyncError, SyncJob, Trigger};

#[derive(Clone)]
pub struct AppState {
    pub job: Arc<SyncJob>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(job: Arc<SyncJob>) -> Self {
        Self {
            job,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync", post(trigger_sync))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
    timestamp: String,
    version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    Json(HealthResp {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        version: state.version,
    })
}

async fn trigger_sync(State(state): State<AppState>) -> impl IntoResponse {
    info!("starting manual sync");
    // The run owns its own task: a client that hangs up drops this handler
    // future, never the batch.
    let job = state.job.clone();
    let outcome = tokio::spawn(async move { job.run(Trigger::Manual).await }).await;
    let run = match outcome {
        Ok(run) => run,
        Err(join_err) => {
            let message = format!("sync task aborted: {join_err}");
            error!(error = %message, "manual sync failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": message })),
            );
        }
    };
    match run {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Sync completed successfully",
                "result": result,
            })),
        ),
        Err(e @ SyncError::AlreadyRunning) => (
            StatusCode::CONFLICT,
            Json(json!({ "success": false, "error": e.to_string() })),
        ),
        Err(SyncError::Fetch(e)) => {
            let message = format!("{e:#}");
            error!(error = %message, "sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": message })),
            )
        }
    }
}
