use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;

/// Database reachability and scheduler state.
pub(super) async fn health(State(ctx): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = ctx.db.clone();
    let database = match tokio::task::spawn_blocking(move || db.health_check()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(err) => Err(format!("health check task failed: {err}")),
    };
    let scheduler_running = ctx.scheduler_running().await;

    match database {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "scheduler_running": scheduler_running })),
        ),
        Err(message) => {
            warn!(error = %message, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": message })),
            )
        }
    }
}
