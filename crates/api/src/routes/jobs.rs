//! Batch job triggers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use leadsync_core::{run_calendar_import, run_stale_leads};
use leadsync_domain::JobResult;
use tracing::info;

use super::AppState;

fn respond(result: JobResult) -> (StatusCode, Json<JobResult>) {
    let status =
        StatusCode::from_u16(result.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(result))
}

pub(super) async fn import_calendar(State(ctx): State<AppState>) -> (StatusCode, Json<JobResult>) {
    info!("calendar import job triggered");
    let window = ctx.default_import_window();
    respond(run_calendar_import(&ctx.connections, &ctx.reconciler, window).await)
}

pub(super) async fn move_stale_leads(
    State(ctx): State<AppState>,
) -> (StatusCode, Json<JobResult>) {
    info!("stale lead job triggered");
    respond(run_stale_leads(&ctx.stale_mover).await)
}
