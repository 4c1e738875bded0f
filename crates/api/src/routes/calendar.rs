//! Per-user calendar connection

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use leadsync_domain::{
    AuthorizationRequest, ConnectionState, ConnectionWait, ImportSummary, ImportWindow,
    LeadSyncError,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub(super) struct StatusParams {
    /// Block until connected, cancelled or timed out.
    #[serde(default)]
    wait: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct CalendarStatus {
    user_id: String,
    state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait: Option<ConnectionWait>,
}

pub(super) async fn connect(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AuthorizationRequest>> {
    Ok(Json(ctx.connections.initiate_connect(&user_id)?))
}

pub(super) async fn status(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<StatusParams>,
) -> ApiResult<Json<CalendarStatus>> {
    let wait = if params.wait {
        // request drop cancels too: the wait future is dropped with it
        let cancel = ctx.shutdown_token().child_token();
        Some(ctx.connections.wait_for_connection(&user_id, cancel).await)
    } else {
        None
    };

    let state = ctx.connections.connection_state(&user_id).await?;
    Ok(Json(CalendarStatus { user_id, state, wait }))
}

#[derive(Debug, Deserialize)]
pub(super) struct SyncToggle {
    sync_enabled: bool,
}

pub(super) async fn set_sync(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<SyncToggle>,
) -> ApiResult<StatusCode> {
    ctx.connections.set_sync_enabled(&user_id, body.sync_enabled).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn disconnect(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    ctx.connections.disconnect(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ImportParams {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

/// Import one user's events; the window defaults to the configured one.
pub(super) async fn import(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ImportParams>,
) -> ApiResult<Json<ImportSummary>> {
    let default = ctx.default_import_window();
    let window = ImportWindow::new(
        params.start.unwrap_or(default.start),
        params.end.unwrap_or(default.end),
    )?;

    let timeout = Duration::from_secs(ctx.config.sync.job_timeout_secs.max(1));
    let summary = tokio::time::timeout(
        timeout,
        ctx.reconciler.import_events(&user_id, window.start, window.end),
    )
    .await
    .map_err(|_| {
        LeadSyncError::Provider(format!(
            "calendar import timed out after {}s",
            timeout.as_secs()
        ))
    })??;

    Ok(Json(summary))
}
