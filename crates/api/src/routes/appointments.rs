//! Appointment scheduling, sync and status

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadsync_domain::{Appointment, AppointmentStatus, NewAppointment, ScheduledAt, SyncedIds};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiResult;

fn default_sync() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateAppointment {
    lead_id: Uuid,
    when: ScheduledAt,
    #[serde(default)]
    notes: Option<String>,
    /// Push to the calendar when the user is connected.
    #[serde(default = "default_sync")]
    sync: bool,
    #[serde(default)]
    create_task: bool,
}

/// `201` with the stored appointment; with `sync` the body also carries the
/// outcome of the calendar push.
pub(super) async fn create(
    State(ctx): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateAppointment>,
) -> ApiResult<Response> {
    if body.sync {
        let call = ctx
            .synchronizer
            .schedule_call(&user_id, body.lead_id, body.when, body.notes, body.create_task)
            .await?;
        return Ok((StatusCode::CREATED, Json(call)).into_response());
    }

    let appointment = ctx
        .appointments
        .create_appointment(NewAppointment {
            user_id,
            lead_id: body.lead_id,
            when: body.when,
            notes: body.notes,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "appointment": appointment }))).into_response())
}

pub(super) async fn get(
    State(ctx): State<AppState>,
    Path((user_id, appointment_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(ctx.appointments.get_owned(&user_id, appointment_id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SyncParams {
    #[serde(default)]
    create_task: bool,
}

pub(super) async fn sync(
    State(ctx): State<AppState>,
    Path((user_id, appointment_id)): Path<(String, Uuid)>,
    Query(params): Query<SyncParams>,
) -> ApiResult<Json<SyncedIds>> {
    let ids =
        ctx.synchronizer.sync_appointment(&user_id, appointment_id, params.create_task).await?;
    Ok(Json(ids))
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusUpdate {
    status: AppointmentStatus,
}

pub(super) async fn update_status(
    State(ctx): State<AppState>,
    Path((user_id, appointment_id)): Path<(String, Uuid)>,
    Json(body): Json<StatusUpdate>,
) -> ApiResult<Json<Appointment>> {
    // ownership check first so other users' rows read as missing
    ctx.appointments.get_owned(&user_id, appointment_id).await?;
    Ok(Json(ctx.appointments.update_status(appointment_id, body.status).await?))
}
