//! HTTP routes

mod appointments;
mod calendar;
mod health;
mod jobs;
mod oauth;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::AppContext;

/// Shared handler state
pub type AppState = Arc<AppContext>;

/// Every route the service exposes.
pub fn router(ctx: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/jobs/import-calendar", post(jobs::import_calendar))
        .route("/jobs/move-stale-leads", post(jobs::move_stale_leads))
        .route("/oauth/callback", get(oauth::callback))
        .route(
            "/users/{user_id}/calendar",
            get(calendar::status).patch(calendar::set_sync).delete(calendar::disconnect),
        )
        .route("/users/{user_id}/calendar/connect", post(calendar::connect))
        .route("/users/{user_id}/calendar/import", post(calendar::import))
        .route("/users/{user_id}/appointments", post(appointments::create))
        .route("/users/{user_id}/appointments/{appointment_id}", get(appointments::get))
        .route("/users/{user_id}/appointments/{appointment_id}/sync", post(appointments::sync))
        .route(
            "/users/{user_id}/appointments/{appointment_id}/status",
            patch(appointments::update_status),
        )
        .with_state(ctx)
}
