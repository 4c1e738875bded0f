//! Mapping of domain errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadsync_domain::LeadSyncError;
use serde_json::json;
use tracing::{error, warn};

/// Handler error; the body is `{"error": {"type": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError(pub LeadSyncError);

impl From<LeadSyncError> for ApiError {
    fn from(err: LeadSyncError) -> Self {
        Self(err)
    }
}

/// HTTP status for a domain error.
pub fn status_for(err: &LeadSyncError) -> StatusCode {
    match err {
        LeadSyncError::NotConnected(_) => StatusCode::CONFLICT,
        LeadSyncError::NotFound(_) => StatusCode::NOT_FOUND,
        LeadSyncError::InvalidInput(_) | LeadSyncError::InvalidTransition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeadSyncError::Auth(_) => StatusCode::UNAUTHORIZED,
        LeadSyncError::Provider(_) => StatusCode::BAD_GATEWAY,
        LeadSyncError::Store(_)
        | LeadSyncError::NoMatch(_)
        | LeadSyncError::Config(_)
        | LeadSyncError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(%status, error = %self.0, "request failed");
        } else {
            warn!(%status, error = %self.0, "request rejected");
        }
        (status, Json(json!({ "error": self.0 }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
