//! Authorization redirect target

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use leadsync_common::redact_user_id;
use tracing::{info, warn};

use super::AppState;
use crate::error::status_for;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Calendar Connected</title></head>
<body><h1>Google Calendar connected</h1><p>You can close this window.</p></body>
</html>"#;

fn failure_page(reason: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>{}</p></body>
</html>"#,
        escape(reason)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// `GET /oauth/callback?code=..&state=..`
pub(super) async fn callback(
    State(ctx): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.get("error") {
        warn!(error = %error, "authorization denied by user or provider");
        return (StatusCode::BAD_REQUEST, Html(failure_page("Access was not granted.")));
    }

    let (Some(code), Some(state)) = (params.get("code"), params.get("state")) else {
        return (
            StatusCode::BAD_REQUEST,
            Html(failure_page("Invalid or unexpected callback parameters.")),
        );
    };

    match ctx.connections.complete_connect(state, code).await {
        Ok(token) => {
            info!(user = %redact_user_id(&token.user_id), "calendar connected via callback");
            (StatusCode::OK, Html(SUCCESS_PAGE.to_string()))
        }
        Err(err) => {
            warn!(error = %err, "authorization callback failed");
            (status_for(&err), Html(failure_page(&err.to_string())))
        }
    }
}
