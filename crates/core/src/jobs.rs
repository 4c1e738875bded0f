//! Job runners shared by the scheduler and the HTTP job endpoints

use chrono::Utc;
use leadsync_common::observability::redact_user_id;
use leadsync_domain::{ImportSummary, ImportWindow, JobResult};
use tracing::{error, info, warn};

use crate::calendar::{ConnectionManager, ImportReconciler};
use crate::pipeline::StaleLeadMover;

/// Import for every connected user.
///
/// Fails only when connected users can't be listed or every user fails.
pub async fn run_calendar_import(
    connections: &ConnectionManager,
    reconciler: &ImportReconciler,
    window: ImportWindow,
) -> JobResult {
    let users = match connections.connected_users().await {
        Ok(users) => users,
        Err(err) => {
            error!(error = %err, "could not list connected users");
            return JobResult::failed(err.to_string());
        }
    };

    let mut total = ImportSummary::default();
    let mut failures = 0usize;
    let mut last_error = None;

    for user_id in &users {
        let user_tag = redact_user_id(user_id);
        match reconciler.import_events(user_id, window.start, window.end).await {
            Ok(summary) => total.merge(&summary),
            Err(err) => {
                failures += 1;
                warn!(user = %user_tag, error = %err, "calendar import failed for user");
                last_error = Some(err.to_string());
                continue;
            }
        }

        if let Err(err) = reconciler.refresh_task_statuses(user_id).await {
            warn!(user = %user_tag, error = %err, "task status refresh failed");
        }
    }

    if !users.is_empty() && failures == users.len() {
        let detail = last_error.unwrap_or_default();
        return JobResult::failed(format!("import failed for all {failures} users: {detail}"));
    }

    info!(
        users = users.len(),
        failures,
        imported = total.imported,
        linked = total.linked,
        skipped = total.skipped,
        "calendar import job finished"
    );
    JobResult::imported(total.imported, total.skipped, total.examined)
}

/// Run the stale-lead pipeline job now.
pub async fn run_stale_leads(mover: &StaleLeadMover) -> JobResult {
    match mover.move_stale_leads(Utc::now()).await {
        Ok(moved) => JobResult::moved(moved),
        Err(err) => {
            error!(error = %err, "stale lead job failed");
            JobResult::failed(err.to_string())
        }
    }
}
