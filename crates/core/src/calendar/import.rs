//! Inbound import reconciler
//!
//! Pulls provider events back and reconciles them with local appointments,
//! matching events to leads through the phone-token heuristic.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use leadsync_common::observability::redact_user_id;
use leadsync_domain::{
    extract_phone_token, phone_matches, AppointmentStatus, ImportOutcome, ImportSummary,
    ImportWindow, Lead, LeadSyncError, MarkSyncedOutcome, PhoneToken, RemoteEvent,
    RemoteTaskStatus, Result, SyncedIds,
};
use tracing::{debug, info, instrument, warn};

use super::connection::ConnectionManager;
use super::ports::CalendarProvider;
use crate::appointments::ports::LeadRepository;
use crate::appointments::AppointmentService;

/// Reconciles provider events and tasks with local appointments.
pub struct ImportReconciler {
    appointments: Arc<AppointmentService>,
    leads: Arc<dyn LeadRepository>,
    connections: Arc<ConnectionManager>,
    provider: Arc<dyn CalendarProvider>,
}

impl ImportReconciler {
    pub fn new(
        appointments: Arc<AppointmentService>,
        leads: Arc<dyn LeadRepository>,
        connections: Arc<ConnectionManager>,
        provider: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self { appointments, leads, connections, provider }
    }

    /// Import the user's provider events inside `[window_start, window_end]`.
    ///
    /// Token, listing and lead-loading failures abort the run; a failure on
    /// a single event is logged and counted as a skip.
    #[instrument(skip(self), fields(user = %redact_user_id(user_id)))]
    pub async fn import_events(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<ImportSummary> {
        let window = ImportWindow::new(window_start, window_end)?;
        let access_token = self.connections.access_token(user_id).await?;
        let events = self.provider.list_events(&access_token, &window).await?;

        let mut leads = self.leads.list_leads(user_id).await?;
        leads.sort_by_key(|lead| lead.id);

        let mut summary = ImportSummary::default();
        for event in &events {
            let outcome = match self.reconcile_event(user_id, event, &leads).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(event_id = %event.id, error = %err, "failed to reconcile event");
                    ImportOutcome::Failed
                }
            };
            debug!(event_id = %event.id, ?outcome, "event reconciled");
            summary.record(outcome);
        }

        if let Err(err) = self.connections.record_sync(user_id).await {
            warn!(error = %err, "failed to stamp last sync time");
        }

        info!(
            examined = summary.examined,
            imported = summary.imported,
            linked = summary.linked,
            skipped = summary.skipped,
            "calendar import finished"
        );
        Ok(summary)
    }

    async fn reconcile_event(
        &self,
        user_id: &str,
        event: &RemoteEvent,
        leads: &[Lead],
    ) -> Result<ImportOutcome> {
        if self.appointments.find_by_remote_event(user_id, &event.id).await?.is_some() {
            return Ok(ImportOutcome::AlreadyLinked);
        }

        let Some(token) =
            extract_phone_token(event.summary.as_deref(), event.description.as_deref())
        else {
            return Ok(ImportOutcome::NoPhone);
        };

        let lead = match match_lead(leads, &token) {
            Ok(lead) => lead,
            Err(LeadSyncError::NoMatch(reason)) => {
                debug!(event_id = %event.id, %reason, "no lead for event");
                return Ok(ImportOutcome::NoLead);
            }
            Err(err) => return Err(err),
        };

        let ids = SyncedIds { event_id: event.id.clone(), task_id: None };

        if let Some(existing) =
            self.appointments.find_for_lead_at(user_id, lead.id, event.start).await?
        {
            match self.appointments.mark_synced(existing.id, &ids.event_id, None).await? {
                MarkSyncedOutcome::Updated => return Ok(ImportOutcome::Linked),
                MarkSyncedOutcome::AlreadySynced => return Ok(ImportOutcome::AlreadyLinked),
                // deleted meanwhile; import as new
                MarkSyncedOutcome::Missing => {}
            }
        }

        let notes = event.description.clone().or_else(|| event.summary.clone());
        self.appointments.insert_imported(user_id, lead.id, event.start, notes, ids).await?;
        Ok(ImportOutcome::Imported)
    }

    /// Complete pending appointments whose provider task is done.
    ///
    /// Returns how many appointments moved to `concluida`.
    #[instrument(skip(self), fields(user = %redact_user_id(user_id)))]
    pub async fn refresh_task_statuses(&self, user_id: &str) -> Result<usize> {
        let access_token = self.connections.access_token(user_id).await?;
        let completed: HashSet<String> = self
            .provider
            .list_tasks(&access_token)
            .await?
            .into_iter()
            .filter(|task| task.status == RemoteTaskStatus::Completed)
            .map(|task| task.id)
            .collect();

        if completed.is_empty() {
            return Ok(0);
        }

        let mut updated = 0;
        for appointment in self.appointments.pending_with_tasks(user_id).await? {
            let Some(task_id) = appointment.google_task_id.as_deref() else { continue };
            if !completed.contains(task_id) {
                continue;
            }
            let status = AppointmentStatus::Completed;
            match self.appointments.update_status(appointment.id, status).await {
                Ok(_) => updated += 1,
                Err(err) => {
                    warn!(
                        appointment_id = %appointment.id,
                        error = %err,
                        "failed to complete appointment"
                    );
                }
            }
        }

        info!(updated, "task statuses refreshed");
        Ok(updated)
    }
}

/// First lead (by id) with a phone containing the token.
fn match_lead<'a>(leads: &'a [Lead], token: &PhoneToken) -> Result<&'a Lead> {
    leads
        .iter()
        .find(|lead| phone_matches(lead, token))
        .ok_or_else(|| {
            LeadSyncError::NoMatch(format!(
                "no lead phone contains a {}-digit token",
                token.as_str().len()
            ))
        })
}
