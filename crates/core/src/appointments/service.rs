//! Appointment store accessor

use std::sync::Arc;

use chrono::{DateTime, Utc};
use leadsync_domain::{
    normalize_notes, Appointment, AppointmentStatus, LeadSyncError, MarkSyncedOutcome,
    NewAppointment, Result, StatusChange, SyncedIds,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::ports::{AppointmentRepository, LeadRepository};

/// Creates, reads and updates appointment records.
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    leads: Arc<dyn LeadRepository>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        leads: Arc<dyn LeadRepository>,
    ) -> Self {
        Self { appointments, leads }
    }

    /// Persist a pending, unsynced appointment.
    ///
    /// Never contacts the calendar provider.
    #[instrument(skip(self, new), fields(lead_id = %new.lead_id))]
    pub async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment> {
        let scheduled_at = new.when.resolve()?;

        if self.leads.get_lead(&new.user_id, new.lead_id).await?.is_none() {
            return Err(LeadSyncError::NotFound(format!("lead {}", new.lead_id)));
        }

        let appointment =
            Appointment::pending(new.user_id, new.lead_id, scheduled_at, new.notes, Utc::now());
        self.appointments.insert_appointment(&appointment).await?;

        info!(appointment_id = %appointment.id, %scheduled_at, "appointment created");
        Ok(appointment)
    }

    /// Fetch an appointment.
    ///
    /// # Errors
    /// [`LeadSyncError::NotFound`] when it doesn't exist.
    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment> {
        self.appointments
            .get_appointment(id)
            .await?
            .ok_or_else(|| LeadSyncError::NotFound(format!("appointment {id}")))
    }

    /// Fetch an appointment owned by `user_id`; other users' rows are
    /// reported as missing.
    pub async fn get_owned(&self, user_id: &str, id: Uuid) -> Result<Appointment> {
        let appointment = self.get_appointment(id).await?;
        if appointment.user_id != user_id {
            return Err(LeadSyncError::NotFound(format!("appointment {id}")));
        }
        Ok(appointment)
    }

    /// Apply a status change.
    ///
    /// `pendente` may become `concluida` or `cancelada`. Re-applying the
    /// current terminal status returns the record unchanged.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment> {
        let mut appointment = self.get_appointment(id).await?;

        match appointment.status.check_transition(status)? {
            StatusChange::Unchanged => {
                debug!("status already applied");
                return Ok(appointment);
            }
            StatusChange::Applied => {}
        }

        let now = Utc::now();
        let updated =
            self.appointments.update_status(id, appointment.status, status, now).await?;

        if !updated {
            // lost a race; judge the request against what won
            let current = self.get_appointment(id).await?;
            return match current.status.check_transition(status)? {
                StatusChange::Unchanged => Ok(current),
                StatusChange::Applied => Err(LeadSyncError::InvalidTransition(format!(
                    "{} changed concurrently",
                    current.status
                ))),
            };
        }

        info!(from = %appointment.status, to = %status, "appointment status updated");
        appointment.status = status;
        appointment.updated_at = now;
        Ok(appointment)
    }

    /// Record remote ids with a conditional update.
    ///
    /// Losing to a concurrent writer or finding the row gone is logged, not
    /// an error.
    #[instrument(skip(self))]
    pub async fn mark_synced(
        &self,
        id: Uuid,
        event_id: &str,
        task_id: Option<&str>,
    ) -> Result<MarkSyncedOutcome> {
        if event_id.trim().is_empty() {
            return Err(LeadSyncError::InvalidInput("remote event id is empty".into()));
        }

        let ids =
            SyncedIds { event_id: event_id.to_string(), task_id: task_id.map(ToString::to_string) };
        let outcome = self.appointments.mark_synced(id, &ids, Utc::now()).await?;

        match outcome {
            MarkSyncedOutcome::Updated => debug!("appointment marked synced"),
            MarkSyncedOutcome::AlreadySynced => {
                warn!("appointment was already synced by another flow");
            }
            MarkSyncedOutcome::Missing => warn!("appointment vanished before it could be marked"),
        }
        Ok(outcome)
    }

    /// Appointment already referencing a provider event.
    pub async fn find_by_remote_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Appointment>> {
        self.appointments.find_by_google_event_id(user_id, event_id).await
    }

    /// Appointment for a lead at exactly `at`.
    pub async fn find_for_lead_at(
        &self,
        user_id: &str,
        lead_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Appointment>> {
        self.appointments.find_by_lead_and_time(user_id, lead_id, at).await
    }

    /// Insert an appointment that already exists on the provider.
    #[instrument(skip(self, notes, ids), fields(event_id = %ids.event_id))]
    pub async fn insert_imported(
        &self,
        user_id: &str,
        lead_id: Uuid,
        scheduled_at: DateTime<Utc>,
        notes: Option<String>,
        ids: SyncedIds,
    ) -> Result<Appointment> {
        let appointment =
            Appointment::pending(user_id, lead_id, scheduled_at, normalize_notes(notes), Utc::now())
                .with_remote_ids(ids)?;
        appointment.check_sync_invariant()?;
        self.appointments.insert_appointment(&appointment).await?;
        Ok(appointment)
    }

    /// Pending appointments with a linked provider task.
    pub async fn pending_with_tasks(&self, user_id: &str) -> Result<Vec<Appointment>> {
        self.appointments.list_pending_with_task(user_id).await
    }
}
