//! Outbound event/task synchronizer

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use leadsync_common::observability::redact_user_id;
use leadsync_domain::constants::EVENT_TITLE_PREFIX;
use leadsync_domain::{
    Appointment, Config, Lead, LeadSyncError, MarkSyncedOutcome, NewAppointment, NewRemoteEvent,
    NewRemoteTask, Result, ScheduledAt, ScheduledCall, SyncAttempt, SyncedIds,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::connection::ConnectionManager;
use super::ports::CalendarProvider;
use crate::appointments::ports::LeadRepository;
use crate::appointments::AppointmentService;

/// Shape of the events created on the provider
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub event_duration: Duration,
    pub timezone: Tz,
}

impl SyncSettings {
    /// # Errors
    /// [`LeadSyncError::Config`] for an unknown timezone or an out-of-range
    /// event duration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let minutes = config.sync.event_duration_minutes;
        let event_duration = Duration::try_minutes(minutes).ok_or_else(|| {
            LeadSyncError::Config(format!("sync.event_duration_minutes out of range: {minutes}"))
        })?;
        Ok(Self { event_duration, timezone: config.sync.timezone()? })
    }
}

/// Pushes local appointments to the provider as an event and, optionally, a
/// task.
pub struct EventSynchronizer {
    appointments: Arc<AppointmentService>,
    leads: Arc<dyn LeadRepository>,
    connections: Arc<ConnectionManager>,
    provider: Arc<dyn CalendarProvider>,
    settings: SyncSettings,
}

impl EventSynchronizer {
    pub fn new(
        appointments: Arc<AppointmentService>,
        leads: Arc<dyn LeadRepository>,
        connections: Arc<ConnectionManager>,
        provider: Arc<dyn CalendarProvider>,
        settings: SyncSettings,
    ) -> Self {
        Self { appointments, leads, connections, provider, settings }
    }

    /// Create the remote event (and task) for an appointment and record the
    /// ids.
    ///
    /// Already-synced appointments return their stored ids without a
    /// provider call.
    #[instrument(skip(self), fields(user = %redact_user_id(user_id)))]
    pub async fn sync_appointment(
        &self,
        user_id: &str,
        appointment_id: Uuid,
        create_task: bool,
    ) -> Result<SyncedIds> {
        if !self.connections.is_connected(user_id).await? {
            return Err(LeadSyncError::NotConnected(redact_user_id(user_id)));
        }

        let appointment = self.appointments.get_owned(user_id, appointment_id).await?;
        if let Some(ids) = appointment.synced_ids() {
            info!(event_id = %ids.event_id, "appointment already synced; skipping provider call");
            return Ok(ids);
        }

        let lead = self
            .leads
            .get_lead(user_id, appointment.lead_id)
            .await?
            .ok_or_else(|| LeadSyncError::NotFound(format!("lead {}", appointment.lead_id)))?;

        let access_token = self.connections.access_token(user_id).await?;

        let event = self.build_event(&appointment, &lead);
        let event_id = self.provider.create_event(&access_token, &event).await?;

        let task_id = if create_task {
            let task = self.build_task(&appointment, &lead);
            match self.provider.create_task(&access_token, &task).await {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(error = %err, %event_id, "task creation failed; keeping event only");
                    None
                }
            }
        } else {
            None
        };

        let outcome =
            self.appointments.mark_synced(appointment_id, &event_id, task_id.as_deref()).await?;

        let ids = SyncedIds { event_id, task_id };
        match outcome {
            MarkSyncedOutcome::Updated | MarkSyncedOutcome::Missing => Ok(ids),
            MarkSyncedOutcome::AlreadySynced => {
                // another flow stored its ids first; those are authoritative
                let current = self.appointments.get_appointment(appointment_id).await?;
                warn!(
                    orphan_event_id = %ids.event_id,
                    "concurrent sync won; created event is unreferenced"
                );
                Ok(current.synced_ids().unwrap_or(ids))
            }
        }
    }

    /// Persist a call, then push it when the user is connected.
    ///
    /// A sync failure never undoes the persisted appointment.
    #[instrument(skip(self, notes), fields(user = %redact_user_id(user_id)))]
    pub async fn schedule_call(
        &self,
        user_id: &str,
        lead_id: Uuid,
        when: ScheduledAt,
        notes: Option<String>,
        create_task: bool,
    ) -> Result<ScheduledCall> {
        let appointment = self
            .appointments
            .create_appointment(NewAppointment {
                user_id: user_id.to_string(),
                lead_id,
                when,
                notes,
            })
            .await?;

        let sync = match self.connections.is_connected(user_id).await {
            Ok(false) => SyncAttempt::NotConnected,
            Ok(true) => match self.sync_appointment(user_id, appointment.id, create_task).await {
                Ok(ids) => SyncAttempt::Synced { ids },
                Err(LeadSyncError::NotConnected(_)) => SyncAttempt::NotConnected,
                Err(err) => {
                    warn!(
                        error = %err,
                        appointment_id = %appointment.id,
                        "sync after scheduling failed"
                    );
                    SyncAttempt::Failed { reason: err.to_string() }
                }
            },
            Err(err) => SyncAttempt::Failed { reason: err.to_string() },
        };

        let appointment = match &sync {
            SyncAttempt::Synced { ids } => appointment.with_remote_ids(ids.clone())?,
            _ => appointment,
        };

        Ok(ScheduledCall { appointment, sync })
    }

    fn title(lead: &Lead) -> String {
        format!("{EVENT_TITLE_PREFIX}: {} - {}", lead.name, lead.phone)
    }

    fn build_event(&self, appointment: &Appointment, lead: &Lead) -> NewRemoteEvent {
        NewRemoteEvent {
            summary: Self::title(lead),
            description: appointment.notes.clone(),
            start: appointment.scheduled_at,
            end: appointment
                .scheduled_at
                .checked_add_signed(self.settings.event_duration)
                .unwrap_or(appointment.scheduled_at),
            timezone: self.settings.timezone.name().to_string(),
        }
    }

    fn build_task(&self, appointment: &Appointment, lead: &Lead) -> NewRemoteTask {
        NewRemoteTask {
            title: Self::title(lead),
            notes: appointment.notes.clone(),
            due: task_due(appointment.scheduled_at, self.settings.timezone),
        }
    }
}

/// Midnight UTC of the appointment's date in the configured zone; the
/// provider keeps only the date part of a task due time.
fn task_due(scheduled_at: DateTime<Utc>, timezone: Tz) -> DateTime<Utc> {
    scheduled_at.with_timezone(&timezone).date_naive().and_time(NaiveTime::MIN).and_utc()
}
