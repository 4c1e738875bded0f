//! Call appointments and their sync bookkeeping

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LeadSyncError, Result};

/// Appointment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "concluida")]
    Completed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

crate::impl_domain_status_conversions!(AppointmentStatus {
    Pending => "pendente",
    Completed => "concluida",
    Cancelled => "cancelada",
});

/// Result of validating a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The row must be updated
    Applied,
    /// Target equals the current terminal status; nothing to write
    Unchanged,
}

impl AppointmentStatus {
    /// `concluida` and `cancelada` are final.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Validate moving from `self` to `next`.
    ///
    /// Only `pendente` may move, and only forward. Re-applying the current
    /// terminal status is accepted without a write.
    ///
    /// # Errors
    /// - [`LeadSyncError::InvalidInput`] when `next` is `pendente`
    /// - [`LeadSyncError::InvalidTransition`] when leaving a terminal status
    pub fn check_transition(self, next: Self) -> Result<StatusChange> {
        if next == Self::Pending {
            return Err(LeadSyncError::InvalidInput(format!(
                "appointment cannot move back to {next}"
            )));
        }
        match self {
            Self::Pending => Ok(StatusChange::Applied),
            current if current == next => Ok(StatusChange::Unchanged),
            current => Err(LeadSyncError::InvalidTransition(format!("{current} -> {next}"))),
        }
    }
}

/// When a call takes place, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduledAt {
    /// Absolute instant
    Instant { at: DateTime<Utc> },
    /// Wall-clock date and time in an IANA zone
    Local { date: NaiveDate, time: NaiveTime, timezone: Tz },
}

impl ScheduledAt {
    /// Resolve to a single UTC instant with whole-second precision.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::InvalidInput`] when the local time falls in a
    /// DST gap (does not exist) or fold (exists twice).
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        let instant = match self {
            Self::Instant { at } => *at,
            Self::Local { date, time, timezone } => {
                let naive = date.and_time(*time);
                match timezone.from_local_datetime(&naive) {
                    LocalResult::Single(local) => local.with_timezone(&Utc),
                    LocalResult::Ambiguous(first, second) => {
                        return Err(LeadSyncError::InvalidInput(format!(
                            "{naive} is ambiguous in {timezone} ({first} or {second})"
                        )));
                    }
                    LocalResult::None => {
                        return Err(LeadSyncError::InvalidInput(format!(
                            "{naive} does not exist in {timezone}"
                        )));
                    }
                }
            }
        };
        Ok(instant.trunc_subsecs(0))
    }
}

/// Remote identifiers attached to a synced appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedIds {
    pub event_id: String,
    pub task_id: Option<String>,
}

/// Outcome of the conditional "mark as synced" update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkSyncedOutcome {
    Updated,
    AlreadySynced,
    Missing,
}

/// Input for creating an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub user_id: String,
    pub lead_id: Uuid,
    pub when: ScheduledAt,
    pub notes: Option<String>,
}

/// A scheduled call with a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: String,
    pub lead_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub synced_with_google: bool,
    pub google_event_id: Option<String>,
    pub google_task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A fresh, unsynced `pendente` appointment.
    #[must_use]
    pub fn pending(
        user_id: impl Into<String>,
        lead_id: Uuid,
        scheduled_at: DateTime<Utc>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            lead_id,
            scheduled_at: scheduled_at.trunc_subsecs(0),
            notes: normalize_notes(notes),
            status: AppointmentStatus::Pending,
            synced_with_google: false,
            google_event_id: None,
            google_task_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach remote ids and flag as synced.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::InvalidInput`] for an empty event id.
    pub fn with_remote_ids(mut self, ids: SyncedIds) -> Result<Self> {
        if ids.event_id.trim().is_empty() {
            return Err(LeadSyncError::InvalidInput("remote event id is empty".into()));
        }
        self.synced_with_google = true;
        self.google_event_id = Some(ids.event_id);
        self.google_task_id = ids.task_id;
        Ok(self)
    }

    /// Stored remote ids when the appointment is synced.
    #[must_use]
    pub fn synced_ids(&self) -> Option<SyncedIds> {
        match (&self.google_event_id, self.synced_with_google) {
            (Some(event_id), true) => {
                Some(SyncedIds { event_id: event_id.clone(), task_id: self.google_task_id.clone() })
            }
            _ => None,
        }
    }

    /// `synced_with_google` implies a remote event id.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::Internal`] if the record breaks the rule.
    pub fn check_sync_invariant(&self) -> Result<()> {
        if self.synced_with_google && self.google_event_id.as_deref().map_or(true, str::is_empty) {
            return Err(LeadSyncError::Internal(format!(
                "appointment {} flagged synced without an event id",
                self.id
            )));
        }
        Ok(())
    }
}

/// Blank notes are stored as null.
#[must_use]
pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// What happened to the provider push after a call was scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncAttempt {
    Synced { ids: SyncedIds },
    NotConnected,
    Failed { reason: String },
}

/// A persisted appointment together with the sync attempt that followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCall {
    pub appointment: Appointment,
    pub sync: SyncAttempt,
}
