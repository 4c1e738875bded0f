//! Store ports for appointments and leads

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_domain::{
    Appointment, AppointmentStatus, Lead, LeadStage, MarkSyncedOutcome, Result, SyncedIds,
};
use uuid::Uuid;

/// Appointment store
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Insert a new appointment row.
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<()>;

    /// Fetch by id.
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>>;

    /// Move the row from `from` to `to`; `false` if the row is gone or no
    /// longer in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Attach remote ids only while the row is still unsynced.
    async fn mark_synced(
        &self,
        id: Uuid,
        ids: &SyncedIds,
        updated_at: DateTime<Utc>,
    ) -> Result<MarkSyncedOutcome>;

    /// Appointment already linked to a provider event.
    async fn find_by_google_event_id(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Result<Option<Appointment>>;

    /// Appointment for a lead at exactly `scheduled_at`, unsynced rows first.
    async fn find_by_lead_and_time(
        &self,
        user_id: &str,
        lead_id: Uuid,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>>;

    /// Pending appointments that carry a provider task id.
    async fn list_pending_with_task(&self, user_id: &str) -> Result<Vec<Appointment>>;
}

/// Lead store
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Lead owned by `user_id`.
    async fn get_lead(&self, user_id: &str, lead_id: Uuid) -> Result<Option<Lead>>;

    /// All of the user's leads ordered by id.
    async fn list_leads(&self, user_id: &str) -> Result<Vec<Lead>>;

    /// Move a lead from `from` to `to`, stamping `updated_at`; `false` if the
    /// lead is gone or no longer in `from`.
    async fn update_stage(
        &self,
        lead_id: Uuid,
        from: LeadStage,
        to: LeadStage,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Leads in `stage` last updated before `updated_before`, across users.
    async fn find_stale_leads(
        &self,
        stage: LeadStage,
        updated_before: DateTime<Utc>,
    ) -> Result<Vec<Lead>>;
}
