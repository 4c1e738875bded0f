//! In-memory repository mocks.
//!
//! They mirror the store's guarantees that the services rely on: the
//! conditional sync update, the synced-implies-event-id check and the
//! per-user uniqueness of event ids.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_core::{AppointmentRepository, ConnectionTokenRepository, LeadRepository};
use leadsync_domain::{
    Appointment, AppointmentStatus, ConnectionToken, Lead, LeadStage, LeadSyncError,
    MarkSyncedOutcome, Result as DomainResult, SyncedIds,
};
use uuid::Uuid;

/// In-memory mock for `AppointmentRepository`.
#[derive(Default, Clone)]
pub struct MockAppointmentRepository {
    rows: Arc<Mutex<Vec<Appointment>>>,
    fail_inserts: Arc<Mutex<bool>>,
}

impl MockAppointmentRepository {
    pub fn all(&self) -> Vec<Appointment> {
        self.rows.lock().unwrap().clone()
    }

    pub fn seed(&self, appointment: Appointment) {
        self.rows.lock().unwrap().push(appointment);
    }

    pub fn remove(&self, id: Uuid) {
        self.rows.lock().unwrap().retain(|a| a.id != id);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }
}

#[async_trait]
impl AppointmentRepository for MockAppointmentRepository {
    async fn insert_appointment(&self, appointment: &Appointment) -> DomainResult<()> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(LeadSyncError::Store("insert failed".into()));
        }
        appointment.check_sync_invariant().map_err(|e| LeadSyncError::Store(e.to_string()))?;

        let mut rows = self.rows.lock().unwrap();
        if let Some(event_id) = &appointment.google_event_id {
            if rows.iter().any(|a| {
                a.user_id == appointment.user_id && a.google_event_id.as_ref() == Some(event_id)
            }) {
                return Err(LeadSyncError::Store("UNIQUE constraint failed".into()));
            }
        }
        rows.push(appointment.clone());
        Ok(())
    }

    async fn get_appointment(&self, id: Uuid) -> DomainResult<Option<Appointment>> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|a| a.id == id && a.status == from) {
            Some(row) => {
                row.status = to;
                row.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_synced(
        &self,
        id: Uuid,
        ids: &SyncedIds,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<MarkSyncedOutcome> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|a| a.id == id) else {
            return Ok(MarkSyncedOutcome::Missing);
        };
        if row.synced_with_google {
            return Ok(MarkSyncedOutcome::AlreadySynced);
        }
        row.synced_with_google = true;
        row.google_event_id = Some(ids.event_id.clone());
        row.google_task_id = ids.task_id.clone();
        row.updated_at = updated_at;
        Ok(MarkSyncedOutcome::Updated)
    }

    async fn find_by_google_event_id(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> DomainResult<Option<Appointment>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user_id == user_id && a.google_event_id.as_deref() == Some(event_id))
            .cloned())
    }

    async fn find_by_lead_and_time(
        &self,
        user_id: &str,
        lead_id: Uuid,
        scheduled_at: DateTime<Utc>,
    ) -> DomainResult<Option<Appointment>> {
        let rows = self.rows.lock().unwrap();
        let mut matches: Vec<_> = rows
            .iter()
            .filter(|a| a.user_id == user_id && a.lead_id == lead_id && a.scheduled_at == scheduled_at)
            .cloned()
            .collect();
        matches.sort_by_key(|a| a.synced_with_google);
        Ok(matches.into_iter().next())
    }

    async fn list_pending_with_task(&self, user_id: &str) -> DomainResult<Vec<Appointment>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.user_id == user_id
                    && a.status == AppointmentStatus::Pending
                    && a.google_task_id.is_some()
            })
            .cloned()
            .collect())
    }
}

/// In-memory mock for `LeadRepository`.
#[derive(Default, Clone)]
pub struct MockLeadRepository {
    leads: Arc<Mutex<Vec<Lead>>>,
    fail_list: Arc<Mutex<bool>>,
}

impl MockLeadRepository {
    pub fn with_lead(self, lead: Lead) -> Self {
        self.leads.lock().unwrap().push(lead);
        self
    }

    pub fn get(&self, id: Uuid) -> Option<Lead> {
        self.leads.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }

    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }
}

#[async_trait]
impl LeadRepository for MockLeadRepository {
    async fn get_lead(&self, user_id: &str, lead_id: Uuid) -> DomainResult<Option<Lead>> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == lead_id && l.user_id == user_id)
            .cloned())
    }

    async fn list_leads(&self, user_id: &str) -> DomainResult<Vec<Lead>> {
        if *self.fail_list.lock().unwrap() {
            return Err(LeadSyncError::Store("leads unavailable".into()));
        }
        let mut leads: Vec<_> =
            self.leads.lock().unwrap().iter().filter(|l| l.user_id == user_id).cloned().collect();
        leads.sort_by_key(|l| l.id);
        Ok(leads)
    }

    async fn update_stage(
        &self,
        lead_id: Uuid,
        from: LeadStage,
        to: LeadStage,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut leads = self.leads.lock().unwrap();
        match leads.iter_mut().find(|l| l.id == lead_id && l.stage == from) {
            Some(lead) => {
                lead.stage = to;
                lead.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_stale_leads(
        &self,
        stage: LeadStage,
        updated_before: DateTime<Utc>,
    ) -> DomainResult<Vec<Lead>> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.stage == stage && l.updated_at < updated_before)
            .cloned()
            .collect())
    }
}

/// In-memory mock for `ConnectionTokenRepository`.
#[derive(Default, Clone)]
pub struct MockConnectionTokenRepository {
    tokens: Arc<Mutex<Vec<ConnectionToken>>>,
    fail_reads: Arc<Mutex<bool>>,
}

impl MockConnectionTokenRepository {
    pub fn get(&self, user_id: &str) -> Option<ConnectionToken> {
        self.tokens.lock().unwrap().iter().find(|t| t.user_id == user_id).cloned()
    }

    pub fn insert(&self, token: ConnectionToken) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|t| t.user_id != token.user_id);
        tokens.push(token);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }
}

#[async_trait]
impl ConnectionTokenRepository for MockConnectionTokenRepository {
    async fn get_token(&self, user_id: &str) -> DomainResult<Option<ConnectionToken>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(LeadSyncError::Store("tokens unavailable".into()));
        }
        Ok(self.get(user_id))
    }

    async fn upsert_token(&self, token: &ConnectionToken) -> DomainResult<()> {
        self.insert(token.clone());
        Ok(())
    }

    async fn delete_token(&self, user_id: &str) -> DomainResult<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.user_id != user_id);
        Ok(tokens.len() != before)
    }

    async fn set_sync_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.user_id == user_id) {
            Some(token) => {
                token.sync_enabled = enabled;
                token.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_sync(&self, user_id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if let Some(token) = self.tokens.lock().unwrap().iter_mut().find(|t| t.user_id == user_id) {
            token.last_sync_at = Some(at);
        }
        Ok(())
    }

    async fn list_connected_users(&self) -> DomainResult<Vec<String>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(LeadSyncError::Store("tokens unavailable".into()));
        }
        let mut users: Vec<_> = self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.sync_enabled)
            .map(|t| t.user_id.clone())
            .collect();
        users.sort();
        Ok(users)
    }
}
