//! Appointment repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_core::AppointmentRepository as AppointmentRepositoryPort;
use leadsync_domain::{
    Appointment, AppointmentStatus, MarkSyncedOutcome, Result as DomainResult, SyncedIds,
};
use rusqlite::{params, OptionalExtension, Row};
use tracing::instrument;
use uuid::Uuid;

use super::manager::{with_connection, DbManager};
use super::rows::{bool_to_int, int_to_bool, status, timestamp, uuid};
use crate::errors::InfraError;

const SELECT_COLUMNS: &str = "SELECT id, user_id, lead_id, data_agendamento, observacoes, status,
        synced_with_google, google_event_id, google_task_id, created_at, updated_at
 FROM appointments";

/// SQLite-backed implementation of `AppointmentRepository`
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepositoryPort for SqliteAppointmentRepository {
    #[instrument(skip(self, appointment), fields(appointment_id = %appointment.id))]
    async fn insert_appointment(&self, appointment: &Appointment) -> DomainResult<()> {
        appointment.check_sync_invariant()?;
        let appointment = appointment.clone();

        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO appointments (
                    id, user_id, lead_id, data_agendamento, observacoes, status,
                    synced_with_google, google_event_id, google_task_id, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    appointment.id.to_string(),
                    appointment.user_id,
                    appointment.lead_id.to_string(),
                    appointment.scheduled_at.timestamp(),
                    appointment.notes,
                    appointment.status.as_str(),
                    bool_to_int(appointment.synced_with_google),
                    appointment.google_event_id,
                    appointment.google_task_id,
                    appointment.created_at.timestamp(),
                    appointment.updated_at.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }

    async fn get_appointment(&self, id: Uuid) -> DomainResult<Option<Appointment>> {
        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                    params![id.to_string()],
                    map_appointment_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE appointments SET status = ?1, updated_at = ?2
                     WHERE id = ?3 AND status = ?4",
                    params![to.as_str(), updated_at.timestamp(), id.to_string(), from.as_str()],
                )
                .map_err(InfraError::from)?;
            Ok(changed == 1)
        })
        .await
    }

    #[instrument(skip(self, ids), fields(event_id = %ids.event_id))]
    async fn mark_synced(
        &self,
        id: Uuid,
        ids: &SyncedIds,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<MarkSyncedOutcome> {
        let ids = ids.clone();

        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE appointments
                     SET synced_with_google = 1, google_event_id = ?1, google_task_id = ?2,
                         updated_at = ?3
                     WHERE id = ?4 AND synced_with_google = 0",
                    params![ids.event_id, ids.task_id, updated_at.timestamp(), id.to_string()],
                )
                .map_err(InfraError::from)?;

            if changed == 1 {
                return Ok(MarkSyncedOutcome::Updated);
            }

            let exists = conn
                .query_row(
                    "SELECT 1 FROM appointments WHERE id = ?1",
                    params![id.to_string()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(InfraError::from)?
                .is_some();

            Ok(if exists { MarkSyncedOutcome::AlreadySynced } else { MarkSyncedOutcome::Missing })
        })
        .await
    }

    async fn find_by_google_event_id(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> DomainResult<Option<Appointment>> {
        let user_id = user_id.to_string();
        let event_id = event_id.to_string();

        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND google_event_id = ?2"),
                    params![user_id, event_id],
                    map_appointment_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
    }

    async fn find_by_lead_and_time(
        &self,
        user_id: &str,
        lead_id: Uuid,
        scheduled_at: DateTime<Utc>,
    ) -> DomainResult<Option<Appointment>> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "{SELECT_COLUMNS}
                         WHERE user_id = ?1 AND lead_id = ?2 AND data_agendamento = ?3
                         ORDER BY synced_with_google ASC, created_at ASC
                         LIMIT 1"
                    ),
                    params![user_id, lead_id.to_string(), scheduled_at.timestamp()],
                    map_appointment_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
    }

    async fn list_pending_with_task(&self, user_id: &str) -> DomainResult<Vec<Appointment>> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS}
                     WHERE user_id = ?1 AND status = ?2 AND google_task_id IS NOT NULL
                     ORDER BY data_agendamento ASC"
                ))
                .map_err(InfraError::from)?;
            let rows = stmt
                .query_map(
                    params![user_id, AppointmentStatus::Pending.as_str()],
                    map_appointment_row,
                )
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(rows)
        })
        .await
    }
}

fn map_appointment_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: uuid(0, &row.get::<_, String>(0)?)?,
        user_id: row.get(1)?,
        lead_id: uuid(2, &row.get::<_, String>(2)?)?,
        scheduled_at: timestamp(3, row.get(3)?)?,
        notes: row.get(4)?,
        status: status(5, &row.get::<_, String>(5)?)?,
        synced_with_google: int_to_bool(row.get(6)?),
        google_event_id: row.get(7)?,
        google_task_id: row.get(8)?,
        created_at: timestamp(9, row.get(9)?)?,
        updated_at: timestamp(10, row.get(10)?)?,
    })
}
