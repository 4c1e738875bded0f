//! Lead repository implementation using SQLite
//!
//! Leads are owned by the hosting CRM; this core reads them and moves their
//! pipeline stage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_core::LeadRepository as LeadRepositoryPort;
use leadsync_domain::{Lead, LeadStage, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};
use tracing::instrument;
use uuid::Uuid;

use super::manager::{with_connection, DbManager};
use super::rows::{status, timestamp, uuid};
use crate::errors::InfraError;

const SELECT_COLUMNS: &str = "SELECT id, user_id, nome, telefone, celular_secundario, etapa,
        profissao, renda, observacoes, updated_at
 FROM leads";

/// SQLite-backed implementation of `LeadRepository`
pub struct SqliteLeadRepository {
    db: Arc<DbManager>,
}

impl SqliteLeadRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a lead row.
    pub async fn upsert_lead(&self, lead: &Lead) -> DomainResult<()> {
        let lead = lead.clone();

        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO leads (
                    id, user_id, nome, telefone, celular_secundario, etapa,
                    profissao, renda, observacoes, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    nome = excluded.nome,
                    telefone = excluded.telefone,
                    celular_secundario = excluded.celular_secundario,
                    etapa = excluded.etapa,
                    profissao = excluded.profissao,
                    renda = excluded.renda,
                    observacoes = excluded.observacoes,
                    updated_at = excluded.updated_at",
                params![
                    lead.id.to_string(),
                    lead.user_id,
                    lead.name,
                    lead.phone,
                    lead.secondary_phone,
                    lead.stage.as_str(),
                    lead.profession,
                    lead.income_bracket,
                    lead.observations,
                    lead.updated_at.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl LeadRepositoryPort for SqliteLeadRepository {
    async fn get_lead(&self, user_id: &str, lead_id: Uuid) -> DomainResult<Option<Lead>> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"),
                    params![lead_id.to_string(), user_id],
                    map_lead_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
    }

    async fn list_leads(&self, user_id: &str) -> DomainResult<Vec<Lead>> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY id ASC"))
                .map_err(InfraError::from)?;
            let leads = stmt
                .query_map(params![user_id], map_lead_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(leads)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn update_stage(
        &self,
        lead_id: Uuid,
        from: LeadStage,
        to: LeadStage,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE leads SET etapa = ?1, updated_at = ?2 WHERE id = ?3 AND etapa = ?4",
                    params![
                        to.as_str(),
                        updated_at.timestamp(),
                        lead_id.to_string(),
                        from.as_str()
                    ],
                )
                .map_err(InfraError::from)?;
            Ok(changed == 1)
        })
        .await
    }

    async fn find_stale_leads(
        &self,
        stage: LeadStage,
        updated_before: DateTime<Utc>,
    ) -> DomainResult<Vec<Lead>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS} WHERE etapa = ?1 AND updated_at < ?2 ORDER BY id ASC"
                ))
                .map_err(InfraError::from)?;
            let leads = stmt
                .query_map(params![stage.as_str(), updated_before.timestamp()], map_lead_row)
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(leads)
        })
        .await
    }
}

fn map_lead_row(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: uuid(0, &row.get::<_, String>(0)?)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        secondary_phone: row.get(4)?,
        stage: status(5, &row.get::<_, String>(5)?)?,
        profession: row.get(6)?,
        income_bracket: row.get(7)?,
        observations: row.get(8)?,
        updated_at: timestamp(9, row.get(9)?)?,
    })
}
