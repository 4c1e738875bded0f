//! Connection token repository implementation using SQLite

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_core::ConnectionTokenRepository as ConnectionTokenRepositoryPort;
use leadsync_domain::{ConnectionToken, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};
use tracing::instrument;

use super::manager::{with_connection, DbManager};
use super::rows::{bool_to_int, int_to_bool, opt_timestamp, timestamp};
use crate::errors::InfraError;

/// SQLite-backed implementation of `ConnectionTokenRepository`
pub struct SqliteConnectionTokenRepository {
    db: Arc<DbManager>,
}

impl SqliteConnectionTokenRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConnectionTokenRepositoryPort for SqliteConnectionTokenRepository {
    async fn get_token(&self, user_id: &str) -> DomainResult<Option<ConnectionToken>> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let row = conn
                .query_row(
                    "SELECT user_id, access_token, refresh_token, expires_at, sync_enabled,
                            last_sync_at, created_at, updated_at
                     FROM connection_tokens WHERE user_id = ?1",
                    params![user_id],
                    map_token_row,
                )
                .optional()
                .map_err(InfraError::from)?;
            Ok(row)
        })
        .await
    }

    #[instrument(skip_all)]
    async fn upsert_token(&self, token: &ConnectionToken) -> DomainResult<()> {
        let token = token.clone();

        with_connection(&self.db, move |conn| {
            conn.execute(
                "INSERT INTO connection_tokens (
                    user_id, access_token, refresh_token, expires_at, sync_enabled,
                    last_sync_at, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(user_id) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    sync_enabled = excluded.sync_enabled,
                    last_sync_at = excluded.last_sync_at,
                    updated_at = excluded.updated_at",
                params![
                    token.user_id,
                    token.access_token,
                    token.refresh_token,
                    token.expires_at.map(|t| t.timestamp()),
                    bool_to_int(token.sync_enabled),
                    token.last_sync_at.map(|t| t.timestamp()),
                    token.created_at.timestamp(),
                    token.updated_at.timestamp(),
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip_all)]
    async fn delete_token(&self, user_id: &str) -> DomainResult<bool> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let deleted = conn
                .execute("DELETE FROM connection_tokens WHERE user_id = ?1", params![user_id])
                .map_err(InfraError::from)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn set_sync_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        updated_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            let changed = conn
                .execute(
                    "UPDATE connection_tokens SET sync_enabled = ?1, updated_at = ?2
                     WHERE user_id = ?3",
                    params![bool_to_int(enabled), updated_at.timestamp(), user_id],
                )
                .map_err(InfraError::from)?;
            Ok(changed == 1)
        })
        .await
    }

    async fn touch_last_sync(&self, user_id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        let user_id = user_id.to_string();

        with_connection(&self.db, move |conn| {
            conn.execute(
                "UPDATE connection_tokens SET last_sync_at = ?1 WHERE user_id = ?2",
                params![at.timestamp(), user_id],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }

    async fn list_connected_users(&self) -> DomainResult<Vec<String>> {
        with_connection(&self.db, move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT user_id FROM connection_tokens WHERE sync_enabled = 1
                     ORDER BY user_id ASC",
                )
                .map_err(InfraError::from)?;
            let users = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(InfraError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(InfraError::from)?;
            Ok(users)
        })
        .await
    }
}

fn map_token_row(row: &Row<'_>) -> rusqlite::Result<ConnectionToken> {
    Ok(ConnectionToken {
        user_id: row.get(0)?,
        access_token: row.get(1)?,
        refresh_token: row.get(2)?,
        expires_at: opt_timestamp(3, row.get(3)?)?,
        sync_enabled: int_to_bool(row.get(4)?),
        last_sync_at: opt_timestamp(5, row.get(5)?)?,
        created_at: timestamp(6, row.get(6)?)?,
        updated_at: timestamp(7, row.get(7)?)?,
    })
}
