#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use leadsync_domain::{Lead, LeadStage};
use leadsync_infra::database::{DbManager, SqliteLeadRepository};
use tempfile::TempDir;
use uuid::Uuid;

/// Migrated temporary database kept alive for the duration of a test.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("leadsync-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    /// Execute raw SQL, bypassing the repositories.
    pub fn execute(&self, sql: &str) -> rusqlite::Result<usize> {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.execute(sql, [])
    }

    pub async fn seed_lead(&self, lead: &Lead) {
        SqliteLeadRepository::new(self.manager.clone())
            .upsert_lead(lead)
            .await
            .expect("lead should persist");
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).expect("valid timestamp").with_timezone(&Utc)
}

pub fn lead(user_id: &str, name: &str, phone: &str, stage: LeadStage, updated_at: DateTime<Utc>) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        secondary_phone: None,
        stage,
        profession: Some("Engenheira".into()),
        income_bracket: None,
        observations: None,
        updated_at,
    }
}
