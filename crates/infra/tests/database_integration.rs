//! Repository workflows against the real schema on a temporary SQLite file.

mod support;

use chrono::Duration;
use leadsync_core::{AppointmentRepository, ConnectionTokenRepository, LeadRepository};
use leadsync_domain::{
    Appointment, AppointmentStatus, ConnectionToken, LeadStage, LeadSyncError, MarkSyncedOutcome,
    SyncedIds,
};
use leadsync_infra::database::{
    SqliteAppointmentRepository, SqliteConnectionTokenRepository, SqliteLeadRepository,
};
use support::{at, lead, TestDatabase};

const USER: &str = "user-1";

fn ids(event: &str, task: Option<&str>) -> SyncedIds {
    SyncedIds { event_id: event.to_string(), task_id: task.map(ToString::to_string) }
}

#[tokio::test(flavor = "multi_thread")]
async fn appointment_round_trips_through_the_store() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "(11) 98765-4321", LeadStage::InContact, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());

    let appointment = Appointment::pending(
        USER,
        maria.id,
        at("2024-03-15T17:00:00Z"),
        Some("Discuss proposal".into()),
        at("2024-03-10T09:00:00Z"),
    );
    repo.insert_appointment(&appointment).await.unwrap();

    let stored = repo.get_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored, appointment);
    assert!(repo.get_appointment(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn schema_rejects_synced_rows_without_event_id() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;

    let err = db
        .execute(&format!(
            "INSERT INTO appointments (id, user_id, lead_id, data_agendamento, status,
                 synced_with_google, google_event_id, created_at, updated_at)
             VALUES ('a-1', '{USER}', '{}', 0, 'pendente', 1, NULL, 0, 0)",
            maria.id
        ))
        .unwrap_err();
    assert!(err.to_string().contains("CHECK"), "unexpected error: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn repository_refuses_to_insert_broken_sync_flag() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());

    let mut appointment =
        Appointment::pending(USER, maria.id, at("2024-03-15T17:00:00Z"), None, at("2024-03-10T09:00:00Z"));
    appointment.synced_with_google = true;

    let err = repo.insert_appointment(&appointment).await.unwrap_err();
    assert!(matches!(err, LeadSyncError::Internal(_)));
    assert!(repo.get_appointment(appointment.id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn event_id_is_unique_per_user() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());
    let now = at("2024-03-10T09:00:00Z");

    let first = Appointment::pending(USER, maria.id, at("2024-03-15T17:00:00Z"), None, now)
        .with_remote_ids(ids("evt-1", None))
        .unwrap();
    repo.insert_appointment(&first).await.unwrap();

    let duplicate = Appointment::pending(USER, maria.id, at("2024-03-16T17:00:00Z"), None, now)
        .with_remote_ids(ids("evt-1", None))
        .unwrap();
    let err = repo.insert_appointment(&duplicate).await.unwrap_err();
    assert!(err.to_string().contains("unique constraint"), "unexpected error: {err}");

    let found = repo.find_by_google_event_id(USER, "evt-1").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
    assert!(repo.find_by_google_event_id("someone-else", "evt-1").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn mark_synced_only_applies_once() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());
    let now = at("2024-03-10T09:00:00Z");

    let appointment = Appointment::pending(USER, maria.id, at("2024-03-15T17:00:00Z"), None, now);
    repo.insert_appointment(&appointment).await.unwrap();

    let first = repo.mark_synced(appointment.id, &ids("evt-1", Some("task-1")), now).await.unwrap();
    assert_eq!(first, MarkSyncedOutcome::Updated);

    let second = repo.mark_synced(appointment.id, &ids("evt-2", None), now).await.unwrap();
    assert_eq!(second, MarkSyncedOutcome::AlreadySynced);

    let missing = repo.mark_synced(uuid::Uuid::new_v4(), &ids("evt-3", None), now).await.unwrap();
    assert_eq!(missing, MarkSyncedOutcome::Missing);

    let stored = repo.get_appointment(appointment.id).await.unwrap().unwrap();
    assert!(stored.synced_with_google);
    assert_eq!(stored.google_event_id.as_deref(), Some("evt-1"));
    assert_eq!(stored.google_task_id.as_deref(), Some("task-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn status_update_is_conditional_on_current_status() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());
    let now = at("2024-03-10T09:00:00Z");

    let appointment = Appointment::pending(USER, maria.id, at("2024-03-15T17:00:00Z"), None, now);
    repo.insert_appointment(&appointment).await.unwrap();

    let later = now + Duration::hours(1);
    assert!(repo
        .update_status(appointment.id, AppointmentStatus::Pending, AppointmentStatus::Completed, later)
        .await
        .unwrap());
    assert!(!repo
        .update_status(appointment.id, AppointmentStatus::Pending, AppointmentStatus::Cancelled, later)
        .await
        .unwrap());

    let stored = repo.get_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
    assert_eq!(stored.updated_at, later);
}

#[tokio::test(flavor = "multi_thread")]
async fn lead_and_time_lookup_prefers_unsynced_rows() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());
    let when = at("2024-03-15T17:00:00Z");

    let synced = Appointment::pending(USER, maria.id, when, None, at("2024-03-10T09:00:00Z"))
        .with_remote_ids(ids("evt-1", None))
        .unwrap();
    let unsynced = Appointment::pending(USER, maria.id, when, None, at("2024-03-11T09:00:00Z"));
    repo.insert_appointment(&synced).await.unwrap();
    repo.insert_appointment(&unsynced).await.unwrap();

    let found = repo.find_by_lead_and_time(USER, maria.id, when).await.unwrap().unwrap();
    assert_eq!(found.id, unsynced.id);

    let other_time = repo
        .find_by_lead_and_time(USER, maria.id, when + Duration::minutes(1))
        .await
        .unwrap();
    assert!(other_time.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_with_task_excludes_finished_and_taskless() {
    let db = TestDatabase::new();
    let maria = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    db.seed_lead(&maria).await;
    let repo = SqliteAppointmentRepository::new(db.manager.clone());
    let now = at("2024-03-10T09:00:00Z");

    let with_task = Appointment::pending(USER, maria.id, at("2024-03-15T17:00:00Z"), None, now)
        .with_remote_ids(ids("evt-1", Some("task-1")))
        .unwrap();
    let without_task = Appointment::pending(USER, maria.id, at("2024-03-16T17:00:00Z"), None, now)
        .with_remote_ids(ids("evt-2", None))
        .unwrap();
    let done = Appointment::pending(USER, maria.id, at("2024-03-17T17:00:00Z"), None, now)
        .with_remote_ids(ids("evt-3", Some("task-3")))
        .unwrap();
    for appointment in [&with_task, &without_task, &done] {
        repo.insert_appointment(appointment).await.unwrap();
    }
    repo.update_status(done.id, AppointmentStatus::Pending, AppointmentStatus::Completed, now)
        .await
        .unwrap();

    let pending = repo.list_pending_with_task(USER).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, with_task.id);
}

#[tokio::test(flavor = "multi_thread")]
async fn leads_are_scoped_to_their_owner() {
    let db = TestDatabase::new();
    let repo = SqliteLeadRepository::new(db.manager.clone());
    let mine = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    let theirs = lead("user-2", "João", "21912345678", LeadStage::New, at("2024-03-01T12:00:00Z"));
    repo.upsert_lead(&mine).await.unwrap();
    repo.upsert_lead(&theirs).await.unwrap();

    assert_eq!(repo.get_lead(USER, mine.id).await.unwrap(), Some(mine.clone()));
    assert!(repo.get_lead(USER, theirs.id).await.unwrap().is_none());

    let listed = repo.list_leads(USER).await.unwrap();
    assert_eq!(listed, vec![mine]);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_leads_and_conditional_stage_moves() {
    let db = TestDatabase::new();
    let repo = SqliteLeadRepository::new(db.manager.clone());
    let stale = lead(USER, "Maria", "11987654321", LeadStage::New, at("2024-03-01T12:00:00Z"));
    let fresh = lead(USER, "Ana", "11911112222", LeadStage::New, at("2024-03-09T12:00:00Z"));
    let other_stage = lead(USER, "Rui", "11933334444", LeadStage::Won, at("2024-02-01T12:00:00Z"));
    for l in [&stale, &fresh, &other_stage] {
        repo.upsert_lead(l).await.unwrap();
    }

    let cutoff = at("2024-03-03T00:00:00Z");
    let found = repo.find_stale_leads(LeadStage::New, cutoff).await.unwrap();
    assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![stale.id]);

    let moved_at = at("2024-03-10T00:00:00Z");
    assert!(repo.update_stage(stale.id, LeadStage::New, LeadStage::InContact, moved_at).await.unwrap());
    assert!(!repo.update_stage(stale.id, LeadStage::New, LeadStage::InContact, moved_at).await.unwrap());

    let moved = repo.get_lead(USER, stale.id).await.unwrap().unwrap();
    assert_eq!(moved.stage, LeadStage::InContact);
    assert_eq!(moved.updated_at, moved_at);
    assert!(repo.find_stale_leads(LeadStage::New, cutoff).await.unwrap().is_empty());
}

fn token(user_id: &str, access: &str) -> ConnectionToken {
    let now = at("2024-03-10T09:00:00Z");
    ConnectionToken {
        user_id: user_id.to_string(),
        access_token: access.to_string(),
        refresh_token: Some(format!("refresh-{user_id}")),
        expires_at: Some(now + Duration::hours(1)),
        sync_enabled: true,
        last_sync_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn token_upsert_replaces_the_single_row_per_user() {
    let db = TestDatabase::new();
    let repo = SqliteConnectionTokenRepository::new(db.manager.clone());

    repo.upsert_token(&token(USER, "access-1")).await.unwrap();
    repo.upsert_token(&token(USER, "access-2")).await.unwrap();

    let stored = repo.get_token(USER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-user-1"));

    let conn = db.manager.get_connection().unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM connection_tokens WHERE user_id = ?1", [USER], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn connected_users_excludes_paused_sync() {
    let db = TestDatabase::new();
    let repo = SqliteConnectionTokenRepository::new(db.manager.clone());

    repo.upsert_token(&token("user-b", "a")).await.unwrap();
    repo.upsert_token(&token("user-a", "b")).await.unwrap();
    repo.upsert_token(&token("user-c", "c")).await.unwrap();
    assert!(repo.set_sync_enabled("user-c", false, at("2024-03-11T00:00:00Z")).await.unwrap());
    assert!(!repo.set_sync_enabled("ghost", false, at("2024-03-11T00:00:00Z")).await.unwrap());

    assert_eq!(repo.list_connected_users().await.unwrap(), vec!["user-a", "user-b"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn token_delete_and_last_sync() {
    let db = TestDatabase::new();
    let repo = SqliteConnectionTokenRepository::new(db.manager.clone());
    repo.upsert_token(&token(USER, "access-1")).await.unwrap();

    let synced_at = at("2024-03-12T08:00:00Z");
    repo.touch_last_sync(USER, synced_at).await.unwrap();
    assert_eq!(repo.get_token(USER).await.unwrap().unwrap().last_sync_at, Some(synced_at));

    assert!(repo.delete_token(USER).await.unwrap());
    assert!(!repo.delete_token(USER).await.unwrap());
    assert!(repo.get_token(USER).await.unwrap().is_none());
}
