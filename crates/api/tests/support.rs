//! Router harness backed by a temporary database and a scripted provider.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use leadsync_api::{router, AppContext};
use leadsync_common::auth::TokenSet;
use leadsync_common::testing::TempDir;
use leadsync_core::{AppointmentRepository, CalendarProvider};
use leadsync_domain::{
    Appointment, Config, ImportWindow, Lead, LeadStage, LeadSyncError, NewRemoteEvent,
    NewRemoteTask, RemoteEvent, RemoteTask, Result as DomainResult,
};
use leadsync_infra::{DbManager, SqliteAppointmentRepository, SqliteLeadRepository};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const USER: &str = "user-1";

/// Provider that hands out sequential ids, serves a scripted event list and
/// can be taken offline.
#[derive(Default)]
pub struct FakeProvider {
    offline: AtomicBool,
    next_id: AtomicUsize,
    created_events: AtomicUsize,
    events: Mutex<Vec<RemoteEvent>>,
}

impl FakeProvider {
    pub fn set_events(&self, events: Vec<RemoteEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn created_events(&self) -> usize {
        self.created_events.load(Ordering::SeqCst)
    }

    fn reachable(&self) -> DomainResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(LeadSyncError::Provider("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl CalendarProvider for FakeProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> DomainResult<String> {
        Ok(format!("https://auth.test/authorize?state={state}&code_challenge={code_challenge}"))
    }

    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> DomainResult<TokenSet> {
        self.reachable()?;
        if code == "bad-code" {
            return Err(LeadSyncError::Auth("invalid_grant: Bad Request".into()));
        }
        Ok(TokenSet::new("access-1".into(), Some("refresh-1".into()), 3600, None))
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> DomainResult<TokenSet> {
        self.reachable()?;
        Ok(TokenSet::new("access-2".into(), None, 3600, None))
    }

    async fn revoke_token(&self, _token: &str) -> DomainResult<()> {
        self.reachable()
    }

    async fn list_events(
        &self,
        _access_token: &str,
        window: &ImportWindow,
    ) -> DomainResult<Vec<RemoteEvent>> {
        self.reachable()?;
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|event| event.start >= window.start && event.start <= window.end)
            .cloned()
            .collect())
    }

    async fn create_event(
        &self,
        _access_token: &str,
        _event: &NewRemoteEvent,
    ) -> DomainResult<String> {
        self.reachable()?;
        self.created_events.fetch_add(1, Ordering::SeqCst);
        Ok(self.next("event"))
    }

    async fn create_task(
        &self,
        _access_token: &str,
        _task: &NewRemoteTask,
    ) -> DomainResult<String> {
        self.reachable()?;
        Ok(self.next("task"))
    }

    async fn list_tasks(&self, _access_token: &str) -> DomainResult<Vec<RemoteTask>> {
        self.reachable()?;
        Ok(Vec::new())
    }
}

pub fn test_config(db_path: &str) -> Config {
    let mut config = Config::default();
    config.database.path = db_path.to_string();
    config.google.client_id = "client-123.apps.googleusercontent.com".into();
    config.sync.poll_interval_ms = 10;
    config.sync.connect_timeout_secs = 5;
    config
}

pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub provider: Arc<FakeProvider>,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new("leadsync-api-test").expect("temp dir should be created");
        let db_path = temp_dir.path().join("leadsync.db");
        let config = test_config(&db_path.to_string_lossy());

        let db = DbManager::new(&db_path, 4).expect("db manager should be created");
        db.run_migrations().expect("schema migrations should apply");

        let provider = Arc::new(FakeProvider::default());
        let ctx = Arc::new(
            AppContext::with_provider(config, Arc::new(db), provider.clone())
                .expect("context should build"),
        );
        let router = router(ctx.clone());

        Self { ctx, provider, router, _temp_dir: temp_dir }
    }

    pub async fn seed_lead(&self, user_id: &str, phone: &str) -> Lead {
        let lead = Lead {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: "Maria Souza".into(),
            phone: phone.to_string(),
            secondary_phone: None,
            stage: LeadStage::InContact,
            profession: None,
            income_bracket: None,
            observations: None,
            updated_at: Utc::now() - Duration::days(1),
        };
        SqliteLeadRepository::new(self.ctx.db.clone())
            .upsert_lead(&lead)
            .await
            .expect("lead should persist");
        lead
    }

    /// Run the OAuth round trip through the HTTP surface.
    pub async fn connect(&self, user_id: &str) {
        let (status, body) =
            self.json(Method::POST, &format!("/users/{user_id}/calendar/connect"), None).await;
        assert_eq!(status, StatusCode::OK);
        let state = body["state"].as_str().expect("state in body").to_string();

        let (status, _) =
            self.text(Method::GET, &format!("/oauth/callback?code=good-code&state={state}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Appointment stored for a provider event, read straight from the store.
    pub async fn appointment_for_event(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> Option<Appointment> {
        SqliteAppointmentRepository::new(self.ctx.db.clone())
            .find_by_google_event_id(user_id, event_id)
            .await
            .expect("appointment lookup should succeed")
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request should build"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, value)
    }

    pub async fn text(&self, method: Method, uri: &str) -> (StatusCode, String) {
        let request =
            Request::builder().method(method).uri(uri).body(Body::empty()).expect("request");
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
