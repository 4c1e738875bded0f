//! Scriptable in-memory calendar provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use leadsync_common::auth::TokenSet;
use leadsync_core::CalendarProvider;
use leadsync_domain::{
    ImportWindow, LeadSyncError, NewRemoteEvent, NewRemoteTask, RemoteEvent, RemoteTask,
    Result as DomainResult,
};

/// Records every call and fails on demand.
#[derive(Default, Clone)]
pub struct MockCalendarProvider {
    state: Arc<Mutex<ProviderState>>,
    next_id: Arc<AtomicUsize>,
}

#[derive(Default)]
struct ProviderState {
    unreachable: bool,
    fail_tasks: bool,
    reject_exchange: bool,
    fail_revoke: bool,
    events: Vec<RemoteEvent>,
    tasks: Vec<RemoteTask>,
    created_events: Vec<NewRemoteEvent>,
    created_tasks: Vec<NewRemoteTask>,
    revoked: Vec<String>,
    refreshed: Vec<String>,
    exchanged: Vec<(String, String)>,
    listed_windows: Vec<ImportWindow>,
}

impl MockCalendarProvider {
    /// Every network call fails with a provider error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn set_fail_tasks(&self, fail: bool) {
        self.state.lock().unwrap().fail_tasks = fail;
    }

    pub fn set_reject_exchange(&self, reject: bool) {
        self.state.lock().unwrap().reject_exchange = reject;
    }

    pub fn set_fail_revoke(&self, fail: bool) {
        self.state.lock().unwrap().fail_revoke = fail;
    }

    pub fn set_events(&self, events: Vec<RemoteEvent>) {
        self.state.lock().unwrap().events = events;
    }

    pub fn set_tasks(&self, tasks: Vec<RemoteTask>) {
        self.state.lock().unwrap().tasks = tasks;
    }

    pub fn created_events(&self) -> Vec<NewRemoteEvent> {
        self.state.lock().unwrap().created_events.clone()
    }

    pub fn created_tasks(&self) -> Vec<NewRemoteTask> {
        self.state.lock().unwrap().created_tasks.clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.state.lock().unwrap().revoked.clone()
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.state.lock().unwrap().refreshed.clone()
    }

    pub fn exchanged(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().exchanged.clone()
    }

    pub fn listed_windows(&self) -> Vec<ImportWindow> {
        self.state.lock().unwrap().listed_windows.clone()
    }

    /// Number of calls that would have reached the network.
    pub fn network_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.created_events.len()
            + state.created_tasks.len()
            + state.revoked.len()
            + state.refreshed.len()
            + state.exchanged.len()
            + state.listed_windows.len()
    }

    fn check_reachable(&self) -> DomainResult<()> {
        if self.state.lock().unwrap().unreachable {
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
impl CalendarProvider for MockCalendarProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> DomainResult<String> {
        Ok(format!(
            "https://auth.test/authorize?state={state}&code_challenge={code_challenge}&access_type=offline"
        ))
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> DomainResult<TokenSet> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.exchanged.push((code.to_string(), code_verifier.to_string()));
        if state.reject_exchange {
            return Err(LeadSyncError::Auth("invalid_grant".into()));
        }
        Ok(TokenSet::new(
            format!("access-{code}"),
            Some(format!("refresh-{code}")),
            3600,
            None,
        ))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> DomainResult<TokenSet> {
        self.check_reachable()?;
        self.state.lock().unwrap().refreshed.push(refresh_token.to_string());
        Ok(TokenSet::new(self.next("access"), None, 3600, None))
    }

    async fn revoke_token(&self, token: &str) -> DomainResult<()> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.revoked.push(token.to_string());
        if state.fail_revoke {
            return Err(LeadSyncError::Provider("revoke failed with status 400".into()));
        }
        Ok(())
    }

    async fn list_events(
        &self,
        _access_token: &str,
        window: &ImportWindow,
    ) -> DomainResult<Vec<RemoteEvent>> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        state.listed_windows.push(*window);
        Ok(state
            .events
            .iter()
            .filter(|e| e.start >= window.start && e.start <= window.end)
            .cloned()
            .collect())
    }

    async fn create_event(
        &self,
        _access_token: &str,
        event: &NewRemoteEvent,
    ) -> DomainResult<String> {
        self.check_reachable()?;
        self.state.lock().unwrap().created_events.push(event.clone());
        Ok(self.next("evt"))
    }

    async fn create_task(&self, _access_token: &str, task: &NewRemoteTask) -> DomainResult<String> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        if state.fail_tasks {
            return Err(LeadSyncError::Provider("tasks API returned 503".into()));
        }
        state.created_tasks.push(task.clone());
        drop(state);
        Ok(self.next("task"))
    }

    async fn list_tasks(&self, _access_token: &str) -> DomainResult<Vec<RemoteTask>> {
        self.check_reachable()?;
        Ok(self.state.lock().unwrap().tasks.clone())
    }
}
