//! Calendar provider and token store ports

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadsync_common::auth::TokenSet;
use leadsync_domain::{
    ConnectionToken, ImportWindow, NewRemoteEvent, NewRemoteTask, RemoteEvent, RemoteTask, Result,
};

/// Remote calendar + task provider (Google)
///
/// Errors are reported as `Provider` (transport, non-2xx, timeout) or `Auth`
/// (rejected grant).
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Authorize URL for an offline-access PKCE flow.
    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String>;

    /// Exchange an authorization code.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet>;

    /// Get a fresh access token.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet>;

    /// Revoke a token at the provider.
    async fn revoke_token(&self, token: &str) -> Result<()>;

    /// Non-cancelled events starting inside the window, all pages.
    async fn list_events(&self, access_token: &str, window: &ImportWindow)
        -> Result<Vec<RemoteEvent>>;

    /// Create an event, returning its id.
    async fn create_event(&self, access_token: &str, event: &NewRemoteEvent) -> Result<String>;

    /// Create a task, returning its id.
    async fn create_task(&self, access_token: &str, task: &NewRemoteTask) -> Result<String>;

    /// All tasks in the configured list, completed included.
    async fn list_tasks(&self, access_token: &str) -> Result<Vec<RemoteTask>>;
}

/// Per-user connection token store
#[async_trait]
pub trait ConnectionTokenRepository: Send + Sync {
    async fn get_token(&self, user_id: &str) -> Result<Option<ConnectionToken>>;

    /// Insert or replace the user's token row.
    async fn upsert_token(&self, token: &ConnectionToken) -> Result<()>;

    /// Delete the user's token; `false` if there was none.
    async fn delete_token(&self, user_id: &str) -> Result<bool>;

    /// Toggle sync; `false` if the user has no token.
    async fn set_sync_enabled(
        &self,
        user_id: &str,
        enabled: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn touch_last_sync(&self, user_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Users with a token and sync enabled.
    async fn list_connected_users(&self) -> Result<Vec<String>>;
}
