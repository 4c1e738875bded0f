//! OAuth connection manager
//!
//! Drives `disconnected -> pending_authorization -> connected`. Pending
//! logins (PKCE verifier keyed by CSRF state) live in memory for the length
//! of the confirmation window; tokens live in the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use leadsync_common::auth::{PKCEChallenge, TokenSet};
use leadsync_common::observability::redact_user_id;
use leadsync_domain::constants::STATUS_CACHE_MAX_CAPACITY;
use leadsync_domain::{
    AuthorizationRequest, Config, ConnectionState, ConnectionToken, ConnectionWait, LeadSyncError,
    Result,
};
use moka::future::Cache;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::ports::{CalendarProvider, ConnectionTokenRepository};

/// Timing knobs for the connection manager
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Store polling period while waiting for confirmation
    pub poll_interval: Duration,
    /// Upper bound on a confirmation wait; also the pending-login lifetime
    pub connect_timeout: Duration,
    /// `is_connected` cache TTL
    pub status_cache_ttl: Duration,
    /// Refresh access tokens expiring within this many seconds
    pub refresh_threshold_secs: i64,
}

impl ConnectionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.sync.poll_interval_ms.max(1)),
            connect_timeout: Duration::from_secs(config.sync.connect_timeout_secs),
            status_cache_ttl: Duration::from_secs(config.sync.status_cache_ttl_secs),
            refresh_threshold_secs: config.google.refresh_threshold_secs,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug)]
struct PendingLogin {
    user_id: String,
    code_verifier: String,
    started: Instant,
}

/// Establishes, confirms and tears down calendar authorization.
pub struct ConnectionManager {
    provider: Arc<dyn CalendarProvider>,
    tokens: Arc<dyn ConnectionTokenRepository>,
    pending: Mutex<HashMap<String, PendingLogin>>,
    connected: Notify,
    status_cache: Cache<String, bool>,
    settings: ConnectionSettings,
}

impl ConnectionManager {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        tokens: Arc<dyn ConnectionTokenRepository>,
        settings: ConnectionSettings,
    ) -> Self {
        let status_cache = Cache::builder()
            .time_to_live(settings.status_cache_ttl)
            .max_capacity(STATUS_CACHE_MAX_CAPACITY)
            .build();

        Self {
            provider,
            tokens,
            pending: Mutex::new(HashMap::new()),
            connected: Notify::new(),
            status_cache,
            settings,
        }
    }

    /// Start an authorization: returns the provider URL and the CSRF state.
    #[instrument(skip(self), fields(user = %redact_user_id(user_id)))]
    pub fn initiate_connect(&self, user_id: &str) -> Result<AuthorizationRequest> {
        let challenge = PKCEChallenge::generate();
        let url = self.provider.authorization_url(&challenge.state, &challenge.code_challenge)?;

        let mut pending = self.pending.lock();
        self.prune_expired(&mut pending);
        pending.insert(
            challenge.state.clone(),
            PendingLogin {
                user_id: user_id.to_string(),
                code_verifier: challenge.code_verifier,
                started: Instant::now(),
            },
        );
        drop(pending);

        debug!("authorization started");
        Ok(AuthorizationRequest { url, state: challenge.state })
    }

    /// Finish an authorization from the provider callback.
    ///
    /// A failed exchange leaves any stored token untouched.
    ///
    /// # Errors
    /// [`LeadSyncError::Auth`] for an unknown or expired `state`; provider
    /// and store errors otherwise.
    #[instrument(skip_all)]
    pub async fn complete_connect(&self, state: &str, code: &str) -> Result<ConnectionToken> {
        let login = {
            let mut pending = self.pending.lock();
            self.prune_expired(&mut pending);
            pending.remove(state)
        }
        .ok_or_else(|| LeadSyncError::Auth("unknown or expired authorization state".into()))?;

        let user_tag = redact_user_id(&login.user_id);
        let tokens = self.provider.exchange_code(code, &login.code_verifier).await?;

        let previous = self.tokens.get_token(&login.user_id).await?;
        let mut token = token_from_set(&login.user_id, tokens, previous.as_ref());
        token.sync_enabled = true;
        self.tokens.upsert_token(&token).await?;

        self.status_cache.invalidate(&login.user_id).await;
        self.connected.notify_waiters();

        info!(user = %user_tag, "calendar connected");
        Ok(token)
    }

    /// Wait until the user is connected, the window elapses or `cancel`
    /// fires.
    ///
    /// Wakes on in-process completion and also polls the store for tokens
    /// written elsewhere.
    #[instrument(skip(self, cancel), fields(user = %redact_user_id(user_id)))]
    pub async fn wait_for_connection(
        &self,
        user_id: &str,
        cancel: CancellationToken,
    ) -> ConnectionWait {
        let deadline = Instant::now() + self.settings.connect_timeout;
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // register before checking so a completion in between isn't lost
            let notified = self.connected.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lookup_connected(user_id).await.unwrap_or_else(|err| {
                warn!(error = %err, "connection check failed, will retry");
                false
            }) {
                self.status_cache.insert(user_id.to_string(), true).await;
                info!("connection confirmed");
                return ConnectionWait::Connected;
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("connection wait cancelled");
                    return ConnectionWait::Cancelled;
                }
                () = tokio::time::sleep_until(deadline) => {
                    debug!("connection wait timed out");
                    return ConnectionWait::TimedOut;
                }
                () = &mut notified => {}
                _ = ticker.tick() => {}
            }
        }
    }

    /// Revoke and forget the user's token. Succeeds when already
    /// disconnected.
    #[instrument(skip(self), fields(user = %redact_user_id(user_id)))]
    pub async fn disconnect(&self, user_id: &str) -> Result<()> {
        if let Some(token) = self.tokens.get_token(user_id).await? {
            let revocable = token.refresh_token.as_deref().unwrap_or(&token.access_token);
            if let Err(err) = self.provider.revoke_token(revocable).await {
                warn!(error = %err, "token revocation failed; removing local token anyway");
            }
            self.tokens.delete_token(user_id).await?;
            info!("calendar disconnected");
        } else {
            debug!("already disconnected");
        }

        self.pending.lock().retain(|_, login| login.user_id != user_id);
        self.status_cache.invalidate(user_id).await;
        Ok(())
    }

    /// Cached connection check.
    pub async fn is_connected(&self, user_id: &str) -> Result<bool> {
        self.status_cache
            .try_get_with(user_id.to_string(), self.lookup_connected(user_id))
            .await
            .map_err(|err| (*err).clone())
    }

    /// Current lifecycle state.
    pub async fn connection_state(&self, user_id: &str) -> Result<ConnectionState> {
        if self.is_connected(user_id).await? {
            return Ok(ConnectionState::Connected);
        }

        let mut pending = self.pending.lock();
        self.prune_expired(&mut pending);
        if pending.values().any(|login| login.user_id == user_id) {
            Ok(ConnectionState::PendingAuthorization)
        } else {
            Ok(ConnectionState::Disconnected)
        }
    }

    /// Valid access token, refreshed and persisted when close to expiry.
    ///
    /// # Errors
    /// [`LeadSyncError::NotConnected`] without an active token;
    /// [`LeadSyncError::Auth`] when the token expired and can't be refreshed.
    pub async fn access_token(&self, user_id: &str) -> Result<String> {
        let token = self
            .tokens
            .get_token(user_id)
            .await?
            .filter(ConnectionToken::is_active)
            .ok_or_else(|| LeadSyncError::NotConnected(redact_user_id(user_id)))?;

        if !token.needs_refresh(Utc::now(), self.settings.refresh_threshold_secs) {
            return Ok(token.access_token);
        }

        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            LeadSyncError::Auth("access token expired and no refresh token is stored".into())
        })?;

        let refreshed = self.provider.refresh_access_token(&refresh_token).await?;
        let updated = token_from_set(user_id, refreshed, Some(&token));
        self.tokens.upsert_token(&updated).await?;

        debug!(user = %redact_user_id(user_id), "access token refreshed");
        Ok(updated.access_token)
    }

    /// Pause or resume sync without dropping the token.
    pub async fn set_sync_enabled(&self, user_id: &str, enabled: bool) -> Result<()> {
        let found = self.tokens.set_sync_enabled(user_id, enabled, Utc::now()).await?;
        self.status_cache.invalidate(user_id).await;
        if found {
            Ok(())
        } else {
            Err(LeadSyncError::NotFound("calendar connection".into()))
        }
    }

    /// Stamp `last_sync_at`.
    pub async fn record_sync(&self, user_id: &str) -> Result<()> {
        self.tokens.touch_last_sync(user_id, Utc::now()).await
    }

    /// Users eligible for the periodic import.
    pub async fn connected_users(&self) -> Result<Vec<String>> {
        self.tokens.list_connected_users().await
    }

    async fn lookup_connected(&self, user_id: &str) -> Result<bool> {
        Ok(self.tokens.get_token(user_id).await?.is_some_and(|token| token.is_active()))
    }

    fn prune_expired(&self, pending: &mut HashMap<String, PendingLogin>) {
        let window = self.settings.connect_timeout;
        pending.retain(|_, login| login.started.elapsed() < window);
    }
}

/// Build the stored token from a provider response, keeping the previous
/// refresh token and sync flag when the provider omits them.
fn token_from_set(
    user_id: &str,
    tokens: TokenSet,
    previous: Option<&ConnectionToken>,
) -> ConnectionToken {
    let now = Utc::now();
    ConnectionToken {
        user_id: user_id.to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
        expires_at: tokens.expires_at,
        sync_enabled: previous.map_or(true, |p| p.sync_enabled),
        last_sync_at: previous.and_then(|p| p.last_sync_at),
        created_at: previous.map_or(now, |p| p.created_at),
        updated_at: now,
    }
}
