//! Calendar connection state per user

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored OAuth credentials for one user.
///
/// A user is connected when the row exists and `sync_enabled` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionToken {
    pub user_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub sync_enabled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionToken {
    /// Whether this token makes the user count as connected.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.sync_enabled
    }

    /// Whether the access token expires within `threshold_secs` of `now`.
    ///
    /// Tokens without a known expiry are used as-is.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>, threshold_secs: i64) -> bool {
        let horizon = Duration::try_seconds(threshold_secs.max(0))
            .and_then(|threshold| now.checked_add_signed(threshold))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.expires_at.is_some_and(|exp| horizon >= exp)
    }
}

/// Connection lifecycle as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    PendingAuthorization,
    Connected,
}

crate::impl_domain_status_conversions!(ConnectionState {
    Disconnected => "disconnected",
    PendingAuthorization => "pending_authorization",
    Connected => "connected",
});

/// Where to send the user to grant access, and the CSRF state to expect back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// How a bounded wait for connection confirmation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionWait {
    Connected,
    TimedOut,
    Cancelled,
}
