//! Application configuration
//!
//! Every section has defaults so a partial TOML/JSON file (or a handful of
//! environment variables) is enough to start the service.

use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_CALENDAR_ID, DEFAULT_CONNECT_POLL_INTERVAL_MS,
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_DB_PATH, DEFAULT_DB_POOL_SIZE,
    DEFAULT_EVENT_DURATION_MINUTES, DEFAULT_IMPORT_CRON, DEFAULT_IMPORT_LOOKAHEAD_DAYS,
    DEFAULT_IMPORT_LOOKBACK_DAYS, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_REFRESH_THRESHOLD_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STALE_AFTER_DAYS, DEFAULT_STATUS_CACHE_TTL_SECS,
    DEFAULT_TASK_LIST_ID, DEFAULT_TIMEZONE, GOOGLE_AUTHORIZATION_ENDPOINT,
    GOOGLE_CALENDAR_API_BASE, GOOGLE_CALENDAR_SCOPE, GOOGLE_REVOKE_ENDPOINT,
    GOOGLE_TASKS_API_BASE, GOOGLE_TASKS_SCOPE, GOOGLE_TOKEN_ENDPOINT, MAX_EVENT_DURATION_MINUTES,
    MAX_IMPORT_WINDOW_DAYS, MAX_REFRESH_THRESHOLD_SECS, MAX_STALE_AFTER_DAYS,
};
use crate::{LeadStage, LeadSyncError, Result};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub sync: SyncConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Check cross-field constraints that serde defaults can't express.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(LeadSyncError::Config("database.pool_size must be at least 1".into()));
        }
        if self.google.client_id.trim().is_empty() {
            return Err(LeadSyncError::Config("google.client_id must not be empty".into()));
        }
        if self.google.redirect_uri.trim().is_empty() {
            return Err(LeadSyncError::Config("google.redirect_uri must not be empty".into()));
        }
        if !(0..=MAX_REFRESH_THRESHOLD_SECS).contains(&self.google.refresh_threshold_secs) {
            return Err(LeadSyncError::Config(format!(
                "google.refresh_threshold_secs must be between 0 and {MAX_REFRESH_THRESHOLD_SECS}"
            )));
        }
        self.sync.timezone()?;
        if !(1..=MAX_EVENT_DURATION_MINUTES).contains(&self.sync.event_duration_minutes) {
            return Err(LeadSyncError::Config(format!(
                "sync.event_duration_minutes must be between 1 and {MAX_EVENT_DURATION_MINUTES}"
            )));
        }
        for (name, days) in [
            ("sync.import_lookback_days", self.sync.import_lookback_days),
            ("sync.import_lookahead_days", self.sync.import_lookahead_days),
        ] {
            if !(0..=MAX_IMPORT_WINDOW_DAYS).contains(&days) {
                return Err(LeadSyncError::Config(format!(
                    "{name} must be between 0 and {MAX_IMPORT_WINDOW_DAYS}"
                )));
            }
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(LeadSyncError::Config("sync.poll_interval_ms must be positive".into()));
        }
        let (from, to) = self.pipeline.stages()?;
        if from == to {
            return Err(LeadSyncError::Config(
                "pipeline.stale_from_stage and stale_to_stage must differ".into(),
            ));
        }
        if !(0..=MAX_STALE_AFTER_DAYS).contains(&self.pipeline.stale_after_days) {
            return Err(LeadSyncError::Config(format!(
                "pipeline.stale_after_days must be between 0 and {MAX_STALE_AFTER_DAYS}"
            )));
        }
        Ok(())
    }
}

/// SQLite store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: DEFAULT_DB_PATH.to_string(), pool_size: DEFAULT_DB_POOL_SIZE }
    }
}

/// Google OAuth client and API endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revoke_endpoint: String,
    pub calendar_api_base: String,
    pub tasks_api_base: String,
    pub calendar_id: String,
    pub task_list_id: String,
    pub scopes: Vec<String>,
    pub request_timeout_secs: u64,
    pub refresh_threshold_secs: i64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: format!("http://{DEFAULT_BIND_ADDRESS}/oauth/callback"),
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            revoke_endpoint: GOOGLE_REVOKE_ENDPOINT.to_string(),
            calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            tasks_api_base: GOOGLE_TASKS_API_BASE.to_string(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            task_list_id: DEFAULT_TASK_LIST_ID.to_string(),
            scopes: vec![GOOGLE_CALENDAR_SCOPE.to_string(), GOOGLE_TASKS_SCOPE.to_string()],
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
        }
    }
}

/// Synchronization behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub status_cache_ttl_secs: u64,
    pub event_duration_minutes: i64,
    pub timezone: String,
    pub import_lookback_days: i64,
    pub import_lookahead_days: i64,
    pub import_cron: String,
    pub job_timeout_secs: u64,
}

impl SyncConfig {
    /// Parsed IANA timezone used for created events.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::Config`] for an unknown zone name.
    pub fn timezone(&self) -> Result<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|_| LeadSyncError::Config(format!("unknown timezone: {}", self.timezone)))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_CONNECT_POLL_INTERVAL_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            status_cache_ttl_secs: DEFAULT_STATUS_CACHE_TTL_SECS,
            event_duration_minutes: DEFAULT_EVENT_DURATION_MINUTES,
            timezone: DEFAULT_TIMEZONE.to_string(),
            import_lookback_days: DEFAULT_IMPORT_LOOKBACK_DAYS,
            import_lookahead_days: DEFAULT_IMPORT_LOOKAHEAD_DAYS,
            import_cron: DEFAULT_IMPORT_CRON.to_string(),
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
        }
    }
}

/// Stale-lead pipeline job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stale_from_stage: String,
    pub stale_to_stage: String,
    pub stale_after_days: i64,
}

impl PipelineConfig {
    /// Parsed `(from, to)` stages.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::Config`] for an unknown stage name.
    pub fn stages(&self) -> Result<(LeadStage, LeadStage)> {
        let parse = |raw: &str| {
            LeadStage::from_str(raw).map_err(|e| LeadSyncError::Config(format!("pipeline: {e}")))
        };
        Ok((parse(&self.stale_from_stage)?, parse(&self.stale_to_stage)?))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stale_from_stage: LeadStage::New.to_string(),
            stale_to_stage: LeadStage::InContact.to_string(),
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
        }
    }
}

/// HTTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: DEFAULT_BIND_ADDRESS.to_string() }
    }
}
