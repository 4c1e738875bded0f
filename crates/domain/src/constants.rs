//! Application constants
//!
//! Defaults for configuration sections and the Google endpoints.

// Google OAuth / API endpoints
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";
pub const GOOGLE_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const GOOGLE_TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TASK_LIST_ID: &str = "@default";

// Provider HTTP
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 300;
pub const MAX_REFRESH_THRESHOLD_SECS: i64 = 86_400;
pub const EVENTS_PAGE_SIZE: u32 = 250;
pub const TASKS_PAGE_SIZE: u32 = 100;

// Connection confirmation
pub const DEFAULT_CONNECT_POLL_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_STATUS_CACHE_TTL_SECS: u64 = 120;
pub const STATUS_CACHE_MAX_CAPACITY: u64 = 10_000;

// Event shape
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 30;
pub const MAX_EVENT_DURATION_MINUTES: i64 = 1_440;
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const EVENT_TITLE_PREFIX: &str = "Call";

// Import window
pub const DEFAULT_IMPORT_LOOKBACK_DAYS: i64 = 7;
pub const DEFAULT_IMPORT_LOOKAHEAD_DAYS: i64 = 30;
pub const MAX_IMPORT_WINDOW_DAYS: i64 = 3_650;
pub const DEFAULT_IMPORT_CRON: &str = "0 */15 * * * *";
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;

// Pipeline
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 7;
pub const MAX_STALE_AFTER_DAYS: i64 = 36_500;

// Storage / server
pub const DEFAULT_DB_PATH: &str = "leadsync.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 8;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

// Phone heuristics
pub const PHONE_TOKEN_MIN_DIGITS: usize = 10;
pub const PHONE_TOKEN_MAX_DIGITS: usize = 11;
