//! Configuration loader
//!
//! ## Loading Strategy
//! 1. `.env` is read (if present) into the process environment
//! 2. Environment variables are layered over the defaults; this requires at
//!    least `LEADSYNC_GOOGLE_CLIENT_ID`
//! 3. Otherwise the first config file found by [`probe_config_paths`] is used
//!
//! ## Environment Variables
//! - `LEADSYNC_DB_PATH`, `LEADSYNC_DB_POOL_SIZE`
//! - `LEADSYNC_GOOGLE_CLIENT_ID` (required), `LEADSYNC_GOOGLE_CLIENT_SECRET`,
//!   `LEADSYNC_GOOGLE_REDIRECT_URI`, `LEADSYNC_GOOGLE_CALENDAR_ID`,
//!   `LEADSYNC_GOOGLE_TASK_LIST_ID`
//! - `LEADSYNC_SYNC_TIMEZONE`, `LEADSYNC_SYNC_EVENT_DURATION_MINUTES`,
//!   `LEADSYNC_SYNC_CONNECT_TIMEOUT_SECS`, `LEADSYNC_SYNC_IMPORT_CRON`
//! - `LEADSYNC_PIPELINE_STALE_AFTER_DAYS`
//! - `LEADSYNC_BIND_ADDRESS`
//!
//! ## File Locations
//! `config.{toml,json}` and `leadsync.{toml,json}` in the working directory,
//! its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use leadsync_domain::{Config, LeadSyncError, Result};

const ENV_PREFIX: &str = "LEADSYNC_";
const FILE_STEMS: [&str; 2] = ["config", "leadsync"];
const FILE_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Load configuration from the environment, falling back to a file.
///
/// # Errors
/// Returns [`LeadSyncError::Config`] when neither source yields a config.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Build a config from `LEADSYNC_*` variables layered over the defaults.
///
/// # Errors
/// Returns [`LeadSyncError::Config`] if `LEADSYNC_GOOGLE_CLIENT_ID` is missing
/// or a numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.google.client_id = env_var("GOOGLE_CLIENT_ID")?;
    if let Some(secret) = env_opt("GOOGLE_CLIENT_SECRET") {
        config.google.client_secret = Some(secret);
    }
    if let Some(uri) = env_opt("GOOGLE_REDIRECT_URI") {
        config.google.redirect_uri = uri;
    }
    if let Some(id) = env_opt("GOOGLE_CALENDAR_ID") {
        config.google.calendar_id = id;
    }
    if let Some(id) = env_opt("GOOGLE_TASK_LIST_ID") {
        config.google.task_list_id = id;
    }

    if let Some(path) = env_opt("DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_parse("DB_POOL_SIZE")? {
        config.database.pool_size = size;
    }

    if let Some(tz) = env_opt("SYNC_TIMEZONE") {
        config.sync.timezone = tz;
    }
    if let Some(minutes) = env_parse("SYNC_EVENT_DURATION_MINUTES")? {
        config.sync.event_duration_minutes = minutes;
    }
    if let Some(secs) = env_parse("SYNC_CONNECT_TIMEOUT_SECS")? {
        config.sync.connect_timeout_secs = secs;
    }
    if let Some(cron) = env_opt("SYNC_IMPORT_CRON") {
        config.sync.import_cron = cron;
    }

    if let Some(days) = env_parse("PIPELINE_STALE_AFTER_DAYS")? {
        config.pipeline.stale_after_days = days;
    }

    if let Some(addr) = env_opt("BIND_ADDRESS") {
        config.server.bind_address = addr;
    }

    Ok(config)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations. The format is chosen
/// by extension (`.toml` or `.json`).
///
/// # Errors
/// Returns [`LeadSyncError::Config`] if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LeadSyncError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LeadSyncError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LeadSyncError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LeadSyncError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LeadSyncError::Config(format!("invalid JSON format: {e}"))),
        other => Err(LeadSyncError::Config(format!("unsupported config format: {other}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join(".."));
        dirs.insert(0, cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| {
            FILE_STEMS.iter().flat_map(move |stem| {
                FILE_EXTENSIONS.iter().map(move |ext| dir.join(format!("{stem}.{ext}")))
            })
        })
        .find(|candidate| candidate.exists())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        LeadSyncError::Config(format!("missing required environment variable: {ENV_PREFIX}{key}"))
    })
}

/// Set and non-blank.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                LeadSyncError::Config(format!("invalid value for {ENV_PREFIX}{key}: {e}"))
            })
        })
        .transpose()
}
