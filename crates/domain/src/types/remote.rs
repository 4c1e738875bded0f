//! Provider-side calendar events and tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event listed from the user's calendar.
///
/// All-day events carry midnight UTC of their date as `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub all_day: bool,
}

/// Event to create on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemoteEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
}

/// Completion state of a provider task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteTaskStatus {
    NeedsAction,
    Completed,
}

/// A task listed from the user's task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub status: RemoteTaskStatus,
    pub due: Option<DateTime<Utc>>,
}

/// Task to create on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemoteTask {
    pub title: String,
    pub notes: Option<String>,
    pub due: DateTime<Utc>,
}
