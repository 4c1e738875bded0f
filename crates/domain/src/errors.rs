//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for LeadSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LeadSyncError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Calendar not connected: {0}")]
    NotConnected(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No match: {0}")]
    NoMatch(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for LeadSync operations
pub type Result<T> = std::result::Result<T, LeadSyncError>;
