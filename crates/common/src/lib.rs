//! Common utilities shared across LeadSync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: OAuth token types and PKCE helpers
//! - `observability`: tracing subscriber setup
//! - `runtime`: foundation + observability
//! - `platform`: SQLite connection pooling
//! - `test-utils`: temporary directories and databases for tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "observability")]
pub mod observability;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub mod testing;

#[cfg(feature = "foundation")]
pub use auth::{PKCEChallenge, TokenResponse, TokenSet};
#[cfg(feature = "observability")]
pub use observability::{init_tracing, redact_user_id, LogFormat};
#[cfg(feature = "platform")]
pub use storage::{SqliteConnection, SqlitePool, SqlitePoolConfig, StorageError, StorageResult};
