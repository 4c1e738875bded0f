//! SQLite storage primitives
//!
//! An r2d2 connection pool over `rusqlite` with per-connection pragmas.
//! Schema ownership stays with the application layer.

pub mod config;
pub mod error;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use error::{StorageError, StorageResult};
pub use pool::{SqliteConnection, SqlitePool};
pub use pragmas::apply_connection_pragmas;
