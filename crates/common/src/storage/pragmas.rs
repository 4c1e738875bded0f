//! SQLite pragma management
//!
//! Applied to every connection the pool hands out.

use rusqlite::Connection;

use super::config::SqlitePoolConfig;

/// Apply connection-level pragmas
///
/// - WAL mode for concurrent readers
/// - NORMAL synchronous mode
/// - Foreign key constraints
/// - Busy timeout for lock contention
///
/// Returns the raw `rusqlite` error so it can be used from the r2d2 init hook.
pub fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlitePoolConfig,
) -> rusqlite::Result<()> {
    if config.enable_wal {
        // journal_mode reports the resulting mode as a row
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }

    conn.pragma_update(None, "synchronous", "NORMAL")?;

    if config.enable_foreign_keys {
        conn.pragma_update(None, "foreign_keys", "ON")?;
    }

    conn.busy_timeout(config.busy_timeout)
}
