//! SQLite connection pool
//!
//! r2d2-based pooling for `rusqlite` connections. Every connection gets the
//! configured pragmas before it is handed out.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::time::Instant;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::error::{StorageError, StorageResult};
use super::pragmas::apply_connection_pragmas;

/// Pooled SQLite connection
///
/// Derefs to [`rusqlite::Connection`]; returned to the pool on drop.
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    fn new(inner: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner }
    }
}

impl Deref for SqliteConnection {
    type Target = rusqlite::Connection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// SQLite connection pool
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
    path: PathBuf,
}

impl SqlitePool {
    /// Open (or create) the database at `path` and build the pool.
    ///
    /// One connection is acquired eagerly so a bad path fails here rather
    /// than on first use.
    ///
    /// # Errors
    /// Returns an error if the parent directory can't be created or the pool
    /// can't open a connection.
    #[instrument(fields(db_path = %path.display(), pool_size = config.max_size))]
    pub fn open(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        if config.max_size == 0 {
            return Err(StorageError::InvalidConfig("pool size must be at least 1".into()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(path)
            .with_init(move |conn| apply_connection_pragmas(conn, &pragma_config));

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!(error = %e, "failed to create connection pool");
                StorageError::Connection(format!("failed to create pool: {e}"))
            })?;

        info!(max_connections = config.max_size, "sqlite pool created");

        Ok(Self { pool, config, path: path.to_path_buf() })
    }

    /// Acquire a connection from the pool.
    ///
    /// # Errors
    /// Returns [`StorageError::PoolExhausted`] when no connection frees up
    /// within the configured timeout.
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();
        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis(), "connection acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                warn!(error = %e, "failed to acquire connection");
                if start.elapsed() >= self.config.connection_timeout {
                    Err(StorageError::PoolExhausted)
                } else {
                    Err(StorageError::R2d2(e))
                }
            }
        }
    }

    /// Run `SELECT 1` on a pooled connection.
    ///
    /// # Errors
    /// Returns an error if no connection can be acquired or the query fails.
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
        Ok(())
    }

    /// Configured maximum pool size.
    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.config.max_size
    }

    /// Database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
