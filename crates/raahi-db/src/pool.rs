//! Connection pool creation and configuration.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled SQLite connections.
    pub pool_max_size: u32,

    /// How long a checkout waits for a free connection, in milliseconds.
    /// Session reads sit on the turn's hot path, so this stays well under
    /// r2d2's 30 second default.
    pub checkout_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            checkout_timeout_ms: 5_000,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Per-connection setup: WAL journal, relaxed fsync, busy timeout.
fn configure_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    // In-memory databases answer "memory".
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("expected WAL journal mode, got: {}", journal_mode)),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = {};",
        busy_timeout_ms
    ))
}

/// Opens the pool backing sessions and the knowledge index.
///
/// `db_path` may be `:memory:`, but every pooled connection then opens its
/// own private database; use a file path when more than one connection must
/// see the same data.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the first connections cannot be opened.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let busy_timeout_ms = settings.busy_timeout_ms;
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| configure_connection(conn, busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(Duration::from_millis(settings.checkout_timeout_ms))
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "opened sqlite pool"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_pool_uses_wal_and_configured_limits() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("raahi.db");
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 3,
            checkout_timeout_ms: 750,
        };

        let pool = create_pool(path.to_str().unwrap(), settings).expect("pool should build");
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert_eq!(mode, "wal");

        let synchronous: i64 = conn
            .query_row("PRAGMA synchronous;", [], |row| row.get(0))
            .expect("should query synchronous");
        assert_eq!(synchronous, 1);

        let busy_timeout: i64 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500);

        assert_eq!(pool.max_size(), 3);
        assert_eq!(pool.connection_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn exhausted_pool_fails_fast() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("raahi.db");
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 100,
            pool_max_size: 1,
            checkout_timeout_ms: 100,
        };
        let pool = create_pool(path.to_str().unwrap(), settings).expect("pool should build");

        let _held = pool.get().expect("first checkout");
        assert!(pool.get().is_err());
    }
}
