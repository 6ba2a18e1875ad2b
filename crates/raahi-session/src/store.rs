//! Persistence operations for conversation sessions.
//!
//! Writes go through [`save_session`], which upserts the whole state and
//! pushes the expiry forward. Reads go through [`load_session`], which treats
//! an expired row exactly like a missing one. Expired rows are physically
//! removed by [`purge_expired`].

use std::time::Duration;

use async_trait::async_trait;
use raahi_db::DbPool;
use raahi_types::TripState;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::SessionError;

/// Keyed, TTL-backed storage of one [`TripState`] per caller phone.
///
/// Absence on `get` means "new session", not an error.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, phone: &str) -> Result<Option<TripState>, SessionError>;

    /// Stores `state` under `phone`, replacing any prior value.
    async fn put(&self, phone: &str, state: &TripState, ttl: Duration)
        -> Result<(), SessionError>;
}

/// Current wall-clock time in unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Loads the live session for `phone` as of `now_ms`.
///
/// # Errors
///
/// Returns `SessionError::Database` on SQL failure or
/// `SessionError::Serialization` if the stored state no longer parses.
pub fn load_session(
    conn: &Connection,
    phone: &str,
    now_ms: i64,
) -> Result<Option<TripState>, SessionError> {
    let state_json: Option<String> = conn
        .query_row(
            "SELECT state_json FROM trip_sessions WHERE phone = ?1 AND expires_at > ?2",
            params![phone, now_ms],
            |row| row.get(0),
        )
        .optional()?;

    match state_json {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Upserts `state` under `phone`, expiring `ttl` after `now_ms`.
///
/// Last write wins.
///
/// # Errors
///
/// Returns `SessionError::Database` on SQL failure.
pub fn save_session(
    conn: &Connection,
    phone: &str,
    state: &TripState,
    ttl: Duration,
    now_ms: i64,
) -> Result<(), SessionError> {
    let state_json = serde_json::to_string(state)?;
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let expires_at = now_ms.saturating_add(ttl_ms);

    conn.execute(
        "INSERT INTO trip_sessions (phone, state_json, expires_at, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(phone) DO UPDATE SET
            state_json = excluded.state_json,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at",
        params![phone, state_json, expires_at],
    )?;
    Ok(())
}

/// Deletes every session that expired at or before `now_ms`.
///
/// # Errors
///
/// Returns `SessionError::Database` on SQL failure.
pub fn purge_expired(conn: &Connection, now_ms: i64) -> Result<usize, SessionError> {
    let removed = conn.execute(
        "DELETE FROM trip_sessions WHERE expires_at <= ?1",
        params![now_ms],
    )?;
    Ok(removed)
}

/// [`SessionStore`] backed by the shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: DbPool,
}

impl SqliteSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Removes expired sessions; used by the periodic purge task.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            purge_expired(&conn, now_ms())
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))?
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, phone: &str) -> Result<Option<TripState>, SessionError> {
        let pool = self.pool.clone();
        let phone = phone.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            load_session(&conn, &phone, now_ms())
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))?
    }

    async fn put(
        &self,
        phone: &str,
        state: &TripState,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let pool = self.pool.clone();
        let phone = phone.to_string();
        let state = state.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            save_session(&conn, &phone, &state, ttl, now_ms())
        })
        .await
        .map_err(|e| SessionError::Task(e.to_string()))?
    }
}
