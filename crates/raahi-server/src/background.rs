//! Background tasks for the Raahi server.
//!
//! Includes:
//! - Purging expired sessions.
//! - Seeding the knowledge index at startup.

use crate::config::SeedDocument;
use raahi_knowledge::KnowledgeIndex;
use raahi_session::SqliteSessionStore;
use tokio::time::{sleep, Duration};

/// Starts the expired-session purge task.
///
/// Reads already ignore expired rows; this only reclaims space.
pub async fn start_session_purge_task(store: SqliteSessionStore, interval_seconds: u64) {
    if interval_seconds == 0 {
        tracing::warn!("session purge task disabled (interval=0)");
        return;
    }

    let interval = Duration::from_secs(interval_seconds);
    tracing::info!(interval_seconds, "starting session purge task");

    loop {
        sleep(interval).await;

        match store.purge_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(count = removed, "purged expired sessions"),
            Err(e) => tracing::error!("failed to purge expired sessions: {}", e),
        }
    }
}

/// Upserts the seed documents. Failures are logged and skipped.
///
/// Returns how many documents were stored.
pub async fn seed_knowledge(index: &KnowledgeIndex, documents: &[SeedDocument]) -> usize {
    let mut stored = 0;
    for doc in documents {
        match index.upsert(&doc.id, &doc.text).await {
            Ok(()) => stored += 1,
            Err(e) => tracing::warn!(id = %doc.id, error = %e, "failed to seed knowledge document"),
        }
    }
    if stored > 0 {
        tracing::info!(count = stored, "seeded knowledge index");
    }
    stored
}
