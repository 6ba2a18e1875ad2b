//! Database layer for the Raahi agent.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. Both the session store and the knowledge
//! index live in the same database file; their tables are created here.
//!
//! Migrations are compiled into the binary with `include_str!` and tracked in
//! `_raahi_migrations`, so re-running them on every startup is safe.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
