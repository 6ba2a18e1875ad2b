//! Session store for the Raahi agent.
//!
//! Holds exactly one [`raahi_types::TripState`] per caller phone, with a
//! fixed idle TTL. An expired session is indistinguishable from one that
//! never existed, so the next turn for that phone starts again from the
//! greeting.
//!
//! # Usage
//!
//! ```rust,ignore
//! use raahi_session::{SessionStore, SqliteSessionStore};
//!
//! let store = SqliteSessionStore::new(pool);
//! let state = store.get("9999999999").await?;
//! store.put("9999999999", &next_state, Duration::from_secs(300)).await?;
//! ```

mod error;
mod store;

pub use error::SessionError;
pub use store::{
    load_session, now_ms, purge_expired, save_session, SessionStore, SqliteSessionStore,
};
