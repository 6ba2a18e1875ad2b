//! Knowledge index for the Raahi agent.
//!
//! Stores short policy and pricing snippets with their embeddings and
//! retrieves the nearest ones to a caller's utterance. Retrieval feeds the
//! reasoning step as free-text context.
//!
//! `upsert` propagates failures (ingestion is retry-able). `search` never
//! fails: an unreachable embedding backend or a storage error yields an empty
//! context string instead of aborting a conversation turn.

mod embedding;
mod error;
mod index;

pub use embedding::{cosine_distance, cosine_similarity, Embedder, HttpEmbedder};
pub use error::KnowledgeError;
pub use index::{
    get_document, nearest_documents, upsert_document, KnowledgeIndex, CONTEXT_SEPARATOR,
    DEFAULT_DIMENSION,
};
