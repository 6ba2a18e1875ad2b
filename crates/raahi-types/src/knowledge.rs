use serde::{Deserialize, Serialize};

/// A short text document in the knowledge index.
///
/// Replaced only by an explicit re-upsert under the same `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: String,
    pub content: String,
    /// Fixed-dimension embedding of `content`.
    pub embedding: Vec<f32>,
}
