use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KnowledgeError;

/// A text embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a text string into a vector of floats.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    /// Builds an embedder whose every request is bounded by `timeout`.
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, KnowledgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KnowledgeError::Embedding(format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KnowledgeError::Embedding(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KnowledgeError::Embedding(format!(
                "embedding backend returned {}",
                status
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeError::Embedding(format!("invalid response body: {}", e)))?;

        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| KnowledgeError::Embedding("response contained no embedding".to_string()))
    }
}

/// Calculates the cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Cosine distance, `1 - similarity`. Smaller is nearer.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let v1 = vec![1.0, 0.0];
        let v2 = vec![1.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) - 1.0).abs() < 1e-5);

        let v3 = vec![0.0, 1.0];
        assert!((cosine_similarity(&v1, &v3)).abs() < 1e-5);

        let v4 = vec![-1.0, 0.0];
        assert!((cosine_similarity(&v1, &v4) - -1.0).abs() < 1e-5);
    }

    #[test]
    fn distance_orders_nearest_first() {
        let query = [1.0, 0.0];
        let near = [0.9, 0.1];
        let far = [0.0, 1.0];
        assert!(cosine_distance(&query, &near) < cosine_distance(&query, &far));
        assert!((cosine_distance(&query, &query)).abs() < 1e-5);
    }

    #[test]
    fn mismatched_or_zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
