use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{RecallContext, RecallStrategy};
use crate::clients::{EmbeddingClient, VectorIndex};
use crate::models::{Candidate, RecallSource};

/// Neutral query used when the user's message carries no text to embed.
const DEFAULT_QUERY_TEXT: &str = "food";

/// Semantic recall: embed the free-text query and pull the nearest foods
/// from the vector index by cosine similarity.
pub struct VectorRecallStrategy {
    embedding: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
}

impl VectorRecallStrategy {
    pub fn new(embedding: Arc<dyn EmbeddingClient>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedding, index }
    }
}

#[async_trait]
impl RecallStrategy for VectorRecallStrategy {
    async fn recall(&self, ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>> {
        let query = if ctx.query.trim().is_empty() {
            DEFAULT_QUERY_TEXT
        } else {
            ctx.query.as_str()
        };

        let vector = self.embedding.embed(query).await?;
        let foods = self.index.search_foods(&vector, limit).await?;

        debug!(
            user_id = %ctx.user.user_id,
            query_len = query.len(),
            count = foods.len(),
            "vector recall completed"
        );

        Ok(foods
            .into_iter()
            .map(|food| Candidate {
                food,
                source: RecallSource::Vector,
            })
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Vector
    }
}
