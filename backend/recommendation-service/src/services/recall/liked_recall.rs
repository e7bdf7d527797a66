use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{RecallContext, RecallStrategy};
use crate::db::FoodStore;
use crate::models::{Candidate, RecallSource};

/// Liked recall: the user's own previously-liked foods, list order, capped.
pub struct LikedRecallStrategy {
    foods: Arc<dyn FoodStore>,
}

impl LikedRecallStrategy {
    pub fn new(foods: Arc<dyn FoodStore>) -> Self {
        Self { foods }
    }
}

#[async_trait]
impl RecallStrategy for LikedRecallStrategy {
    async fn recall(&self, ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>> {
        if ctx.user.liked_foods.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ctx.user.liked_foods.iter().take(limit).cloned().collect();
        let foods = self.foods.get_many(&ids).await?;

        debug!(
            user_id = %ctx.user.user_id,
            count = foods.len(),
            "liked recall completed"
        );

        Ok(foods
            .into_iter()
            .map(|food| Candidate {
                food,
                source: RecallSource::Liked,
            })
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Liked
    }
}
