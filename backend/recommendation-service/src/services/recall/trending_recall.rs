use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{RecallContext, RecallStrategy};
use crate::db::{FoodStore, PopularityStore};
use crate::models::{Candidate, Food, RecallSource};

/// Trending recall: foods ranked by their cumulative like/dislike score,
/// optionally restricted to an area leaderboard.
pub struct TrendingRecallStrategy {
    popularity: Arc<dyn PopularityStore>,
    foods: Arc<dyn FoodStore>,
}

impl TrendingRecallStrategy {
    pub fn new(popularity: Arc<dyn PopularityStore>, foods: Arc<dyn FoodStore>) -> Self {
        Self { popularity, foods }
    }

    /// Score-ordered foods for an optional area. Also serves the trending
    /// dashboard endpoint directly.
    pub async fn trending(&self, area: Option<&str>, limit: usize) -> Result<Vec<Food>> {
        let scored = self.popularity.top_by_score(area, limit).await?;
        if scored.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = scored.into_iter().map(|(id, _)| id).collect();
        // get_many preserves the leaderboard order and drops ids that have
        // left the catalog.
        self.foods.get_many(&ids).await
    }
}

#[async_trait]
impl RecallStrategy for TrendingRecallStrategy {
    async fn recall(&self, ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>> {
        let foods = self.trending(ctx.area.as_deref(), limit).await?;

        debug!(
            area = ctx.area.as_deref().unwrap_or("all"),
            count = foods.len(),
            "trending recall completed"
        );

        Ok(foods
            .into_iter()
            .map(|food| Candidate {
                food,
                source: RecallSource::Trending,
            })
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Trending
    }
}
