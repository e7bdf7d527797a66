use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::{RecallContext, RecallStrategy};
use crate::clients::VectorIndex;
use crate::db::{FoodStore, UserStore};
use crate::models::{Candidate, RecallSource};

/// Collaborative recall
///
/// 1. Find users whose preference vectors sit nearest to the target user's
///    (the index excludes the user themselves)
/// 2. Union the foods those users liked, first-seen order
/// 3. Hydrate up to `limit` of them from the food store
pub struct CollaborativeRecallStrategy {
    index: Arc<dyn VectorIndex>,
    users: Arc<dyn UserStore>,
    foods: Arc<dyn FoodStore>,
    similar_user_count: usize,
}

impl CollaborativeRecallStrategy {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        users: Arc<dyn UserStore>,
        foods: Arc<dyn FoodStore>,
        similar_user_count: usize,
    ) -> Self {
        Self {
            index,
            users,
            foods,
            similar_user_count,
        }
    }
}

#[async_trait]
impl RecallStrategy for CollaborativeRecallStrategy {
    async fn recall(&self, ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>> {
        let similar = self
            .index
            .similar_users(&ctx.user.user_id, self.similar_user_count)
            .await?;

        if similar.is_empty() {
            debug!(
                user_id = %ctx.user.user_id,
                "collaborative recall: no similar users"
            );
            return Ok(Vec::new());
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut candidate_ids: Vec<String> = Vec::new();
        for similar_user_id in &similar {
            let Some(profile) = self.users.get(similar_user_id).await? else {
                continue;
            };
            for food_id in profile.liked_foods {
                if seen.insert(food_id.clone()) {
                    candidate_ids.push(food_id);
                }
            }
        }
        candidate_ids.truncate(limit);

        let foods = self.foods.get_many(&candidate_ids).await?;

        info!(
            user_id = %ctx.user.user_id,
            similar_users = similar.len(),
            count = foods.len(),
            "collaborative recall completed"
        );

        Ok(foods
            .into_iter()
            .map(|food| Candidate {
                food,
                source: RecallSource::Collaborative,
            })
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Collaborative
    }
}
