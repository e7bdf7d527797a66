use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::debug;

use super::{RecallContext, RecallStrategy};
use crate::db::FoodStore;
use crate::models::{Candidate, RecallSource};

/// Community recall: foods that entered the catalog through approved
/// community suggestions. The signal carries no quality ordering; with a
/// configured seed the list is shuffled deterministically for variety,
/// without one it is served in store order (arbitrary by contract).
pub struct CommunityRecallStrategy {
    foods: Arc<dyn FoodStore>,
    shuffle_seed: Option<u64>,
}

impl CommunityRecallStrategy {
    pub fn new(foods: Arc<dyn FoodStore>, shuffle_seed: Option<u64>) -> Self {
        Self {
            foods,
            shuffle_seed,
        }
    }
}

#[async_trait]
impl RecallStrategy for CommunityRecallStrategy {
    async fn recall(&self, _ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>> {
        let mut foods = self.foods.approved_community_foods(limit).await?;

        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed);
            foods.shuffle(&mut rng);
        }

        debug!(count = foods.len(), "community recall completed");

        Ok(foods
            .into_iter()
            .map(|food| Candidate {
                food,
                source: RecallSource::Community,
            })
            .collect())
    }

    fn source(&self) -> RecallSource {
        RecallSource::Community
    }
}
