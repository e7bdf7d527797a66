use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{FoodStore, PgUserStore, PopularityStore};
use crate::error::Result;
use crate::models::Feedback;

/// Feedback ingestion: interaction log, cumulative popularity scores, and
/// the user's liked/disliked sets. Runs outside the recommendation core;
/// the core only ever reads the results.
pub struct FeedbackService {
    pool: PgPool,
    foods: Arc<dyn FoodStore>,
    popularity: Arc<dyn PopularityStore>,
    users: Arc<PgUserStore>,
}

impl FeedbackService {
    pub fn new(
        pool: PgPool,
        foods: Arc<dyn FoodStore>,
        popularity: Arc<dyn PopularityStore>,
        users: Arc<PgUserStore>,
    ) -> Self {
        Self {
            pool,
            foods,
            popularity,
            users,
        }
    }

    pub async fn record(&self, feedback: &Feedback) -> Result<()> {
        sqlx::query(
            "INSERT INTO interactions (user_id, food_id, restaurant_id, action, comment, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&feedback.user_id)
        .bind(&feedback.food_id)
        .bind(&feedback.restaurant_id)
        .bind(feedback.action.as_str())
        .bind(&feedback.comment)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if let Some(food_id) = &feedback.food_id {
            // The area leaderboard follows the food's home area; an unknown
            // food still counts globally.
            let area = match self.foods.get(food_id).await {
                Ok(food) => food.and_then(|f| f.popular_in),
                Err(e) => {
                    warn!(food_id = food_id.as_str(), error = %e, "food lookup failed during feedback");
                    None
                }
            };

            self.popularity
                .record_delta(food_id, area.as_deref(), feedback.action.delta())
                .await?;

            self.users
                .record_reaction(&feedback.user_id, food_id, feedback.action)
                .await?;
        }

        info!(
            user_id = feedback.user_id.as_str(),
            food_id = feedback.food_id.as_deref().unwrap_or("-"),
            action = feedback.action.as_str(),
            "feedback recorded"
        );

        Ok(())
    }
}
