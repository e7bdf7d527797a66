/// Read-side store abstractions consumed by the recommendation core, plus
/// their Postgres/Redis implementations. The core only sees the traits;
/// concrete wiring happens in `main`.
pub mod food_repo;
pub mod popularity;
pub mod suggestion_repo;
pub mod user_repo;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Food, Restaurant, User};

pub use food_repo::PgFoodStore;
pub use popularity::RedisPopularityStore;
pub use suggestion_repo::SuggestionRepo;
pub use user_repo::PgUserStore;

#[async_trait]
pub trait FoodStore: Send + Sync {
    async fn get(&self, food_id: &str) -> Result<Option<Food>>;

    /// Fetch several foods, preserving the order of the input ids. Unknown
    /// ids are silently skipped.
    async fn get_many(&self, food_ids: &[String]) -> Result<Vec<Food>>;

    /// Foods that entered the catalog through approved community
    /// suggestions.
    async fn approved_community_foods(&self, limit: usize) -> Result<Vec<Food>>;

    async fn restaurant(&self, restaurant_id: &str) -> Result<Option<Restaurant>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait PopularityStore: Send + Sync {
    /// Food ids with their cumulative like/dislike scores, best first,
    /// optionally restricted to an area.
    async fn top_by_score(&self, area: Option<&str>, limit: usize) -> Result<Vec<(String, f64)>>;

    /// Apply a feedback delta to a food's cumulative score (and the area
    /// leaderboard when the food is tied to one).
    async fn record_delta(&self, food_id: &str, area: Option<&str>, delta: f64) -> Result<()>;
}
