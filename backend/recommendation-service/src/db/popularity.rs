/// Cumulative popularity scores over Redis sorted sets.
///
/// Keys:
/// - `popularity:foods` - global leaderboard, score = running like/dislike sum
/// - `popularity:foods:{area}` - per-area leaderboard (lowercased area)
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;

use super::PopularityStore;

const GLOBAL_KEY: &str = "popularity:foods";

pub struct RedisPopularityStore {
    client: redis::Client,
}

impl RedisPopularityStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn area_key(area: &str) -> String {
        format!("{}:{}", GLOBAL_KEY, area.trim().to_lowercase())
    }
}

#[async_trait]
impl PopularityStore for RedisPopularityStore {
    async fn top_by_score(&self, area: Option<&str>, limit: usize) -> Result<Vec<(String, f64)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis connection")?;

        let key = match area {
            Some(a) if !a.trim().is_empty() => Self::area_key(a),
            _ => GLOBAL_KEY.to_string(),
        };

        let results: Vec<(String, f64)> = conn
            .zrevrange_withscores(&key, 0, (limit - 1) as isize)
            .await
            .context("Failed to fetch popularity leaderboard")?;

        Ok(results)
    }

    async fn record_delta(&self, food_id: &str, area: Option<&str>, delta: f64) -> Result<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis connection")?;

        let _: f64 = conn
            .zincr(GLOBAL_KEY, food_id, delta)
            .await
            .context("Failed to update popularity score")?;

        if let Some(a) = area {
            if !a.trim().is_empty() {
                let _: f64 = conn
                    .zincr(Self::area_key(a), food_id, delta)
                    .await
                    .context("Failed to update area popularity score")?;
            }
        }

        Ok(())
    }
}
