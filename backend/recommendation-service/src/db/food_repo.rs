use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use super::FoodStore;
use crate::models::{Food, Restaurant};

const FOOD_COLUMNS: &str = "food_id, food_name, restaurant_id, description, category, \
     spice_level, veg_nonveg, ingredients, dish_type, popular_in, price_level, food_rating";

pub struct PgFoodStore {
    pool: PgPool,
}

impl PgFoodStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FoodStore for PgFoodStore {
    async fn get(&self, food_id: &str) -> Result<Option<Food>> {
        let sql = format!("SELECT {} FROM foods WHERE food_id = $1", FOOD_COLUMNS);
        let food = sqlx::query_as::<_, Food>(&sql)
            .bind(food_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch food")?;
        Ok(food)
    }

    async fn get_many(&self, food_ids: &[String]) -> Result<Vec<Food>> {
        if food_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM foods WHERE food_id = ANY($1)", FOOD_COLUMNS);
        let rows = sqlx::query_as::<_, Food>(&sql)
            .bind(food_ids)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch foods")?;

        // ANY($1) gives no ordering guarantee; restore the caller's order.
        let mut by_id: HashMap<&str, Food> = rows
            .iter()
            .map(|f| (f.food_id.as_str(), f.clone()))
            .collect();
        Ok(food_ids
            .iter()
            .filter_map(|id| by_id.remove(id.as_str()))
            .collect())
    }

    async fn approved_community_foods(&self, limit: usize) -> Result<Vec<Food>> {
        let sql = format!(
            "SELECT DISTINCT ON (f.food_id) {} \
             FROM foods f \
             JOIN community_suggestions s ON s.food_id = f.food_id \
             WHERE s.status = 'approved' \
             ORDER BY f.food_id \
             LIMIT $1",
            FOOD_COLUMNS
                .split(", ")
                .map(|c| format!("f.{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let foods = sqlx::query_as::<_, Food>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch community foods")?;
        Ok(foods)
    }

    async fn restaurant(&self, restaurant_id: &str) -> Result<Option<Restaurant>> {
        let restaurant = sqlx::query_as::<_, Restaurant>(
            "SELECT restaurant_id, restaurant_name, area, cuisine_types, price_level, avg_rating \
             FROM restaurants WHERE restaurant_id = $1",
        )
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch restaurant")?;
        Ok(restaurant)
    }
}
