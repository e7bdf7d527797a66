use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;

use super::UserStore;
use crate::models::{FeedbackAction, User};

pub struct PgUserStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    username: Option<String>,
    preferences: Option<Json<HashMap<String, String>>>,
    liked_foods: Option<Vec<String>>,
    disliked_foods: Option<Vec<String>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.username,
            preferences: row.preferences.map(|p| p.0).unwrap_or_default(),
            liked_foods: row.liked_foods.unwrap_or_default(),
            disliked_foods: row.disliked_foods.unwrap_or_default(),
        }
    }
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a like/dislike on the user's profile. Write path used by
    /// feedback ingestion only; the recommendation core never mutates users.
    pub async fn record_reaction(
        &self,
        user_id: &str,
        food_id: &str,
        action: FeedbackAction,
    ) -> Result<()> {
        let column = match action {
            FeedbackAction::Like => "liked_foods",
            FeedbackAction::Dislike => "disliked_foods",
        };
        // array_remove before array_append keeps the sets duplicate-free.
        let sql = format!(
            "UPDATE users SET {col} = array_append(array_remove(coalesce({col}, '{{}}'), $2), $2) \
             WHERE user_id = $1",
            col = column
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(food_id)
            .execute(&self.pool)
            .await
            .context("Failed to record user reaction")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT user_id, username, preferences, liked_foods, disliked_foods \
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;
        Ok(row.map(User::from))
    }
}
