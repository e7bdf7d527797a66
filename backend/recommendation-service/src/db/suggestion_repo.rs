use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CommunitySuggestion, SuggestionStatus};

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    suggestion_id: String,
    user_id: String,
    suggestion: String,
    food_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<SuggestionRow> for CommunitySuggestion {
    fn from(row: SuggestionRow) -> Self {
        let status = match row.status.as_str() {
            "approved" => SuggestionStatus::Approved,
            "rejected" => SuggestionStatus::Rejected,
            _ => SuggestionStatus::Pending,
        };
        CommunitySuggestion {
            suggestion_id: row.suggestion_id,
            user_id: row.user_id,
            suggestion: row.suggestion,
            food_id: row.food_id,
            status,
            created_at: row.created_at,
        }
    }
}

/// Moderation queue for community dish suggestions. Approved entries feed
/// the community recall generator through the foods join.
pub struct SuggestionRepo {
    pool: PgPool,
}

impl SuggestionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        suggestion: &str,
        food_id: Option<&str>,
    ) -> Result<CommunitySuggestion> {
        let entry = CommunitySuggestion {
            suggestion_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            suggestion: suggestion.to_string(),
            food_id: food_id.map(String::from),
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO community_suggestions \
             (suggestion_id, user_id, suggestion, food_id, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&entry.suggestion_id)
        .bind(&entry.user_id)
        .bind(&entry.suggestion)
        .bind(&entry.food_id)
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert community suggestion")?;

        Ok(entry)
    }

    pub async fn pending(&self, limit: usize) -> Result<Vec<CommunitySuggestion>> {
        let rows = sqlx::query_as::<_, SuggestionRow>(
            "SELECT suggestion_id, user_id, suggestion, food_id, status, created_at \
             FROM community_suggestions WHERE status = 'pending' \
             ORDER BY created_at ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch pending suggestions")?;

        Ok(rows.into_iter().map(CommunitySuggestion::from).collect())
    }

    /// Returns false when no suggestion with the given id exists.
    pub async fn set_status(&self, suggestion_id: &str, status: SuggestionStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE community_suggestions SET status = $2 WHERE suggestion_id = $1",
        )
        .bind(suggestion_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update suggestion status")?;

        Ok(result.rows_affected() > 0)
    }
}
