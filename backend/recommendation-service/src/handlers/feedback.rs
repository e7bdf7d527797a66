/// Feedback & Community API Handlers
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::SuggestionRepo;
use crate::error::{AppError, Result};
use crate::models::Feedback;
use crate::services::FeedbackService;

pub struct FeedbackHandlerState {
    pub feedback: Arc<FeedbackService>,
    pub suggestions: Arc<SuggestionRepo>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub user_id: String,
    pub suggestion: String,
    #[serde(default)]
    pub food_id: Option<String>,
}

/// POST /api/v1/feedback
#[post("/api/v1/feedback")]
pub async fn record_feedback(
    state: web::Data<FeedbackHandlerState>,
    body: web::Json<Feedback>,
) -> Result<HttpResponse> {
    if body.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }
    if body.food_id.is_none() && body.restaurant_id.is_none() {
        return Err(AppError::BadRequest(
            "feedback needs a food_id or restaurant_id".to_string(),
        ));
    }

    state.feedback.record(&body).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// POST /api/v1/suggestions
/// Community dish suggestion; lands in the moderation queue as pending.
#[post("/api/v1/suggestions")]
pub async fn submit_suggestion(
    state: web::Data<FeedbackHandlerState>,
    body: web::Json<SuggestionRequest>,
) -> Result<HttpResponse> {
    let user_id = body.user_id.trim();
    let suggestion = body.suggestion.trim();
    if user_id.is_empty() || suggestion.is_empty() {
        return Err(AppError::BadRequest(
            "user_id and suggestion are required".to_string(),
        ));
    }

    let entry = state
        .suggestions
        .insert(user_id, suggestion, body.food_id.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(entry))
}
