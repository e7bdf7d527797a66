/// Admin Moderation Handlers
///
/// Community-suggestion review queue. Approved suggestions surface through
/// the community recall generator.
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::SuggestionRepo;
use crate::error::{AppError, Result};
use crate::models::{CommunitySuggestion, SuggestionStatus};

pub struct AdminHandlerState {
    pub suggestions: Arc<SuggestionRepo>,
}

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub suggestions: Vec<CommunitySuggestion>,
    pub count: usize,
}

/// GET /api/v1/admin/suggestions/pending
#[get("/api/v1/admin/suggestions/pending")]
pub async fn list_pending_suggestions(
    state: web::Data<AdminHandlerState>,
    query: web::Query<PendingQuery>,
) -> Result<HttpResponse> {
    let suggestions = state.suggestions.pending(query.limit.clamp(1, 100)).await?;
    Ok(HttpResponse::Ok().json(PendingResponse {
        count: suggestions.len(),
        suggestions,
    }))
}

/// POST /api/v1/admin/suggestions/{suggestion_id}/approve
#[post("/api/v1/admin/suggestions/{suggestion_id}/approve")]
pub async fn approve_suggestion(
    state: web::Data<AdminHandlerState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    moderate(&state, &path.into_inner(), SuggestionStatus::Approved).await
}

/// POST /api/v1/admin/suggestions/{suggestion_id}/reject
#[post("/api/v1/admin/suggestions/{suggestion_id}/reject")]
pub async fn reject_suggestion(
    state: web::Data<AdminHandlerState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    moderate(&state, &path.into_inner(), SuggestionStatus::Rejected).await
}

async fn moderate(
    state: &AdminHandlerState,
    suggestion_id: &str,
    status: SuggestionStatus,
) -> Result<HttpResponse> {
    if state.suggestions.set_status(suggestion_id, status).await? {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "status": status.as_str() })))
    } else {
        Err(AppError::NotFound(format!(
            "Unknown suggestion: {}",
            suggestion_id
        )))
    }
}
