/// Conversation API Handlers
///
/// Thin plumbing over the dialogue manager; input validation only.
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::DialogTurn;
use crate::services::DialogueManager;

pub struct ChatHandlerState {
    pub dialogue: Arc<DialogueManager>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FillSlotRequest {
    pub session_id: String,
    pub attribute: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<DialogTurn>,
}

/// POST /api/v1/chat
/// One conversational turn: a clarifying question or a recommendation.
#[post("/api/v1/chat")]
pub async fn chat(
    state: web::Data<ChatHandlerState>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let user_id = body.user_id.trim();
    let session_id = body.session_id.trim();
    let message = body.message.trim();

    if user_id.is_empty() || session_id.is_empty() {
        return Err(AppError::BadRequest(
            "user_id and session_id are required".to_string(),
        ));
    }
    if message.is_empty() {
        return Err(AppError::BadRequest("message must not be empty".to_string()));
    }

    let reply = state
        .dialogue
        .process_message(user_id, session_id, message)
        .await;
    Ok(HttpResponse::Ok().json(reply))
}

/// POST /api/v1/chat/slots
/// Explicit slot fill from a structured UI, bypassing the answer heuristic.
#[post("/api/v1/chat/slots")]
pub async fn fill_slot(
    state: web::Data<ChatHandlerState>,
    body: web::Json<FillSlotRequest>,
) -> Result<HttpResponse> {
    let attribute = body.attribute.trim();
    if body.session_id.trim().is_empty() || attribute.is_empty() {
        return Err(AppError::BadRequest(
            "session_id and attribute are required".to_string(),
        ));
    }

    if state
        .dialogue
        .record_answer(body.session_id.trim(), attribute, &body.value)
    {
        Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
    } else {
        Err(AppError::NotFound(format!(
            "Unknown session: {}",
            body.session_id.trim()
        )))
    }
}

/// GET /api/v1/chat/{session_id}/history
#[get("/api/v1/chat/{session_id}/history")]
pub async fn session_history(
    state: web::Data<ChatHandlerState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    let history = state
        .dialogue
        .session(&session_id)
        .map(|s| s.dialog_history)
        .unwrap_or_default();
    Ok(HttpResponse::Ok().json(HistoryResponse { history }))
}
