/// Recommendation API Handlers
///
/// Direct access to the fusion ranker and the uncertainty estimator for
/// non-conversational clients.
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{Food, User};
use crate::services::{FusionRanker, UncertaintyEstimator};

pub struct RecommendationHandlerState {
    pub ranker: Arc<FusionRanker>,
    pub users: Arc<dyn UserStore>,
    pub estimator: Arc<UncertaintyEstimator>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: HashMap<String, String>,
    /// Number of recommendations to return (default: 10, max: 50)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct RecommendedItem {
    #[serde(flatten)]
    pub food: Food,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub items: Vec<RecommendedItem>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UncertaintyQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct AttributeUncertainty {
    pub attribute: String,
    pub uncertainty: f64,
}

#[derive(Debug, Serialize)]
pub struct UncertaintyResponse {
    pub attributes: Vec<AttributeUncertainty>,
}

/// POST /api/v1/recommendations
#[post("/api/v1/recommendations")]
pub async fn get_recommendations(
    state: web::Data<RecommendationHandlerState>,
    body: web::Json<RecommendationRequest>,
) -> Result<HttpResponse> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }
    let limit = body.limit.clamp(1, 50);

    let user = state
        .users
        .get(user_id)
        .await?
        .unwrap_or_else(|| User::anonymous(user_id));

    let outcome = state
        .ranker
        .recommend(&user, body.query.trim(), &body.filters, limit)
        .await;

    let items: Vec<RecommendedItem> = outcome
        .items
        .into_iter()
        .map(|c| RecommendedItem {
            food: c.food,
            source: c.source.as_str(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(RecommendationResponse {
        count: items.len(),
        items,
    }))
}

/// GET /api/v1/attributes/uncertainty
/// Tracked attributes ranked by how little is known about the user, most
/// uncertain first.
#[get("/api/v1/attributes/uncertainty")]
pub async fn get_attribute_uncertainty(
    state: web::Data<RecommendationHandlerState>,
    query: web::Query<UncertaintyQuery>,
) -> Result<HttpResponse> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    let attributes: Vec<AttributeUncertainty> = state
        .estimator
        .ranked_attributes(user_id)
        .await
        .into_iter()
        .map(|(attribute, uncertainty)| AttributeUncertainty {
            attribute,
            uncertainty,
        })
        .collect();

    Ok(HttpResponse::Ok().json(UncertaintyResponse { attributes }))
}
