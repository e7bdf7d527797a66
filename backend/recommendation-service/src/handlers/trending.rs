/// Trending API Handler
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::Food;
use crate::services::TrendingRecallStrategy;

pub struct TrendingHandlerState {
    pub trending: Arc<TrendingRecallStrategy>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub area: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub items: Vec<Food>,
    pub count: usize,
    pub area: Option<String>,
}

/// GET /api/v1/trending?area=&limit=
#[get("/api/v1/trending")]
pub async fn get_trending(
    state: web::Data<TrendingHandlerState>,
    query: web::Query<TrendingQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit.clamp(1, 50);
    let items = state
        .trending
        .trending(query.area.as_deref(), limit)
        .await?;

    Ok(HttpResponse::Ok().json(TrendingResponse {
        count: items.len(),
        items,
        area: query.area.clone(),
    }))
}
