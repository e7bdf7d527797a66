/// Qdrant Vector Index Client
///
/// Nearest-neighbor lookups over the Qdrant REST API:
/// - food candidates by cosine similarity against the query embedding
///   (payloads carry full food records, hydrated directly)
/// - similar users by proximity of pre-computed preference vectors
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::VectorIndexConfig;
use crate::models::Food;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-N foods nearest to the query vector, best match first.
    async fn search_foods(&self, vector: &[f32], limit: usize) -> Result<Vec<Food>>;

    /// Ids of the users whose preference vectors are nearest to the given
    /// user's, excluding the user themselves. Empty when the user has no
    /// stored profile vector.
    async fn similar_users(&self, user_id: &str, top_n: usize) -> Result<Vec<String>>;
}

pub struct QdrantIndex {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    food_collection: String,
    user_collection: String,
    vector_name: String,
}

#[derive(Serialize)]
struct NamedVector<'a> {
    name: &'a str,
    vector: &'a [f32],
}

#[derive(Serialize)]
struct FoodSearchRequest<'a> {
    vector: NamedVector<'a>,
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct UserSearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    ids: Vec<&'a str>,
    with_vector: bool,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    result: Vec<PointRecord>,
}

#[derive(Deserialize)]
struct PointRecord {
    #[serde(default)]
    vector: Option<VectorData>,
}

/// Qdrant returns either a bare vector or a map of named vectors depending
/// on how the collection was created.
#[derive(Deserialize)]
#[serde(untagged)]
enum VectorData {
    Plain(Vec<f32>),
    Named(HashMap<String, Vec<f32>>),
}

impl VectorData {
    fn into_plain(self, preferred_name: &str) -> Option<Vec<f32>> {
        match self {
            VectorData::Plain(v) => Some(v),
            VectorData::Named(mut map) => map
                .remove(preferred_name)
                .or_else(|| map.into_values().next()),
        }
    }
}

impl QdrantIndex {
    pub fn new(config: &VectorIndexConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build Qdrant HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            food_collection: config.food_collection.clone(),
            user_collection: config.user_collection.clone(),
            vector_name: config.vector_name.clone(),
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    async fn user_vector(&self, user_id: &str) -> Result<Option<Vec<f32>>> {
        let response: RetrieveResponse = self
            .request(&format!("/collections/{}/points", self.user_collection))
            .json(&RetrieveRequest {
                ids: vec![user_id],
                with_vector: true,
            })
            .send()
            .await
            .context("Qdrant user profile retrieve failed")?
            .error_for_status()
            .context("Qdrant user profile retrieve returned an error status")?
            .json()
            .await
            .context("Failed to decode Qdrant retrieve response")?;

        Ok(response
            .result
            .into_iter()
            .next()
            .and_then(|point| point.vector)
            .and_then(|v| v.into_plain(&self.vector_name)))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search_foods(&self, vector: &[f32], limit: usize) -> Result<Vec<Food>> {
        let response: SearchResponse = self
            .request(&format!("/collections/{}/points/search", self.food_collection))
            .json(&FoodSearchRequest {
                vector: NamedVector {
                    name: &self.vector_name,
                    vector,
                },
                limit,
                with_payload: true,
            })
            .send()
            .await
            .context("Qdrant food search failed")?
            .error_for_status()
            .context("Qdrant food search returned an error status")?
            .json()
            .await
            .context("Failed to decode Qdrant search response")?;

        let foods: Vec<Food> = response
            .result
            .into_iter()
            .filter_map(|point| point.payload)
            .filter_map(|payload| match serde_json::from_value::<Food>(payload) {
                Ok(food) => Some(food),
                Err(e) => {
                    debug!(error = %e, "skipping food point with malformed payload");
                    None
                }
            })
            .collect();

        Ok(foods)
    }

    async fn similar_users(&self, user_id: &str, top_n: usize) -> Result<Vec<String>> {
        let Some(vector) = self.user_vector(user_id).await? else {
            return Ok(Vec::new());
        };

        let response: SearchResponse = self
            .request(&format!("/collections/{}/points/search", self.user_collection))
            .json(&UserSearchRequest {
                vector: &vector,
                // one extra slot since the user matches themselves first
                limit: top_n + 1,
                with_payload: true,
            })
            .send()
            .await
            .context("Qdrant user search failed")?
            .error_for_status()
            .context("Qdrant user search returned an error status")?
            .json()
            .await
            .context("Failed to decode Qdrant search response")?;

        let ids: Vec<String> = response
            .result
            .into_iter()
            .filter_map(|point| point.payload)
            .filter_map(|payload| {
                payload
                    .get("user_id")
                    .and_then(|v| v.as_str())
                    .map(String::from)
            })
            .filter(|id| id != user_id)
            .take(top_n)
            .collect();

        Ok(ids)
    }
}
