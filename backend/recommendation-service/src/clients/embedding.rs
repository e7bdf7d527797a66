/// Embedding Service Client
///
/// Turns free text into a fixed-dimension vector via an external HTTP
/// service. The technique behind the endpoint is opaque to this service;
/// responses are cached per input text since the provider is deterministic
/// enough for reuse within a process lifetime.
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::EmbeddingConfig;

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    dimension: usize,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build embedding HTTP client")?;

        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
            cache: RwLock::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.cache.read().await.get(text) {
            debug!(len = text.len(), "embedding cache hit");
            return Ok(hit.clone());
        }

        let mut request = self.http.post(&self.url).json(&EmbedRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Embedding request failed")?
            .error_for_status()
            .context("Embedding service returned an error status")?;

        let body: EmbedResponse = response
            .json()
            .await
            .context("Failed to decode embedding response")?;

        if body.embedding.len() != self.dimension {
            bail!(
                "Embedding dimension {} does not match expected dimension {}",
                body.embedding.len(),
                self.dimension
            );
        }

        self.cache
            .write()
            .await
            .insert(text.to_string(), body.embedding.clone());

        Ok(body.embedding)
    }
}
