use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub embedding: EmbeddingConfig,
    pub vector_index: VectorIndexConfig,
    pub recall: RecallConfig,
    pub dialogue: DialogueConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub food_collection: String,
    pub user_collection: String,
    pub vector_name: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Candidate pool pulled from the vector index before filtering.
    /// Deliberately larger than any requested k.
    pub vector_candidate_limit: usize,
    pub collaborative_limit: usize,
    pub trending_limit: usize,
    pub community_limit: usize,
    pub liked_limit: usize,
    pub similar_user_count: usize,
    pub default_k: usize,
    /// Seed for the community shuffle; unset means insertion order.
    pub community_shuffle_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Hard cap on clarifying questions per session.
    pub max_questions: usize,
    pub max_history_turns: usize,
    /// Preference attributes the dialogue may ask about, in catalog order.
    pub tracked_attributes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        Ok(Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            embedding: EmbeddingConfig {
                url: env::var("EMBEDDING_URL")
                    .unwrap_or_else(|_| "http://localhost:8501/embed".to_string()),
                api_key: env::var("EMBEDDING_API_KEY").ok(),
                dimension: env::var("EMBEDDING_DIMENSION")
                    .unwrap_or_else(|_| "768".to_string())
                    .parse()?,
                timeout_secs: env::var("EMBEDDING_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            vector_index: VectorIndexConfig {
                url: env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6333".to_string()),
                api_key: env::var("QDRANT_API_KEY").ok(),
                food_collection: env::var("QDRANT_FOOD_COLLECTION")
                    .unwrap_or_else(|_| "food_collection".to_string()),
                user_collection: env::var("QDRANT_USER_COLLECTION")
                    .unwrap_or_else(|_| "user_profiles".to_string()),
                vector_name: env::var("QDRANT_VECTOR_NAME")
                    .unwrap_or_else(|_| "fast-bge-small-en".to_string()),
                timeout_secs: env::var("QDRANT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            recall: RecallConfig {
                vector_candidate_limit: env::var("VECTOR_CANDIDATE_LIMIT")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()?,
                collaborative_limit: env::var("COLLABORATIVE_LIMIT")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()?,
                trending_limit: env::var("TRENDING_LIMIT")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()?,
                community_limit: env::var("COMMUNITY_LIMIT")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                liked_limit: env::var("LIKED_LIMIT")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()?,
                similar_user_count: env::var("SIMILAR_USER_COUNT")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()?,
                default_k: env::var("DEFAULT_RECOMMENDATION_K")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                community_shuffle_seed: env::var("COMMUNITY_SHUFFLE_SEED")
                    .ok()
                    .and_then(|v| v.parse().ok()),
            },
            dialogue: DialogueConfig {
                max_questions: env::var("DIALOGUE_MAX_QUESTIONS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                max_history_turns: env::var("DIALOGUE_MAX_HISTORY_TURNS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                tracked_attributes: env::var("TRACKED_ATTRIBUTES")
                    .unwrap_or_else(|_| "spice_level,veg_nonveg,category,popular_in".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            session: SessionConfig {
                ttl_minutes: env::var("SESSION_TTL_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_attributes_parsing() {
        let raw = "spice_level, veg_nonveg ,category,,popular_in";
        let parsed: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(
            parsed,
            vec!["spice_level", "veg_nonveg", "category", "popular_in"]
        );
    }
}
