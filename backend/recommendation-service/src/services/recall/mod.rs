mod collaborative_recall;
mod community_recall;
mod liked_recall;
mod trending_recall;
mod vector_recall;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Candidate, RecallSource, User};

pub use collaborative_recall::CollaborativeRecallStrategy;
pub use community_recall::CommunityRecallStrategy;
pub use liked_recall::LikedRecallStrategy;
pub use trending_recall::TrendingRecallStrategy;
pub use vector_recall::VectorRecallStrategy;

/// Per-request inputs shared by all generators.
#[derive(Debug, Clone)]
pub struct RecallContext {
    pub user: User,
    pub query: String,
    /// Area restriction derived from the post-alias filter map, if any.
    pub area: Option<String>,
}

/// A candidate generator. Implementations never mutate state and treat an
/// empty result as a normal outcome; errors are surfaced so the fusion
/// layer can degrade them to empty with a warning.
#[async_trait]
pub trait RecallStrategy: Send + Sync {
    async fn recall(&self, ctx: &RecallContext, limit: usize) -> Result<Vec<Candidate>>;
    fn source(&self) -> RecallSource;
}
