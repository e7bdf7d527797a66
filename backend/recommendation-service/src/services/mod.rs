//! Service layer for recommendation-service
//!
//! Active modules:
//! - recall: candidate generators (vector, collaborative, trending,
//!   community, liked)
//! - fusion: merge of the generator signals into one ranked list
//! - uncertainty: per-attribute preference uncertainty scoring
//! - dialogue: conversational slot-filling state machine
//! - session: shared in-memory conversation state with TTL eviction
//! - feedback: like/dislike ingestion feeding popularity and profiles

pub mod dialogue;
pub mod feedback;
pub mod fusion;
pub mod recall;
pub mod session;
pub mod uncertainty;

pub use dialogue::{ChatReply, DialogueManager, IntentClassifier, KeywordIntentClassifier};
pub use feedback::FeedbackService;
pub use fusion::{FusionOutcome, FusionRanker};
pub use recall::{
    CollaborativeRecallStrategy, CommunityRecallStrategy, LikedRecallStrategy, RecallContext,
    RecallStrategy, TrendingRecallStrategy, VectorRecallStrategy,
};
pub use session::{InMemorySessionStore, SessionStore};
pub use uncertainty::UncertaintyEstimator;
