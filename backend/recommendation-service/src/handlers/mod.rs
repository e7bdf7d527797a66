pub mod admin;
#[path = "chat.rs"]
pub mod chat_impl;
pub mod feedback;
pub mod recommendation;
pub mod trending;

// Re-export handlers for convenience
pub use admin::{approve_suggestion, list_pending_suggestions, reject_suggestion, AdminHandlerState};
pub use chat_impl::{chat, fill_slot, session_history, ChatHandlerState};
pub use feedback::{record_feedback, submit_suggestion, FeedbackHandlerState};
pub use recommendation::{
    get_attribute_uncertainty, get_recommendations, RecommendationHandlerState,
};
pub use trending::{get_trending, TrendingHandlerState};
