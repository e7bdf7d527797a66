pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

// Re-export the recommendation core
pub use services::{
    ChatReply, DialogueManager, FusionOutcome, FusionRanker, InMemorySessionStore,
    KeywordIntentClassifier, SessionStore, UncertaintyEstimator,
};
