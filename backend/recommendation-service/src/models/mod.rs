use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dish served by a restaurant, with the categorical attributes the
/// dialogue tracks as preference slots.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Food {
    pub food_id: String,
    pub food_name: String,
    pub restaurant_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub spice_level: Option<String>,
    #[serde(default)]
    pub veg_nonveg: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub dish_type: Option<String>,
    #[serde(default)]
    pub popular_in: Option<String>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub food_rating: Option<f32>,
}

impl Food {
    /// Resolve a tracked-attribute name to this food's value.
    ///
    /// `area` aliases to `popular_in` and `cuisine` to `category`, matching
    /// the names the dialogue and filter layers use. Empty values count as
    /// absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let value = match name {
            "category" | "cuisine" => self.category.as_deref(),
            "spice_level" => self.spice_level.as_deref(),
            "veg_nonveg" => self.veg_nonveg.as_deref(),
            "dish_type" => self.dish_type.as_deref(),
            "price_level" => self.price_level.as_deref(),
            "popular_in" | "area" => self.popular_in.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    pub restaurant_id: String,
    pub restaurant_name: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub cuisine_types: Option<String>,
    #[serde(default)]
    pub price_level: Option<String>,
    #[serde(default)]
    pub avg_rating: Option<f32>,
}

/// A user profile as the core sees it: read-only preference data plus the
/// liked/disliked sets maintained by feedback ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferences: HashMap<String, String>,
    #[serde(default)]
    pub liked_foods: Vec<String>,
    #[serde(default)]
    pub disliked_foods: Vec<String>,
}

impl User {
    /// Fallback profile for an unknown user id. Missing data is never an
    /// error in this service; an anonymous user simply has nothing known.
    pub fn anonymous(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: None,
            preferences: HashMap::new(),
            liked_foods: Vec::new(),
            disliked_foods: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogTurn {
    pub role: Role,
    pub content: String,
}

/// Per-conversation state. Owned by the dialogue manager (single writer);
/// the store only provides shared get/put access keyed by session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub dialog_history: Vec<DialogTurn>,
    pub slots: HashMap<String, String>,
    pub pending_attribute: Option<String>,
    pub asked_attributes: Vec<String>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: &str, user_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            dialog_history: Vec::new(),
            slots: HashMap::new(),
            pending_attribute: None,
            asked_attributes: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    /// Append a turn, dropping the oldest entries beyond `max_turns`.
    pub fn push_turn(&mut self, role: Role, content: &str, max_turns: usize) {
        self.dialog_history.push(DialogTurn {
            role,
            content: content.to_string(),
        });
        if self.dialog_history.len() > max_turns {
            let excess = self.dialog_history.len() - max_turns;
            self.dialog_history.drain(0..excess);
        }
    }

    pub fn mark_asked(&mut self, attribute: &str) {
        if !self.is_asked(attribute) {
            self.asked_attributes.push(attribute.to_string());
        }
    }

    pub fn is_asked(&self, attribute: &str) -> bool {
        self.asked_attributes.iter().any(|a| a == attribute)
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Which generator produced a candidate. Order here is documentation only;
/// fusion precedence is encoded by concatenation order in the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecallSource {
    Vector,
    Collaborative,
    Trending,
    Community,
    Liked,
}

impl RecallSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecallSource::Vector => "vector",
            RecallSource::Collaborative => "collaborative",
            RecallSource::Trending => "trending",
            RecallSource::Community => "community",
            RecallSource::Liked => "liked",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub food: Food,
    pub source: RecallSource,
}

/// Per-source candidate counts for one fusion pass. Logged after every
/// recommendation and used to pick the reasoning fragment in replies.
#[derive(Debug, Clone, Default)]
pub struct RecallStats {
    pub vector_count: usize,
    pub collaborative_count: usize,
    pub trending_count: usize,
    pub community_count: usize,
    pub liked_count: usize,
    pub total_candidates: usize,
    pub final_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Like,
    Dislike,
}

impl FeedbackAction {
    /// Popularity delta applied to the cumulative score.
    pub fn delta(&self) -> f64 {
        match self {
            FeedbackAction::Like => 1.0,
            FeedbackAction::Dislike => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackAction::Like => "like",
            FeedbackAction::Dislike => "dislike",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub user_id: String,
    #[serde(default)]
    pub food_id: Option<String>,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    pub action: FeedbackAction,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Approved => "approved",
            SuggestionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySuggestion {
    pub suggestion_id: String,
    pub user_id: String,
    pub suggestion: String,
    #[serde(default)]
    pub food_id: Option<String>,
    pub status: SuggestionStatus,
    pub created_at: DateTime<Utc>,
}
