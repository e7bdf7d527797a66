mod intent;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::DialogueConfig;
use crate::db::{FoodStore, UserStore};
use crate::models::{RecallStats, Role, Session, User};
use crate::services::fusion::FusionRanker;
use crate::services::session::SessionStore;
use crate::services::uncertainty::UncertaintyEstimator;

pub use intent::{IntentClassifier, KeywordIntentClassifier};

const NO_MATCH_REPLY: &str = "Sorry, I couldn't find anything that matches right now. \
     Could you try a different cuisine or area?";

/// Reply envelope returned to the service layer after each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    /// Set when this turn asked a clarifying question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asked_attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    /// True when a recommendation was served and a like/dislike is expected.
    pub feedback_requested: bool,
}

impl ChatReply {
    fn text(reply: String) -> Self {
        Self {
            reply,
            asked_attribute: None,
            food_id: None,
            food_name: None,
            restaurant_id: None,
            restaurant_name: None,
            feedback_requested: false,
        }
    }
}

/// Per-turn controller: either asks about the most uncertain unresolved
/// preference attribute or serves a fused recommendation.
///
/// The manager is the sole writer of session state. It never fails: every
/// downstream problem degrades to a valid reply, the worst case being the
/// no-match fallback.
pub struct DialogueManager {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    foods: Arc<dyn FoodStore>,
    estimator: Arc<UncertaintyEstimator>,
    ranker: Arc<FusionRanker>,
    intent: Arc<dyn IntentClassifier>,
    config: DialogueConfig,
}

impl DialogueManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        foods: Arc<dyn FoodStore>,
        estimator: Arc<UncertaintyEstimator>,
        ranker: Arc<FusionRanker>,
        intent: Arc<dyn IntentClassifier>,
        config: DialogueConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            foods,
            estimator,
            ranker,
            intent,
            config,
        }
    }

    /// Process one inbound message and produce exactly one reply.
    pub async fn process_message(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> ChatReply {
        // opportunistic eviction; cheap and safe at turn boundaries
        self.sessions.sweep_expired();

        let mut session = self.sessions.get_or_create(session_id, user_id);
        session.touch();
        session.push_turn(Role::User, message, self.config.max_history_turns);

        // A pending question consumes this message as its answer unless the
        // message reads as a fresh request.
        if let Some(pending) = session.pending_attribute.clone() {
            if self.intent.is_new_request(message) {
                debug!(
                    session_id,
                    attribute = pending.as_str(),
                    "pending question bypassed by query intent"
                );
            } else {
                session
                    .slots
                    .insert(pending.clone(), message.trim().to_string());
                session.pending_attribute = None;
                debug!(
                    session_id,
                    attribute = pending.as_str(),
                    "slot filled from answer"
                );
            }
        }

        let user = self.load_user(user_id).await;

        // Ask about the next fuzzy attribute while the question budget lasts.
        if session.asked_attributes.len() < self.config.max_questions {
            if let Some(attribute) = self
                .estimator
                .next_uncertain_attribute(user_id, &session.asked_attributes)
                .await
            {
                let question = question_for(&attribute);
                session.pending_attribute = Some(attribute.clone());
                session.mark_asked(&attribute);
                session.push_turn(Role::Assistant, &question, self.config.max_history_turns);
                self.sessions.put(session);

                info!(user_id, session_id, attribute = attribute.as_str(), "asking");
                let mut reply = ChatReply::text(question);
                reply.asked_attribute = Some(attribute);
                return reply;
            }
        }

        // Question budget spent (or nothing left to ask): recommend.
        let filters = self.slot_filters(&session);
        let outcome = self
            .ranker
            .recommend(&user, message, &filters, self.ranker.default_k())
            .await;

        let Some(top) = outcome.items.first().cloned() else {
            session.push_turn(Role::Assistant, NO_MATCH_REPLY, self.config.max_history_turns);
            self.sessions.put(session);
            info!(user_id, session_id, "no candidates, fallback reply");
            return ChatReply::text(NO_MATCH_REPLY.to_string());
        };

        let restaurant = match self.foods.restaurant(&top.food.restaurant_id).await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    restaurant_id = top.food.restaurant_id.as_str(),
                    error = %e,
                    "restaurant lookup failed"
                );
                None
            }
        };
        let (restaurant_name, restaurant_area) = match restaurant {
            Some(r) => (r.restaurant_name, r.area),
            None => (format!("Restaurant #{}", top.food.restaurant_id), None),
        };

        let reason = reason_fragment(&filters, &outcome.stats);
        let location = restaurant_area
            .filter(|a| !a.is_empty())
            .map(|a| format!(" ({})", a))
            .unwrap_or_default();
        let reply_text = format!(
            "Based on your preferences, I recommend {} at {}{}. {} Did you like this recommendation?",
            top.food.food_name, restaurant_name, location, reason
        );

        session
            .slots
            .insert("last_food_id".to_string(), top.food.food_id.clone());
        session.slots.insert(
            "last_restaurant_id".to_string(),
            top.food.restaurant_id.clone(),
        );
        session.pending_attribute = None;
        session.push_turn(Role::Assistant, &reply_text, self.config.max_history_turns);
        self.sessions.put(session);

        info!(
            user_id,
            session_id,
            food_id = top.food.food_id.as_str(),
            source = top.source.as_str(),
            "recommendation served"
        );

        ChatReply {
            reply: reply_text,
            asked_attribute: None,
            food_id: Some(top.food.food_id),
            food_name: Some(top.food.food_name),
            restaurant_id: Some(top.food.restaurant_id),
            restaurant_name: Some(restaurant_name),
            feedback_requested: true,
        }
    }

    /// Explicit slot fill from a structured UI, bypassing the answer
    /// heuristic. Returns false when the session does not exist.
    pub fn record_answer(&self, session_id: &str, attribute: &str, value: &str) -> bool {
        let Some(mut session) = self.sessions.get(session_id) else {
            return false;
        };
        session
            .slots
            .insert(attribute.to_string(), value.trim().to_string());
        session.mark_asked(attribute);
        if session.pending_attribute.as_deref() == Some(attribute) {
            session.pending_attribute = None;
        }
        session.touch();
        self.sessions.put(session);
        true
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id)
    }

    async fn load_user(&self, user_id: &str) -> User {
        match self.users.get(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => User::anonymous(user_id),
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed, treating as anonymous");
                User::anonymous(user_id)
            }
        }
    }

    /// Filters are the slots restricted to the tracked-attribute catalog;
    /// bookkeeping slots like last_food_id never leak into matching.
    fn slot_filters(&self, session: &Session) -> HashMap<String, String> {
        let mut filters = HashMap::new();
        for attribute in &self.config.tracked_attributes {
            if let Some(value) = session.slots.get(attribute) {
                if !value.trim().is_empty() {
                    filters.insert(attribute.clone(), value.clone());
                }
            }
        }
        filters
    }
}

/// Natural-language question for a tracked attribute.
fn question_for(attribute: &str) -> String {
    match attribute {
        "spice_level" => "How spicy do you like your food - mild, medium, or hot?".to_string(),
        "veg_nonveg" => "Do you prefer vegetarian or non-vegetarian dishes?".to_string(),
        "category" | "cuisine" => "Which cuisine are you in the mood for today?".to_string(),
        "popular_in" | "area" => "Which area should I look around for you?".to_string(),
        "dish_type" => "Are you after a snack, a main course, or something sweet?".to_string(),
        "price_level" => "Are you thinking budget-friendly or something fancier?".to_string(),
        other => format!("What's your preference for {}?", other.replace('_', " ")),
    }
}

/// First applicable reasoning fragment, in fixed priority order.
fn reason_fragment(filters: &HashMap<String, String>, stats: &RecallStats) -> String {
    if let Some(area) = filters.get("popular_in").filter(|a| !a.is_empty()) {
        format!("It's been trending in {}.", area)
    } else if stats.collaborative_count > 0 {
        "Diners with taste similar to yours have been loving it.".to_string()
    } else if stats.community_count > 0 {
        "It comes community-approved.".to_string()
    } else {
        "It's a classic choice.".to_string()
    }
}
