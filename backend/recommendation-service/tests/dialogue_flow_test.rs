//! End-to-end dialogue flow tests over in-memory store doubles.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use recommendation_service::clients::{EmbeddingClient, VectorIndex};
use recommendation_service::config::{DialogueConfig, RecallConfig};
use recommendation_service::db::{FoodStore, PopularityStore, UserStore};
use recommendation_service::models::{Food, Restaurant, User};
use recommendation_service::services::{
    CollaborativeRecallStrategy, CommunityRecallStrategy, DialogueManager, KeywordIntentClassifier,
    LikedRecallStrategy, RecallStrategy, TrendingRecallStrategy, VectorRecallStrategy,
};
use recommendation_service::{FusionRanker, InMemorySessionStore, SessionStore, UncertaintyEstimator};

// ---- in-memory doubles -------------------------------------------------

#[derive(Default)]
struct InMemoryFoodStore {
    foods: HashMap<String, Food>,
    community_ids: Vec<String>,
    restaurants: HashMap<String, Restaurant>,
}

#[async_trait]
impl FoodStore for InMemoryFoodStore {
    async fn get(&self, food_id: &str) -> Result<Option<Food>> {
        Ok(self.foods.get(food_id).cloned())
    }

    async fn get_many(&self, food_ids: &[String]) -> Result<Vec<Food>> {
        Ok(food_ids
            .iter()
            .filter_map(|id| self.foods.get(id).cloned())
            .collect())
    }

    async fn approved_community_foods(&self, limit: usize) -> Result<Vec<Food>> {
        Ok(self
            .community_ids
            .iter()
            .take(limit)
            .filter_map(|id| self.foods.get(id).cloned())
            .collect())
    }

    async fn restaurant(&self, restaurant_id: &str) -> Result<Option<Restaurant>> {
        Ok(self.restaurants.get(restaurant_id).cloned())
    }
}

#[derive(Default)]
struct InMemoryUserStore {
    users: HashMap<String, User>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).cloned())
    }
}

#[derive(Default)]
struct InMemoryPopularityStore {
    global: Vec<(String, f64)>,
    by_area: HashMap<String, Vec<(String, f64)>>,
}

#[async_trait]
impl PopularityStore for InMemoryPopularityStore {
    async fn top_by_score(&self, area: Option<&str>, limit: usize) -> Result<Vec<(String, f64)>> {
        let list = match area {
            Some(a) if !a.trim().is_empty() => self
                .by_area
                .get(&a.trim().to_lowercase())
                .cloned()
                .unwrap_or_default(),
            _ => self.global.clone(),
        };
        Ok(list.into_iter().take(limit).collect())
    }

    async fn record_delta(&self, _food_id: &str, _area: Option<&str>, _delta: f64) -> Result<()> {
        Ok(())
    }
}

struct StubEmbedding;

#[async_trait]
impl EmbeddingClient for StubEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; 4])
    }
}

#[derive(Default)]
struct StubVectorIndex {
    foods: Vec<Food>,
    similar: HashMap<String, Vec<String>>,
}

#[async_trait]
impl VectorIndex for StubVectorIndex {
    async fn search_foods(&self, _vector: &[f32], limit: usize) -> Result<Vec<Food>> {
        Ok(self.foods.iter().take(limit).cloned().collect())
    }

    async fn similar_users(&self, user_id: &str, top_n: usize) -> Result<Vec<String>> {
        Ok(self
            .similar
            .get(user_id)
            .map(|ids| ids.iter().take(top_n).cloned().collect())
            .unwrap_or_default())
    }
}

// ---- fixtures ----------------------------------------------------------

fn food(id: &str, name: &str, category: &str, spice: &str, area: &str) -> Food {
    Food {
        food_id: id.to_string(),
        food_name: name.to_string(),
        restaurant_id: "r1".to_string(),
        description: None,
        category: Some(category.to_string()).filter(|c| !c.is_empty()),
        spice_level: Some(spice.to_string()).filter(|s| !s.is_empty()),
        veg_nonveg: None,
        ingredients: None,
        dish_type: None,
        popular_in: Some(area.to_string()).filter(|a| !a.is_empty()),
        price_level: None,
        food_rating: None,
    }
}

fn recall_config() -> RecallConfig {
    RecallConfig {
        vector_candidate_limit: 50,
        collaborative_limit: 8,
        trending_limit: 8,
        community_limit: 5,
        liked_limit: 8,
        similar_user_count: 4,
        default_k: 10,
        community_shuffle_seed: None,
    }
}

fn dialogue_config(max_questions: usize) -> DialogueConfig {
    DialogueConfig {
        max_questions,
        max_history_turns: 30,
        tracked_attributes: vec![
            "spice_level".to_string(),
            "category".to_string(),
            "popular_in".to_string(),
        ],
    }
}

struct Fixture {
    foods: InMemoryFoodStore,
    users: InMemoryUserStore,
    popularity: InMemoryPopularityStore,
    index: StubVectorIndex,
    max_questions: usize,
}

impl Fixture {
    fn new() -> Self {
        Self {
            foods: InMemoryFoodStore::default(),
            users: InMemoryUserStore::default(),
            popularity: InMemoryPopularityStore::default(),
            index: StubVectorIndex::default(),
            max_questions: 3,
        }
    }

    /// A user whose every liked food is mild: spice_level is fully known,
    /// category and area are fully unknown.
    fn with_mild_user(mut self) -> Self {
        for i in 1..=3 {
            let id = format!("liked{}", i);
            self.foods.foods.insert(
                id.clone(),
                food(&id, &format!("Mild dish {}", i), "", "mild", ""),
            );
        }
        self.users.users.insert(
            "u1".to_string(),
            User {
                user_id: "u1".to_string(),
                username: Some("tester".to_string()),
                preferences: HashMap::new(),
                liked_foods: vec!["liked1".to_string(), "liked2".to_string(), "liked3".to_string()],
                disliked_foods: Vec::new(),
            },
        );
        self
    }

    fn with_catalog(mut self) -> Self {
        let thali = food("f1", "South Indian Thali", "South Indian Thali", "mild", "Gandhipuram");
        let noodles = food("f2", "Schezwan Noodles", "Chinese", "hot", "Peelamedu");
        self.index.foods = vec![thali.clone(), noodles.clone()];
        self.foods.foods.insert("f1".to_string(), thali);
        self.foods.foods.insert("f2".to_string(), noodles);
        self.foods.restaurants.insert(
            "r1".to_string(),
            Restaurant {
                restaurant_id: "r1".to_string(),
                restaurant_name: "Annapoorna".to_string(),
                area: Some("Gandhipuram".to_string()),
                cuisine_types: Some("South Indian".to_string()),
                price_level: None,
                avg_rating: None,
            },
        );
        self
    }

    fn build(self) -> (DialogueManager, Arc<InMemorySessionStore>) {
        let foods: Arc<dyn FoodStore> = Arc::new(self.foods);
        let users: Arc<dyn UserStore> = Arc::new(self.users);
        let popularity: Arc<dyn PopularityStore> = Arc::new(self.popularity);
        let index: Arc<dyn VectorIndex> = Arc::new(self.index);
        let embedding: Arc<dyn EmbeddingClient> = Arc::new(StubEmbedding);

        let vector = Box::new(VectorRecallStrategy::new(embedding, index.clone()));
        let auxiliary: Vec<Box<dyn RecallStrategy>> = vec![
            Box::new(CollaborativeRecallStrategy::new(
                index,
                users.clone(),
                foods.clone(),
                4,
            )),
            Box::new(TrendingRecallStrategy::new(popularity, foods.clone())),
            Box::new(CommunityRecallStrategy::new(foods.clone(), None)),
            Box::new(LikedRecallStrategy::new(foods.clone())),
        ];
        let ranker = Arc::new(FusionRanker::new(vector, auxiliary, recall_config()));

        let config = dialogue_config(self.max_questions);
        let estimator = Arc::new(UncertaintyEstimator::new(
            users.clone(),
            foods.clone(),
            config.tracked_attributes.clone(),
        ));
        let sessions = Arc::new(InMemorySessionStore::new(30));
        let manager = DialogueManager::new(
            sessions.clone(),
            users,
            foods,
            estimator,
            ranker,
            Arc::new(KeywordIntentClassifier::default()),
            config,
        );
        (manager, sessions)
    }
}

// ---- tests -------------------------------------------------------------

#[tokio::test]
async fn test_slot_filling_flow_ends_in_recommendation() {
    let (manager, sessions) = Fixture::new().with_mild_user().with_catalog().build();

    // Turn 1: category and area are tied at maximal uncertainty; the
    // catalog puts category first, so that question comes up.
    let reply = manager.process_message("u1", "s1", "hello").await;
    assert_eq!(reply.asked_attribute.as_deref(), Some("category"));
    assert!(!reply.feedback_requested);

    let session = sessions.get("s1").expect("session exists");
    assert_eq!(session.pending_attribute.as_deref(), Some("category"));

    // Turn 2: plain answer fills the slot, next question follows.
    let reply = manager.process_message("u1", "s1", "south indian").await;
    assert_eq!(reply.asked_attribute.as_deref(), Some("popular_in"));

    let session = sessions.get("s1").expect("session exists");
    assert_eq!(
        session.slots.get("category").map(String::as_str),
        Some("south indian")
    );
    assert_eq!(session.pending_attribute.as_deref(), Some("popular_in"));

    // Turn 3: last question of the budget (spice_level is known but not
    // yet asked, and budget remains).
    let reply = manager.process_message("u1", "s1", "Gandhipuram").await;
    assert_eq!(reply.asked_attribute.as_deref(), Some("spice_level"));

    // Turn 4: budget exhausted, recommendation arrives. The category slot
    // filters out the Chinese candidate.
    let reply = manager.process_message("u1", "s1", "mild").await;
    assert!(reply.feedback_requested);
    assert_eq!(reply.food_id.as_deref(), Some("f1"));
    assert_eq!(reply.restaurant_name.as_deref(), Some("Annapoorna"));
    assert!(reply.reply.contains("South Indian Thali"));

    let session = sessions.get("s1").expect("session exists");
    assert!(session.pending_attribute.is_none());
    assert_eq!(session.asked_attributes.len(), 3);
    assert_eq!(session.slots.get("last_food_id").map(String::as_str), Some("f1"));
}

#[tokio::test]
async fn test_at_most_one_pending_question_between_turns() {
    let (manager, sessions) = Fixture::new().with_mild_user().with_catalog().build();

    for message in ["hi", "anything", "whatever", "sure", "ok"] {
        manager.process_message("u1", "s1", message).await;
        let session = sessions.get("s1").expect("session exists");
        // Option models the invariant; it must also never dangle after a
        // recommendation turn.
        if session.asked_attributes.len() >= 3 && session.slots.contains_key("last_food_id") {
            assert!(session.pending_attribute.is_none());
        }
    }
}

#[tokio::test]
async fn test_query_intent_bypasses_pending_answer() {
    let (manager, sessions) = Fixture::new().with_mild_user().with_catalog().build();

    let reply = manager.process_message("u1", "s1", "hello").await;
    assert_eq!(reply.asked_attribute.as_deref(), Some("category"));

    // Query-intent keyword: must NOT be stored as the category answer.
    let reply = manager
        .process_message("u1", "s1", "recommend something spicy")
        .await;

    let session = sessions.get("s1").expect("session exists");
    assert!(!session.slots.contains_key("category"));
    // The machine moved on: either another question or a recommendation.
    assert!(reply.asked_attribute.is_some() || reply.feedback_requested);
    // category stays consumed from the budget and is never re-asked
    assert!(session.is_asked("category"));
    assert_ne!(reply.asked_attribute.as_deref(), Some("category"));
}

#[tokio::test]
async fn test_question_budget_exhausts_and_stops() {
    let mut fixture = Fixture::new().with_mild_user().with_catalog();
    fixture.max_questions = 2;
    let (manager, sessions) = fixture.build();

    manager.process_message("u1", "s1", "hi").await;
    manager.process_message("u1", "s1", "south indian").await;
    // Budget of 2 is spent; every further turn recommends.
    for _ in 0..3 {
        let reply = manager.process_message("u1", "s1", "ok").await;
        assert!(reply.asked_attribute.is_none());
    }

    let session = sessions.get("s1").expect("session exists");
    assert_eq!(session.asked_attributes.len(), 2);
}

#[tokio::test]
async fn test_no_candidates_yields_apology() {
    let mut fixture = Fixture::new();
    fixture.max_questions = 0;
    let (manager, _sessions) = fixture.build();

    let reply = manager.process_message("u9", "s9", "anything good?").await;
    assert!(!reply.feedback_requested);
    assert!(reply.food_id.is_none());
    assert!(reply.reply.contains("different cuisine or area"));
}

#[tokio::test]
async fn test_trending_fallback_serves_recommendation() {
    let mut fixture = Fixture::new();
    fixture.max_questions = 0;
    // Catalog exists only through the popularity leaderboard; the vector
    // index is empty.
    fixture
        .foods
        .foods
        .insert("t1".to_string(), food("t1", "Bun Parotta", "", "", ""));
    fixture.popularity.global = vec![("t1".to_string(), 12.0)];
    let (manager, _sessions) = fixture.build();

    let reply = manager.process_message("u9", "s9", "surprise me").await;
    assert!(reply.feedback_requested);
    assert_eq!(reply.food_id.as_deref(), Some("t1"));
}

#[tokio::test]
async fn test_uncertainty_ordering_matches_catalog_ties() {
    let fixture = Fixture::new().with_mild_user();
    let foods: Arc<dyn FoodStore> = Arc::new(fixture.foods);
    let users: Arc<dyn UserStore> = Arc::new(fixture.users);
    let estimator = UncertaintyEstimator::new(
        users,
        foods,
        vec![
            "spice_level".to_string(),
            "category".to_string(),
            "popular_in".to_string(),
        ],
    );

    let ranked = estimator.ranked_attributes("u1").await;
    assert_eq!(ranked[0].0, "category");
    assert_eq!(ranked[0].1, 1.0);
    assert_eq!(ranked[1].0, "popular_in");
    assert_eq!(ranked[1].1, 1.0);
    assert_eq!(ranked[2].0, "spice_level");
    assert_eq!(ranked[2].1, 0.0);

    let next = estimator
        .next_uncertain_attribute("u1", &["category".to_string()])
        .await;
    assert_eq!(next.as_deref(), Some("popular_in"));
}

#[tokio::test]
async fn test_record_answer_explicit_slot_fill() {
    let (manager, sessions) = Fixture::new().with_mild_user().with_catalog().build();

    // unknown session is rejected
    assert!(!manager.record_answer("nope", "category", "chinese"));

    manager.process_message("u1", "s1", "hello").await;
    assert!(manager.record_answer("s1", "category", "chinese"));

    let session = sessions.get("s1").expect("session exists");
    assert_eq!(session.slots.get("category").map(String::as_str), Some("chinese"));
    assert!(session.is_asked("category"));
    // the explicit fill cleared the matching pending question
    assert!(session.pending_attribute.is_none());
}

#[tokio::test]
async fn test_anonymous_user_still_gets_served() {
    let mut fixture = Fixture::new().with_catalog();
    fixture.max_questions = 0;
    let (manager, _sessions) = fixture.build();

    // u404 is not in the user store; the machine treats it as anonymous
    // and still recommends from the vector candidates.
    let reply = manager.process_message("u404", "s404", "lunch ideas").await;
    assert!(reply.feedback_requested);
    assert!(reply.food_id.is_some());
}
