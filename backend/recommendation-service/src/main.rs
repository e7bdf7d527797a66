use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recommendation_service::clients::{
    EmbeddingClient, HttpEmbeddingClient, QdrantIndex, VectorIndex,
};
use recommendation_service::config::Config;
use recommendation_service::db::{
    FoodStore, PgFoodStore, PgUserStore, PopularityStore, RedisPopularityStore, SuggestionRepo,
    UserStore,
};
use recommendation_service::handlers::{
    approve_suggestion, chat, fill_slot, get_attribute_uncertainty, get_recommendations,
    get_trending, list_pending_suggestions, record_feedback, reject_suggestion, session_history,
    submit_suggestion, AdminHandlerState, ChatHandlerState, FeedbackHandlerState,
    RecommendationHandlerState, TrendingHandlerState,
};
use recommendation_service::services::{
    CollaborativeRecallStrategy, CommunityRecallStrategy, DialogueManager, FeedbackService,
    FusionRanker, InMemorySessionStore, IntentClassifier, KeywordIntentClassifier,
    LikedRecallStrategy, RecallStrategy, SessionStore, TrendingRecallStrategy,
    UncertaintyEstimator, VectorRecallStrategy,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    tracing::info!(
        "Starting recommendation-service v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!("Environment: {}", config.app.env);

    // Initialize database
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to create database pool");

    // Initialize Redis client
    let redis_client =
        redis::Client::open(config.redis.url.clone()).expect("Failed to create Redis client");

    // Collaborator clients
    let embedding: Arc<dyn EmbeddingClient> = Arc::new(
        HttpEmbeddingClient::new(&config.embedding).expect("Failed to build embedding client"),
    );
    let index: Arc<dyn VectorIndex> =
        Arc::new(QdrantIndex::new(&config.vector_index).expect("Failed to build Qdrant client"));

    // Stores
    let foods: Arc<dyn FoodStore> = Arc::new(PgFoodStore::new(db_pool.clone()));
    let user_store = Arc::new(PgUserStore::new(db_pool.clone()));
    let users: Arc<dyn UserStore> = user_store.clone();
    let popularity: Arc<dyn PopularityStore> =
        Arc::new(RedisPopularityStore::new(redis_client.clone()));
    let suggestions = Arc::new(SuggestionRepo::new(db_pool.clone()));

    // Recommendation core
    let vector_strategy = Box::new(VectorRecallStrategy::new(embedding.clone(), index.clone()));
    let auxiliary: Vec<Box<dyn RecallStrategy>> = vec![
        Box::new(CollaborativeRecallStrategy::new(
            index.clone(),
            users.clone(),
            foods.clone(),
            config.recall.similar_user_count,
        )),
        Box::new(TrendingRecallStrategy::new(
            popularity.clone(),
            foods.clone(),
        )),
        Box::new(CommunityRecallStrategy::new(
            foods.clone(),
            config.recall.community_shuffle_seed,
        )),
        Box::new(LikedRecallStrategy::new(foods.clone())),
    ];
    let ranker = Arc::new(FusionRanker::new(
        vector_strategy,
        auxiliary,
        config.recall.clone(),
    ));
    let estimator = Arc::new(UncertaintyEstimator::new(
        users.clone(),
        foods.clone(),
        config.dialogue.tracked_attributes.clone(),
    ));
    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::new(config.session.ttl_minutes));
    let intent: Arc<dyn IntentClassifier> = Arc::new(KeywordIntentClassifier::default());
    let dialogue = Arc::new(DialogueManager::new(
        sessions,
        users.clone(),
        foods.clone(),
        estimator.clone(),
        ranker.clone(),
        intent,
        config.dialogue.clone(),
    ));

    // Plumbing services
    let trending = Arc::new(TrendingRecallStrategy::new(
        popularity.clone(),
        foods.clone(),
    ));
    let feedback = Arc::new(FeedbackService::new(
        db_pool.clone(),
        foods.clone(),
        popularity.clone(),
        user_store.clone(),
    ));

    // Handler states
    let chat_state = web::Data::new(ChatHandlerState {
        dialogue: dialogue.clone(),
    });
    let recommendation_state = web::Data::new(RecommendationHandlerState {
        ranker: ranker.clone(),
        users: users.clone(),
        estimator: estimator.clone(),
    });
    let trending_state = web::Data::new(TrendingHandlerState { trending });
    let feedback_state = web::Data::new(FeedbackHandlerState {
        feedback,
        suggestions: suggestions.clone(),
    });
    let admin_state = web::Data::new(AdminHandlerState { suggestions });

    let port = config.app.port;
    tracing::info!("HTTP server listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(chat_state.clone())
            .app_data(recommendation_state.clone())
            .app_data(trending_state.clone())
            .app_data(feedback_state.clone())
            .app_data(admin_state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .service(chat)
            .service(fill_slot)
            .service(session_history)
            .service(get_recommendations)
            .service(get_attribute_uncertainty)
            .service(get_trending)
            .service(record_feedback)
            .service(submit_suggestion)
            .service(list_pending_suggestions)
            .service(approve_suggestion)
            .service(reject_suggestion)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
