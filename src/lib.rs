pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod repositories;
pub mod services;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::SessionStore,
    config::Config,
    repositories::{
        AnalyticsRepository, GenerationCounterRepository, IdeaRepository, PgAnalyticsRepository,
        PgGenerationCounterRepository, PgIdeaRepository, PgVoteRepository, VoteRepository,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub ideas: Arc<dyn IdeaRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub counters: Arc<dyn GenerationCounterRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by PostgreSQL for every repository.
    pub fn with_postgres(db: PgPool, sessions: Arc<dyn SessionStore>, config: Config) -> Self {
        Self {
            ideas: Arc::new(PgIdeaRepository::new(db.clone())),
            votes: Arc::new(PgVoteRepository::new(db.clone())),
            analytics: Arc::new(PgAnalyticsRepository::new(db.clone())),
            counters: Arc::new(PgGenerationCounterRepository::new(db)),
            sessions,
            config: Arc::new(config),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Skipping invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public routes (identity is optional)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/ideas", get(handlers::ideas::get_ideas))
        .route("/api/ideas/{idea_id}", get(handlers::ideas::get_idea))
        .route(
            "/api/votes",
            get(handlers::votes::get_votes).post(handlers::votes::cast_vote),
        );

    // Protected routes
    let protected_routes = Router::new()
        .route(
            "/api/generation/limit",
            get(handlers::generation::get_generation_limit),
        )
        .route(
            "/api/generation/attempts",
            post(handlers::generation::record_generation_attempt),
        )
        .route(
            "/api/analytics/token-usage",
            get(handlers::analytics::get_token_usage),
        )
        .route(
            "/api/admin/analytics",
            get(handlers::analytics::get_analytics_report),
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
