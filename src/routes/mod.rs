use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{Cache, RatingStore},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::RecommendationService,
};

pub mod movies;
pub mod ratings;
pub mod recommendations;
pub mod users;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn RatingStore>,
    pub cache: Option<Cache>,
    pub recommender: RecommendationService,
}

impl AppState {
    pub fn new(store: Arc<dyn RatingStore>, recommender: RecommendationService) -> Self {
        Self {
            store,
            cache: None,
            recommender,
        }
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list).post(movies::create))
        .route("/movies/genres", get(movies::by_genre))
        .route("/ratings", post(ratings::submit))
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::recommend),
        )
        .route("/users/:user_id/profile", get(users::profile))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
