use axum::{
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::RatingStore,
    engine::DatasetPaths,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{PosterProvider, RecommendationOptions},
};

pub mod movies;
pub mod ratings;
pub mod recommendations;

/// Shared, read-only application state
///
/// Nothing derived from the dataset is kept here: every recommendation
/// request loads the data and builds its own graph.
#[derive(Clone)]
pub struct AppState {
    pub rating_store: Arc<dyn RatingStore>,
    /// Poster lookup; `None` disables posters
    pub posters: Option<Arc<dyn PosterProvider>>,
    pub dataset: DatasetPaths,
    pub recommendations: RecommendationOptions,
}

impl AppState {
    pub fn new(rating_store: Arc<dyn RatingStore>, dataset: DatasetPaths) -> Self {
        Self {
            rating_store,
            posters: None,
            dataset,
            recommendations: RecommendationOptions::default(),
        }
    }

    pub fn with_posters(mut self, posters: Arc<dyn PosterProvider>) -> Self {
        self.posters = Some(posters);
        self
    }

    pub fn with_recommendations(mut self, options: RecommendationOptions) -> Self {
        self.recommendations = options;
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list))
        .route("/ratings", get(ratings::list).post(ratings::create))
        .route("/recommendations", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
