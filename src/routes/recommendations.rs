use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::RecommendedMovie,
    routes::AppState,
    services::{posters, recommendations},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    top_k: Option<usize>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let mut options = state.recommendations;
    if let Some(top_k) = params.top_k {
        options.top_k = top_k;
    }

    tracing::info!(
        request_id = %request_id,
        top_k = options.top_k,
        "Processing recommendation request"
    );

    let items =
        recommendations::recommend(state.rating_store.as_ref(), &state.dataset, options).await?;
    let mut movies: Vec<RecommendedMovie> = items.into_iter().map(RecommendedMovie::from).collect();

    if let Some(provider) = &state.posters {
        posters::attach_posters(provider.clone(), &mut movies).await;
    }

    tracing::info!(
        request_id = %request_id,
        recommended = movies.len(),
        "Recommendation request completed"
    );

    Ok(Json(movies))
}
