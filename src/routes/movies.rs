use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::MovieSummary,
    routes::AppState,
    services::catalog::{self, DEFAULT_LISTING_LIMIT},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

/// Handler listing catalog movies with their rating stats
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let movies = catalog::list_movies(
        state.rating_store.as_ref(),
        &state.dataset.items,
        params.limit.unwrap_or(DEFAULT_LISTING_LIMIT),
    )
    .await?;
    Ok(Json(movies))
}
