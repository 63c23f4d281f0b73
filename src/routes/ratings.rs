use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{NewRating, StoredRating},
    routes::AppState,
};

/// Handler storing a submitted rating
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<NewRating>,
) -> AppResult<(StatusCode, Json<StoredRating>)> {
    let rating = request.validated()?;
    let stored = state.rating_store.add_rating(rating).await?;

    tracing::info!(
        request_id = %request_id,
        movie_id = stored.movie_id,
        rating = stored.rating,
        "Rating recorded"
    );

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Handler listing stored ratings, newest first
pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<StoredRating>>> {
    let ratings = state.rating_store.list_ratings().await?;
    Ok(Json(ratings))
}
