use std::collections::HashMap;
use std::path::Path;

use crate::{
    db::RatingStore,
    engine::{dataset::load_catalog, ItemCatalog, LoadError},
    error::{AppError, AppResult},
    models::{MovieSummary, RatingStats},
};

/// Number of catalog entries listed when the caller gives no limit
pub const DEFAULT_LISTING_LIMIT: usize = 50;

/// Lists the first `limit` catalog entries with their submitted-rating stats
///
/// Falls back to a small built-in catalog when the items source is missing,
/// so users can still rate something.
pub async fn list_movies(
    store: &dyn RatingStore,
    items_path: &Path,
    limit: usize,
) -> AppResult<Vec<MovieSummary>> {
    let path = items_path.to_path_buf();
    let catalog = tokio::task::spawn_blocking(move || load_catalog(&path))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let catalog = match catalog {
        Ok(catalog) => catalog,
        Err(LoadError::NotFound { path }) => {
            tracing::warn!(path = %path.display(), "Items source missing, using fallback catalog");
            ItemCatalog::fallback()
        }
        Err(e) => return Err(e.into()),
    };

    let stats: HashMap<i64, RatingStats> = store
        .rating_stats()
        .await?
        .into_iter()
        .map(|stats| (stats.movie_id, stats))
        .collect();

    Ok(catalog
        .iter()
        .take(limit)
        .map(|item| MovieSummary::new(item, stats.get(&item.item_id)))
        .collect())
}
