use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

use crate::{
    db::RatingStore,
    engine::{
        CatalogItem, CleanedRatings, DatasetPaths, EngineResult, ItemCatalog, RandomWalk,
        ScoreVector, TransitionMatrix,
    },
    error::{AppError, AppResult},
};

/// How seed items are turned into recommendations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One random walk seeded with every rated item; seeds are not recommended back
    #[default]
    RandomWalk,
    /// Strongest direct transitions of each seed, aggregated across seeds
    Neighbors,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationOptions {
    pub top_k: usize,
    pub strategy: Strategy,
    pub walk: RandomWalk,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            strategy: Strategy::default(),
            walk: RandomWalk::default(),
        }
    }
}

/// Generates recommendations from every rating in the store
///
/// Loads the dataset and builds the transition matrix from scratch on each
/// call, off the async runtime. A missing dataset surfaces as
/// [`AppError::DataUnavailable`]; rated items unknown to the graph are skipped.
pub async fn recommend(
    store: &dyn RatingStore,
    paths: &DatasetPaths,
    options: RecommendationOptions,
) -> AppResult<Vec<CatalogItem>> {
    let mut stored = store.list_ratings().await?;
    stored.sort_by_key(|rating| rating.id);
    let seeds: Vec<i64> = stored.iter().map(|rating| rating.movie_id).collect();

    tracing::info!(
        seeds = seeds.len(),
        top_k = options.top_k,
        strategy = ?options.strategy,
        "Generating recommendations"
    );

    let paths = paths.clone();
    let recommendations = tokio::task::spawn_blocking(move || -> AppResult<Vec<CatalogItem>> {
        let (ratings, catalog) = paths.load()?;
        Ok(recommend_from_dataset(&ratings, &catalog, &seeds, options)?)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    tracing::info!(
        recommended = recommendations.len(),
        "Recommendations generated"
    );

    Ok(recommendations)
}

/// Synchronous core of [`recommend`] over an already loaded dataset
pub fn recommend_from_dataset(
    ratings: &CleanedRatings,
    catalog: &ItemCatalog,
    raw_seeds: &[i64],
    options: RecommendationOptions,
) -> EngineResult<Vec<CatalogItem>> {
    let seeds: Vec<usize> = raw_seeds
        .iter()
        .filter_map(|&raw| match ratings.item_index(raw) {
            Ok(dense) => Some(dense),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping rated item outside the graph");
                None
            }
        })
        .collect();

    if seeds.is_empty() || options.top_k == 0 {
        return Ok(Vec::new());
    }

    let matrix = TransitionMatrix::build(ratings);
    let ranked: Vec<usize> = match options.strategy {
        Strategy::RandomWalk => options
            .walk
            .propagate(&matrix, &seeds)?
            .top_k_excluding(options.top_k, &seeds)
            .into_iter()
            .map(|(item, _)| item)
            .collect(),
        Strategy::Neighbors => seeds
            .iter()
            .flat_map(|&seed| ScoreVector::from(matrix.row(seed)).top_k(options.top_k))
            .map(|(item, _)| item)
            .collect(),
    };

    let items = ranked
        .into_iter()
        .filter_map(|dense| {
            let item = ratings
                .raw_item(dense)
                .and_then(|raw| catalog.get(raw))
                .cloned();
            if item.is_none() {
                tracing::debug!(dense_item = dense, "Recommended item missing from catalog");
            }
            item
        })
        .collect();

    Ok(dedup_by_key(items, |item| item.item_id))
}

/// Keeps the first occurrence of every key, preserving order
pub fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ratings::MockRatingStore;
    use crate::engine::RatingRecord;
    use crate::models::StoredRating;
    use chrono::Utc;

    fn liked(user: i64, items: &[i64]) -> Vec<RatingRecord> {
        items
            .iter()
            .map(|&item| RatingRecord::new(user, item, 4.0, 0))
            .collect()
    }

    /// Users A {1,2}, B {2,3}, C {1,2,3}; items 4 and 5 are catalogued but never liked
    fn dataset() -> (CleanedRatings, ItemCatalog) {
        let mut records = liked(1, &[1, 2]);
        records.extend(liked(2, &[2, 3]));
        records.extend(liked(3, &[1, 2, 3]));
        records.push(RatingRecord::new(4, 4, 3.0, 0));
        let catalog = ItemCatalog::from_items(
            (1..=5)
                .map(|id| CatalogItem::new(id, format!("Movie {}", id)))
                .collect(),
        );
        (CleanedRatings::from_records(records), catalog)
    }

    fn options(strategy: Strategy, top_k: usize) -> RecommendationOptions {
        RecommendationOptions {
            top_k,
            strategy,
            ..RecommendationOptions::default()
        }
    }

    fn ids(items: &[CatalogItem]) -> Vec<i64> {
        items.iter().map(|item| item.item_id).collect()
    }

    fn stored(id: i64, movie_id: i64) -> StoredRating {
        StoredRating {
            id,
            movie_id,
            title: String::new(),
            rating: 5,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let deduped = dedup_by_key(vec![1, 2, 1, 3], |&id| id);
        assert_eq!(deduped, vec![1, 2, 3]);
    }

    #[test]
    fn test_random_walk_excludes_seeds() {
        let (ratings, catalog) = dataset();
        let items =
            recommend_from_dataset(&ratings, &catalog, &[1], options(Strategy::RandomWalk, 2))
                .unwrap();
        assert_eq!(ids(&items), vec![2, 3]);
    }

    #[test]
    fn test_neighbors_aggregates_and_dedups() {
        let (ratings, catalog) = dataset();
        let items = recommend_from_dataset(
            &ratings,
            &catalog,
            &[1, 3],
            options(Strategy::Neighbors, 2),
        )
        .unwrap();

        // seed 1 -> [2, 3], seed 3 -> [2, 1]
        assert_eq!(ids(&items), vec![2, 3, 1]);
    }

    #[test]
    fn test_unmapped_seeds_are_skipped() {
        let (ratings, catalog) = dataset();
        let items = recommend_from_dataset(
            &ratings,
            &catalog,
            &[4, 999, 1],
            options(Strategy::RandomWalk, 5),
        )
        .unwrap();
        assert_eq!(ids(&items), vec![2, 3]);
    }

    #[test]
    fn test_no_mapped_seeds_gives_empty_list() {
        let (ratings, catalog) = dataset();
        let items =
            recommend_from_dataset(&ratings, &catalog, &[999], RecommendationOptions::default())
                .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_items_missing_from_catalog_are_skipped() {
        let (ratings, _) = dataset();
        let catalog = ItemCatalog::from_items(vec![CatalogItem::new(3, "Movie 3")]);
        let items =
            recommend_from_dataset(&ratings, &catalog, &[1], options(Strategy::RandomWalk, 5))
                .unwrap();
        assert_eq!(ids(&items), vec![3]);
    }

    #[tokio::test]
    async fn test_recommend_reports_missing_dataset() {
        let mut store = MockRatingStore::new();
        store
            .expect_list_ratings()
            .returning(|| Ok(vec![stored(1, 1)]));

        let dir = tempfile::TempDir::new().unwrap();
        let paths = DatasetPaths::from_dir(dir.path());
        let result = recommend(&store, &paths, RecommendationOptions::default()).await;

        assert!(matches!(result, Err(AppError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_recommend_reads_store_in_insertion_order() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ratings.csv"),
            "userId,movieId,rating,timestamp\n1,1,5,0\n1,2,5,0\n2,2,5,0\n2,3,5,0\n3,1,5,0\n3,2,5,0\n3,3,5,0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n1,One (2001),Drama\n2,Two (2002),Drama\n3,Three (2003),Comedy\n",
        )
        .unwrap();

        let mut store = MockRatingStore::new();
        store
            .expect_list_ratings()
            .returning(|| Ok(vec![stored(2, 3), stored(1, 1)]));

        let paths = DatasetPaths::from_dir(dir.path());
        let items = recommend(&store, &paths, options(Strategy::Neighbors, 1))
            .await
            .unwrap();

        // seed 1 first (oldest rating) -> 2; seed 3 -> 2 again, deduplicated
        assert_eq!(ids(&items), vec![2]);
        assert_eq!(items[0].year, Some(2002));
    }
}
