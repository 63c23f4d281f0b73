use chrono::Utc;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{NewRating, RatingStats, StoredRating},
};

/// Durable store of user-submitted ratings
///
/// The recommendation pipeline only reads from it; the HTTP layer writes to it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Persists a validated rating and returns the stored row
    async fn add_rating(&self, rating: NewRating) -> AppResult<StoredRating>;

    /// All stored ratings, newest first
    async fn list_ratings(&self) -> AppResult<Vec<StoredRating>>;

    /// Average and count per movie
    async fn rating_stats(&self) -> AppResult<Vec<RatingStats>>;
}

/// Postgres-backed rating store
#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgRatingStore {
    async fn add_rating(&self, rating: NewRating) -> AppResult<StoredRating> {
        let stored = sqlx::query_as::<_, StoredRating>(
            r#"
            INSERT INTO ratings (movie_id, title, rating)
            VALUES ($1, $2, $3)
            RETURNING id, movie_id, title, rating, created_at
            "#,
        )
        .bind(rating.movie_id)
        .bind(&rating.title)
        .bind(rating.rating)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = stored.id, movie_id = stored.movie_id, "Rating stored");

        Ok(stored)
    }

    async fn list_ratings(&self) -> AppResult<Vec<StoredRating>> {
        let ratings = sqlx::query_as::<_, StoredRating>(
            r#"
            SELECT id, movie_id, title, rating, created_at
            FROM ratings
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn rating_stats(&self) -> AppResult<Vec<RatingStats>> {
        let stats = sqlx::query_as::<_, RatingStats>(
            r#"
            SELECT movie_id, AVG(rating)::DOUBLE PRECISION AS avg, COUNT(*) AS count
            FROM ratings
            GROUP BY movie_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Process-local rating store, used when no database is configured
#[derive(Default)]
pub struct InMemoryRatingStore {
    ratings: RwLock<Vec<StoredRating>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn add_rating(&self, rating: NewRating) -> AppResult<StoredRating> {
        let mut ratings = self.ratings.write().await;
        let stored = StoredRating {
            id: ratings.len() as i64 + 1,
            movie_id: rating.movie_id,
            title: rating.title,
            rating: rating.rating,
            created_at: Utc::now(),
        };
        ratings.push(stored.clone());
        Ok(stored)
    }

    async fn list_ratings(&self) -> AppResult<Vec<StoredRating>> {
        let ratings = self.ratings.read().await;
        Ok(ratings.iter().rev().cloned().collect())
    }

    async fn rating_stats(&self) -> AppResult<Vec<RatingStats>> {
        let ratings = self.ratings.read().await;
        let mut totals: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
        for rating in ratings.iter() {
            let (sum, count) = totals.entry(rating.movie_id).or_insert((0, 0));
            *sum += rating.rating as i64;
            *count += 1;
        }

        Ok(totals
            .into_iter()
            .map(|(movie_id, (sum, count))| RatingStats {
                movie_id,
                avg: sum as f64 / count as f64,
                count,
            })
            .collect())
    }
}
