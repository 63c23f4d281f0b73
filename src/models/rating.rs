use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Longest title kept for a submitted rating
pub const MAX_TITLE_CHARS: usize = 200;

/// A rating persisted in the rating store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredRating {
    pub id: i64,
    pub movie_id: i64,
    pub title: String,
    /// Integer rating from 1 to 5
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

/// A rating submitted by a user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRating {
    pub movie_id: i64,
    #[serde(default)]
    pub title: String,
    pub rating: i32,
}

impl NewRating {
    pub fn new(movie_id: i64, title: impl Into<String>, rating: i32) -> Self {
        Self {
            movie_id,
            title: title.into(),
            rating,
        }
    }

    /// Checks the rating range and truncates the title to [`MAX_TITLE_CHARS`]
    pub fn validated(mut self) -> AppResult<Self> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        if let Some((cut, _)) = self.title.char_indices().nth(MAX_TITLE_CHARS) {
            self.title.truncate(cut);
        }
        Ok(self)
    }
}

/// Aggregated ratings for one movie
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RatingStats {
    pub movie_id: i64,
    pub avg: f64,
    pub count: i64,
}
