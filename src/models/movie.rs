use serde::Serialize;

use crate::engine::CatalogItem;

use super::RatingStats;

/// A catalog entry with the ratings users submitted for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub movie_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    /// Average rating rounded to two decimals; absent without ratings
    pub avg: Option<f64>,
    pub count: i64,
}

impl MovieSummary {
    pub fn new(item: &CatalogItem, stats: Option<&RatingStats>) -> Self {
        let (avg, count) = match stats {
            Some(stats) if stats.count > 0 => {
                (Some((stats.avg * 100.0).round() / 100.0), stats.count)
            }
            _ => (None, 0),
        };

        Self {
            movie_id: item.item_id,
            title: item.title.clone(),
            year: item.year,
            genres: item.genres.clone(),
            avg,
            count,
        }
    }
}

/// A recommended catalog entry returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    /// Poster image URL, when the lookup service knows one
    pub poster_url: Option<String>,
}

impl From<CatalogItem> for RecommendedMovie {
    fn from(item: CatalogItem) -> Self {
        Self {
            movie_id: item.item_id,
            title: item.title,
            year: item.year,
            genres: item.genres,
            poster_url: None,
        }
    }
}
