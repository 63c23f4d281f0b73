pub mod movie;
pub mod rating;

pub use movie::{MovieSummary, RecommendedMovie};
pub use rating::{NewRating, RatingStats, StoredRating, MAX_TITLE_CHARS};
