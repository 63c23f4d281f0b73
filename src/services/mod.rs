pub mod catalog;
pub mod posters;
pub mod recommendations;

pub use posters::{OmdbPosterProvider, PosterProvider};
pub use recommendations::{recommend, RecommendationOptions, Strategy};
