//! Graph-based collaborative filtering engine.
//!
//! The pipeline is fully synchronous and holds no state between calls:
//! ratings are loaded and cleaned ([`dataset`]), turned into an item
//! co-occurrence transition matrix ([`graph`]), and a personalized score
//! vector is diffused across it ([`propagation`]). [`metrics`] and
//! [`evaluation`] score the result offline.

pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod graph;
pub mod metrics;
pub mod propagation;

pub use dataset::{
    load, CatalogItem, CleanedRating, CleanedRatings, DatasetPaths, ItemCatalog, RatingRecord,
    LIKED_THRESHOLD,
};
pub use error::{EngineError, EngineResult, LoadError};
pub use evaluation::{evaluate, holdout_split, EvaluationReport, HoldoutSplit};
pub use graph::{CoOccurrenceCounts, TransitionMatrix};
pub use metrics::precision_at_k;
pub use propagation::{propagate, PropagationRun, RandomWalk, ScoreVector};
