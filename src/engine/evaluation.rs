//! Offline leave-last-out evaluation of the random-walk recommender.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::dataset::CleanedRatings;
use super::error::EngineResult;
use super::graph::TransitionMatrix;
use super::metrics::precision_at_k;
use super::propagation::RandomWalk;

/// Training table plus one held-out `(dense_user, dense_item)` per eligible user
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    pub training: CleanedRatings,
    pub held_out: Vec<(usize, usize)>,
}

/// Holds out each user's most recent liked item.
///
/// Only users with at least two distinct liked items are eligible, so every
/// held-out user keeps at least one training item to seed from. On equal
/// timestamps the later row wins. Every row of a held-out `(user, item)` pair
/// leaves the training table, repeated likes included.
pub fn holdout_split(ratings: &CleanedRatings) -> HoldoutSplit {
    let mut items_per_user: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut latest: HashMap<usize, usize> = HashMap::new();

    for (position, row) in ratings.rows().iter().enumerate() {
        items_per_user
            .entry(row.dense_user)
            .or_default()
            .insert(row.dense_item);
        let current = latest.entry(row.dense_user).or_insert(position);
        if row.record.timestamp >= ratings.rows()[*current].record.timestamp {
            *current = position;
        }
    }

    let mut held_out: Vec<(usize, usize)> = latest
        .into_iter()
        .filter(|(user, _)| items_per_user[user].len() >= 2)
        .map(|(_, position)| {
            let row = &ratings.rows()[position];
            (row.dense_user, row.dense_item)
        })
        .collect();
    held_out.sort_unstable();

    let held_pairs: HashSet<(usize, usize)> = held_out.iter().copied().collect();
    let training = ratings.subset(|row| !held_pairs.contains(&(row.dense_user, row.dense_item)));

    HoldoutSplit { training, held_out }
}

/// Mean precision@k over all held-out users
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub users: usize,
    pub k: usize,
    pub mean_precision: f64,
}

/// Trains on the hold-out split and scores top-k walks against the held-out item.
///
/// Recommendations exclude the user's training items.
pub fn evaluate(ratings: &CleanedRatings, k: usize, walk: &RandomWalk) -> EngineResult<EvaluationReport> {
    let split = holdout_split(ratings);
    let matrix = TransitionMatrix::build_with_item_count(&split.training, ratings.nb_items())?;
    let training_likes = split.training.liked_by_user();

    let mut users = 0;
    let mut total = 0.0;
    for &(user, item) in &split.held_out {
        let seeds = &training_likes[user];
        if seeds.is_empty() {
            continue;
        }
        let scores = walk.propagate(&matrix, seeds)?;
        let recommended: Vec<usize> = scores
            .top_k_excluding(k, seeds)
            .into_iter()
            .map(|(item, _)| item)
            .collect();
        total += precision_at_k(&recommended, &HashSet::from([item]), k);
        users += 1;
    }

    let mean_precision = if users > 0 { total / users as f64 } else { 0.0 };
    tracing::info!(users, k, mean_precision, "Evaluation finished");

    Ok(EvaluationReport {
        users,
        k,
        mean_precision,
    })
}
