use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{EngineError, EngineResult};
use super::graph::TransitionMatrix;

/// Iteration every which the walk reports its current leaders
const TELEMETRY_INTERVAL: usize = 100;

/// Power-iteration settings for the random walk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalk {
    pub max_iterations: usize,
    /// Stop once the L1 change between successive vectors falls below this
    pub tolerance: f64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
        }
    }
}

/// Outcome of one propagation, with its convergence details
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationRun {
    pub scores: ScoreVector,
    /// Number of matrix steps performed
    pub iterations: usize,
    /// L1 change of the last step (infinite when no step ran)
    pub diff_l1: f64,
    pub converged: bool,
}

impl RandomWalk {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    pub fn propagate(
        &self,
        matrix: &TransitionMatrix,
        start_items: &[usize],
    ) -> EngineResult<ScoreVector> {
        self.run(matrix, start_items).map(|run| run.scores)
    }

    /// Seeds `1 / |start_items|` on each distinct start item and pushes the
    /// mass along the transitions until the change drops below `tolerance`
    /// or `max_iterations` steps have run. Running out of iterations is not an
    /// error; the last vector is returned.
    pub fn run(
        &self,
        matrix: &TransitionMatrix,
        start_items: &[usize],
    ) -> EngineResult<PropagationRun> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        let mut scores = seed(matrix.nb_items(), start_items)?;
        let mut next = vec![0.0; scores.len()];
        let mut iterations = 0;
        let mut diff_l1 = f64::INFINITY;
        let mut converged = false;

        for iteration in 0..self.max_iterations {
            matrix.left_multiply_into(&scores, &mut next);
            diff_l1 = scores
                .iter()
                .zip(next.iter())
                .map(|(old, new)| (old - new).abs())
                .sum();
            std::mem::swap(&mut scores, &mut next);
            iterations = iteration + 1;

            if iteration % TELEMETRY_INTERVAL == 0 && tracing::enabled!(tracing::Level::TRACE) {
                let leaders = ScoreVector(scores.clone()).top_k(3);
                tracing::trace!(iteration, diff_l1, leaders = ?leaders, "Random walk progress");
            }

            if diff_l1 < self.tolerance {
                converged = true;
                break;
            }
        }

        tracing::debug!(
            items = matrix.nb_items(),
            seeds = start_items.len(),
            iterations,
            diff_l1,
            converged,
            "Random walk finished"
        );

        Ok(PropagationRun {
            scores: ScoreVector(scores),
            iterations,
            diff_l1,
            converged,
        })
    }
}

/// Propagates with explicit iteration settings
pub fn propagate(
    matrix: &TransitionMatrix,
    start_items: &[usize],
    max_iterations: usize,
    tolerance: f64,
) -> EngineResult<ScoreVector> {
    RandomWalk::new(max_iterations, tolerance).propagate(matrix, start_items)
}

fn seed(nb_items: usize, start_items: &[usize]) -> EngineResult<Vec<f64>> {
    if start_items.is_empty() {
        return Err(EngineError::InvalidInput(
            "at least one start item is required".to_string(),
        ));
    }
    if let Some(&item) = start_items.iter().find(|&&item| item >= nb_items) {
        return Err(EngineError::InvalidInput(format!(
            "start item {} is outside the {} indexed items",
            item, nb_items
        )));
    }

    let distinct: HashSet<usize> = start_items.iter().copied().collect();
    let mass = 1.0 / distinct.len() as f64;
    let mut scores = vec![0.0; nb_items];
    for item in distinct {
        scores[item] = mass;
    }
    Ok(scores)
}

/// Random-walk probability mass per dense item index
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector(Vec<f64>);

impl ScoreVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, item: usize) -> Option<f64> {
        self.0.get(item).copied()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// All item indices by descending score; equal scores keep the lower index first
    pub fn ranking(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.0.len()).collect();
        order.sort_by(|&a, &b| self.0[b].total_cmp(&self.0[a]).then(a.cmp(&b)));
        order
    }

    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        self.top_k_excluding(k, &[])
    }

    /// Top `k` entries of the ranking, skipping the given item indices
    pub fn top_k_excluding(&self, k: usize, exclude: &[usize]) -> Vec<(usize, f64)> {
        let exclude: HashSet<usize> = exclude.iter().copied().collect();
        self.ranking()
            .into_iter()
            .filter(|item| !exclude.contains(item))
            .take(k)
            .map(|item| (item, self.0[item]))
            .collect()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for ScoreVector {
    fn from(scores: Vec<f64>) -> Self {
        Self(scores)
    }
}
