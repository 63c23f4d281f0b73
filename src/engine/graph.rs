use std::collections::BTreeMap;

use super::dataset::CleanedRatings;
use super::error::{EngineError, EngineResult};

/// Symmetric item-item co-occurrence counts.
///
/// Cell `(i, j)` is the number of distinct users who liked both `i` and `j`.
/// Only non-zero cells are stored, so memory follows the number of co-liked
/// pairs rather than `nb_items²`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoOccurrenceCounts {
    rows: Vec<BTreeMap<usize, u32>>,
}

impl CoOccurrenceCounts {
    /// Counts co-liked pairs over an item space of `nb_items`.
    ///
    /// Cost is `O(Σ k_u²)` over users' liked-item counts `k_u`.
    fn count(ratings: &CleanedRatings, nb_items: usize) -> Self {
        let mut rows = vec![BTreeMap::new(); nb_items];

        for mut liked in ratings.liked_by_user() {
            liked.sort_unstable();
            liked.dedup();
            if liked.len() < 2 {
                continue;
            }
            for (position, &i) in liked.iter().enumerate() {
                for &j in &liked[position + 1..] {
                    *rows[i].entry(j).or_insert(0) += 1;
                    *rows[j].entry(i).or_insert(0) += 1;
                }
            }
        }

        Self { rows }
    }

    pub fn nb_items(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.rows
            .get(i)
            .and_then(|row| row.get(&j))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_total(&self, i: usize) -> u64 {
        self.rows
            .get(i)
            .map(|row| row.values().map(|&c| c as u64).sum())
            .unwrap_or(0)
    }

    /// Number of stored (directed) non-zero cells
    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }
}

/// Row-stochastic item transition matrix.
///
/// Rows with co-occurrences are stored in compressed sparse row form; a row
/// with no stored entries is the uniform distribution `1 / nb_items`. Every
/// row therefore sums to 1 and the chain has no dead ends. The matrix is
/// immutable once built and can be shared between concurrent readers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    nb_items: usize,
    row_offsets: Vec<usize>,
    columns: Vec<usize>,
    probabilities: Vec<f64>,
}

impl TransitionMatrix {
    /// Builds the transition matrix over the item space of `ratings`
    pub fn build(ratings: &CleanedRatings) -> Self {
        Self::from_counts(&CoOccurrenceCounts::count(ratings, ratings.nb_items()))
    }

    /// Builds over an item space of `nb_items`, which may be larger than the
    /// number of items present in `ratings`. Extra items get uniform rows.
    pub fn build_with_item_count(ratings: &CleanedRatings, nb_items: usize) -> EngineResult<Self> {
        if nb_items < ratings.nb_items() {
            return Err(EngineError::InvalidInput(format!(
                "item space of {} is smaller than the {} indexed items",
                nb_items,
                ratings.nb_items()
            )));
        }
        Ok(Self::from_counts(&CoOccurrenceCounts::count(ratings, nb_items)))
    }

    /// Co-occurrence counts for `ratings`, exposed for inspection
    pub fn counts(ratings: &CleanedRatings) -> CoOccurrenceCounts {
        CoOccurrenceCounts::count(ratings, ratings.nb_items())
    }

    /// Divides every row by its total; zero rows become uniform
    pub fn from_counts(counts: &CoOccurrenceCounts) -> Self {
        let nb_items = counts.nb_items();
        let mut row_offsets = Vec::with_capacity(nb_items + 1);
        let mut columns = Vec::with_capacity(counts.edge_count());
        let mut probabilities = Vec::with_capacity(counts.edge_count());
        let mut uniform_rows = 0;

        row_offsets.push(0);
        for (i, row) in counts.rows.iter().enumerate() {
            let total = counts.row_total(i);
            if total == 0 {
                uniform_rows += 1;
            } else {
                for (&j, &count) in row {
                    columns.push(j);
                    probabilities.push(count as f64 / total as f64);
                }
            }
            row_offsets.push(columns.len());
        }

        tracing::debug!(
            items = nb_items,
            edges = columns.len(),
            uniform_rows,
            "Transition matrix built"
        );

        Self {
            nb_items,
            row_offsets,
            columns,
            probabilities,
        }
    }

    pub fn nb_items(&self) -> usize {
        self.nb_items
    }

    /// Number of stored non-zero transitions (uniform rows excluded)
    pub fn edge_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether row `i` has no stored entries and stands for `1/n` everywhere
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nb_items()`.
    pub fn is_uniform_row(&self, i: usize) -> bool {
        self.row_offsets[i] == self.row_offsets[i + 1]
    }

    /// Stored `(column, probability)` entries of row `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nb_items()`.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_offsets[i]..self.row_offsets[i + 1];
        self.columns[range.clone()]
            .iter()
            .copied()
            .zip(self.probabilities[range].iter().copied())
    }

    /// Transition probability from `i` to `j`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nb_items()`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.is_uniform_row(i) {
            return 1.0 / self.nb_items as f64;
        }
        let range = self.row_offsets[i]..self.row_offsets[i + 1];
        match self.columns[range.clone()].binary_search(&j) {
            Ok(position) => self.probabilities[range.start + position],
            Err(_) => 0.0,
        }
    }

    /// Dense copy of row `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.nb_items()`.
    pub fn row(&self, i: usize) -> Vec<f64> {
        if self.is_uniform_row(i) {
            return vec![1.0 / self.nb_items as f64; self.nb_items];
        }
        let mut dense = vec![0.0; self.nb_items];
        for (j, p) in self.neighbors(i) {
            dense[j] = p;
        }
        dense
    }

    /// # Panics
    ///
    /// Panics if `i >= self.nb_items()`.
    pub fn row_sum(&self, i: usize) -> f64 {
        if self.is_uniform_row(i) {
            return 1.0;
        }
        self.neighbors(i).map(|(_, p)| p).sum()
    }

    /// One Markov step: `out[j] = Σ_i P[i, j] * scores[i]`.
    ///
    /// Mass sitting on uniform rows is pooled and spread once over all items.
    pub fn left_multiply_into(&self, scores: &[f64], out: &mut [f64]) {
        debug_assert_eq!(scores.len(), self.nb_items);
        debug_assert_eq!(out.len(), self.nb_items);

        out.fill(0.0);
        let mut uniform_mass = 0.0;
        for (i, &mass) in scores.iter().enumerate() {
            if mass == 0.0 {
                continue;
            }
            if self.is_uniform_row(i) {
                uniform_mass += mass;
                continue;
            }
            for (j, p) in self.neighbors(i) {
                out[j] += p * mass;
            }
        }

        if uniform_mass > 0.0 {
            let share = uniform_mass / self.nb_items as f64;
            for value in out.iter_mut() {
                *value += share;
            }
        }
    }
}
