use std::collections::HashSet;
use std::hash::Hash;

/// Fraction of the first `k` recommendations that are relevant.
///
/// Always divides by `k`, even when fewer than `k` recommendations are
/// supplied. Returns 0 for `k == 0` instead of failing.
pub fn precision_at_k<T: Eq + Hash>(recommended: &[T], relevant: &HashSet<T>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = recommended
        .iter()
        .take(k)
        .filter(|item| relevant.contains(*item))
        .collect::<HashSet<_>>()
        .len();
    hits as f64 / k as f64
}
