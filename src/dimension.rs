// src/dimension.rs

use log::trace;

/// Indices of `values` ordered from largest to smallest value.
///
/// The sort is stable: equal values keep ascending index order, so the
/// permutation is deterministic for a given input.
pub fn descending_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

/// Number of leading components (in `order`) to keep.
///
/// Components are accumulated greedily from the largest variance until the
/// running sum reaches `total * pratio` or the cap `min(variances.len(), max_out_dim)`
/// is hit. At least one component is kept whenever any variance exists.
///
/// * `variances` - Per-direction variances, any order.
/// * `order` - Descending permutation of `variances`, see [`descending_order`].
/// * `total` - Sum of `variances`.
/// * `max_out_dim` - Hard upper bound on the result.
/// * `pratio` - Target fraction of `total` to retain, in `(0, 1]`.
pub fn choose_output_dim(
    variances: &[f64],
    order: &[usize],
    total: f64,
    max_out_dim: usize,
    pratio: f64,
) -> usize {
    debug_assert_eq!(variances.len(), order.len());
    if variances.is_empty() {
        return 0;
    }
    let cap = variances.len().min(max_out_dim);
    let threshold = total * pratio;

    let mut k = 1;
    let mut accumulated = variances[order[0]];
    while k < cap && accumulated < threshold {
        accumulated += variances[order[k]];
        k += 1;
    }
    trace!(
        "Selected {} of {} components: retained {:.6e} against threshold {:.6e}",
        k,
        variances.len(),
        accumulated,
        threshold
    );
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choose(variances: &[f64], max_out_dim: usize, pratio: f64) -> usize {
        let order = descending_order(variances);
        let total: f64 = variances.iter().sum();
        choose_output_dim(variances, &order, total, max_out_dim, pratio)
    }

    #[test]
    fn test_descending_order_sorts_largest_first() {
        assert_eq!(descending_order(&[1.0, 5.0, 3.0]), vec![1, 2, 0]);
    }

    #[test]
    fn test_descending_order_breaks_ties_by_index() {
        assert_eq!(descending_order(&[1.0, 3.0, 1.0, 3.0]), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_threshold_met_exactly_stops() {
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 4, 0.8), 2);
    }

    #[test]
    fn test_threshold_just_above_takes_next() {
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 4, 0.81), 3);
    }

    #[test]
    fn test_max_out_dim_caps_selection() {
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 1, 1.0), 1);
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 1, 0.1), 1);
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 2, 1.0), 2);
    }

    #[test]
    fn test_full_ratio_keeps_everything() {
        assert_eq!(choose(&[5.0, 3.0, 1.0, 1.0], 10, 1.0), 4);
    }

    #[test]
    fn test_unsorted_input_uses_permutation() {
        // same spectrum as [5, 3, 1, 1], shuffled
        assert_eq!(choose(&[1.0, 3.0, 1.0, 5.0], 4, 0.8), 2);
    }

    #[test]
    fn test_always_keeps_one() {
        assert_eq!(choose(&[2.0, 2.0], 5, 1e-9), 1);
        assert_eq!(choose(&[0.0, 0.0, 0.0], 3, 0.5), 1);
    }

    #[test]
    fn test_empty_variances_select_nothing() {
        assert_eq!(choose_output_dim(&[], &[], 0.0, 3, 0.99), 0);
    }
}
