//! FastShift: quantiles of pairwise differences between two samples.
//!
//! Shift is the median of all `n·m` differences `x_i - y_j`, the
//! Hodges-Lehmann two-sample shift estimator. This module computes any
//! set of Type-7 quantiles of those differences without materializing
//! them, which also yields the endpoints of the shift bounds.
//!
//! # Algorithm
//!
//! Each required order statistic is found by binary search over the
//! ordered bit patterns of `f64`, so a step halves the number of
//! representable candidates no matter how many orders of magnitude the
//! differences span. A two-pointer sweep over the sorted samples counts
//! the differences `<= t` in O(n + m) and records the nearest differences
//! on either side of `t`. The search interval always snaps to actual
//! differences, so it closes on the exact order statistic rather than an
//! approximation of it.
//!
//! # Complexity
//! Time: O(k · (n + m) · 64) for `k` distinct ranks, Space: O(n + m)
//! for the sorted copies.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::ShiftConfig;
use crate::error::{check_positivity, check_validity, Error, Result, Subject};
use crate::stats::{is_sorted, sorted};

/// Computes Shift, the median of pairwise differences `x_i - y_j`.
///
/// # Errors
/// `validity(x)` / `validity(y)` for an empty sample or a non-finite value.
///
/// # Examples
/// ```
/// use u_robust::shift::fast_shift;
/// let x = [0.0, 3.0, 6.0, 9.0, 12.0];
/// let y = [0.0, 2.0, 4.0, 6.0, 8.0];
/// assert_eq!(fast_shift(&x, &y).unwrap(), 2.0);
/// ```
pub fn fast_shift(x: &[f64], y: &[f64]) -> Result<f64> {
    let q = shift_quantiles(x, y, &[0.5])?;
    Ok(q[0])
}

/// Computes Type-7 quantiles of the pairwise differences `x_i - y_j`,
/// one per entry of `p`.
///
/// # Errors
/// - `validity(x)` / `validity(y)` for an empty sample or a non-finite value.
/// - `domain(p)` if any probability is NaN or outside `[0, 1]`.
/// - [`Error::Convergence`] if a rank is not resolved within the
///   iteration cap. The default cap is never reached for finite input.
pub fn shift_quantiles(x: &[f64], y: &[f64], p: &[f64]) -> Result<Vec<f64>> {
    shift_quantiles_with(x, y, p, &ShiftConfig::default())
}

/// [`shift_quantiles`] with explicit options.
///
/// With `config.assume_sorted` the samples are used as given; passing
/// unsorted samples then produces meaningless output.
pub fn shift_quantiles_with(
    x: &[f64],
    y: &[f64],
    p: &[f64],
    config: &ShiftConfig,
) -> Result<Vec<f64>> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    check_probabilities(p)?;

    if config.assume_sorted {
        debug_assert!(is_sorted(x) && is_sorted(y), "assume_sorted with unsorted input");
        quantiles_of_sorted(x, y, p, config.max_iterations)
    } else {
        quantiles_of_sorted(&sorted(x), &sorted(y), p, config.max_iterations)
    }
}

/// Computes Type-7 quantiles of the pairwise ratios `x_i / y_j`.
///
/// Runs the difference search on logarithms and maps the result back,
/// so both samples must be strictly positive.
///
/// # Errors
/// As [`shift_quantiles_with`], plus `positivity(x)` / `positivity(y)`.
pub fn ratio_quantiles(x: &[f64], y: &[f64], p: &[f64], config: &ShiftConfig) -> Result<Vec<f64>> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    check_probabilities(p)?;
    check_positivity(x, Subject::X)?;
    check_positivity(y, Subject::Y)?;

    let log_x: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let log_y: Vec<f64> = y.iter().map(|v| v.ln()).collect();
    let log_q = shift_quantiles_with(&log_x, &log_y, p, config)?;
    Ok(log_q.into_iter().map(f64::exp).collect())
}

fn check_probabilities(p: &[f64]) -> Result<()> {
    if p.iter().any(|pk| !(0.0..=1.0).contains(pk)) {
        return Err(Error::domain(Subject::P));
    }
    Ok(())
}

/// Type-7 interpolation between two adjacent ranks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interpolation {
    lower: u64,
    upper: u64,
    weight: f64,
}

impl Interpolation {
    fn type7(total: u64, p: f64) -> Self {
        let h = 1.0 + (total - 1) as f64 * p;
        let lower = h.floor();
        Self {
            lower: (lower as u64).max(1),
            upper: (h.ceil() as u64).min(total),
            weight: h - lower,
        }
    }

    fn apply(&self, values: &BTreeMap<u64, f64>) -> f64 {
        let lower = values[&self.lower];
        if self.weight == 0.0 {
            return lower;
        }
        let upper = values[&self.upper];
        (1.0 - self.weight) * lower + self.weight * upper
    }
}

fn quantiles_of_sorted(x: &[f64], y: &[f64], p: &[f64], max_iterations: usize) -> Result<Vec<f64>> {
    let total = x.len() as u64 * y.len() as u64;
    let plans: Vec<Interpolation> = p.iter().map(|&pk| Interpolation::type7(total, pk)).collect();

    // Shared ranks across probabilities are searched once.
    let mut values: BTreeMap<u64, f64> = BTreeMap::new();
    for plan in &plans {
        values.insert(plan.lower, f64::NAN);
        values.insert(plan.upper, f64::NAN);
    }
    for (&rank, value) in values.iter_mut() {
        *value = select_kth_difference(x, y, rank, max_iterations)?;
    }

    Ok(plans.iter().map(|plan| plan.apply(&values)).collect())
}

/// Outcome of one counting sweep at threshold `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Count {
    /// Number of differences `<= t`.
    at_or_below: u64,
    /// Largest difference `<= t` (`-inf` if none).
    closest_below: f64,
    /// Smallest difference `> t` (`+inf` if none).
    closest_above: f64,
}

/// Two-pointer count of the differences `x_i - y_j <= threshold`.
fn count_at_or_below(x: &[f64], y: &[f64], threshold: f64) -> Count {
    let n = y.len();
    let mut count = Count {
        at_or_below: 0,
        closest_below: f64::NEG_INFINITY,
        closest_above: f64::INFINITY,
    };

    // First j with x_i - y_j <= threshold; only moves forward as x_i grows.
    let mut j = 0;
    for &xi in x {
        while j < n && xi - y[j] > threshold {
            j += 1;
        }
        count.at_or_below += (n - j) as u64;
        if j < n {
            count.closest_below = count.closest_below.max(xi - y[j]);
        }
        if j > 0 {
            count.closest_above = count.closest_above.min(xi - y[j - 1]);
        }
    }
    count
}

/// Maps `f64` onto `u64` so that integer order matches numeric order.
///
/// Adjacent floats map to adjacent integers, so halving the integer
/// range halves the number of representable candidates.
fn ordinal(value: f64) -> u64 {
    let bits = value.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

fn from_ordinal(key: u64) -> f64 {
    if key >> 63 == 1 {
        f64::from_bits(key & !(1 << 63))
    } else {
        f64::from_bits(!key)
    }
}

/// Finds the `k`-th smallest (1-based) difference `x_i - y_j` of two
/// sorted samples.
///
/// Bisects the ordinal range between the current bounds, which always
/// sit on actual differences. Every step at least halves that range, so
/// the search ends within 65 iterations whatever the magnitudes involved.
fn select_kth_difference(x: &[f64], y: &[f64], k: u64, max_iterations: usize) -> Result<f64> {
    let (m, n) = (x.len(), y.len());
    let mut lo = x[0] - y[n - 1];
    let mut hi = x[m - 1] - y[0];

    for iteration in 1..=max_iterations {
        if lo == hi {
            return Ok(lo);
        }

        let (lo_key, hi_key) = (ordinal(lo), ordinal(hi));
        let mid = from_ordinal(lo_key + (hi_key - lo_key) / 2);
        let count = count_at_or_below(x, y, mid);
        trace!(rank = k, iteration, lo, hi, count = count.at_or_below, "shift search");

        if count.at_or_below >= k {
            hi = count.closest_below;
        } else {
            lo = count.closest_above;
        }
    }

    if lo == hi {
        return Ok(lo);
    }
    debug!(rank = k, lo, hi, "shift search hit its iteration cap");
    Err(Error::Convergence {
        rank: k,
        iterations: max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Type-7 quantile of the materialized differences.
    pub(super) fn naive_quantile(x: &[f64], y: &[f64], p: f64) -> f64 {
        let mut diffs: Vec<f64> = x.iter().flat_map(|xi| y.iter().map(move |yj| xi - yj)).collect();
        diffs.sort_by(f64::total_cmp);
        let h = 1.0 + (diffs.len() - 1) as f64 * p;
        let (lower, upper) = (h.floor() as usize, h.ceil() as usize);
        let weight = h - h.floor();
        if weight == 0.0 {
            diffs[lower - 1]
        } else {
            (1.0 - weight) * diffs[lower - 1] + weight * diffs[upper - 1]
        }
    }

    #[test]
    fn test_median_shift() {
        let x = [0.0, 3.0, 6.0, 9.0, 12.0];
        let y = [0.0, 2.0, 4.0, 6.0, 8.0];
        assert_eq!(fast_shift(&x, &y).unwrap(), 2.0);
        assert_eq!(fast_shift(&y, &x).unwrap(), -2.0);
    }

    #[test]
    fn test_single_pair() {
        assert_eq!(fast_shift(&[5.0], &[2.0]).unwrap(), 3.0);
        let q = shift_quantiles(&[5.0], &[2.0], &[0.0, 0.3, 1.0]).unwrap();
        assert_eq!(q, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_extremes_are_min_and_max() {
        let x = [1.0, 4.0, 9.0];
        let y = [2.0, 3.0];
        let q = shift_quantiles(&x, &y, &[0.0, 1.0]).unwrap();
        assert_eq!(q, vec![-2.0, 7.0]);
    }

    #[test]
    fn test_interpolates_between_ranks() {
        // differences: 0, 1, 2, 3
        let q = shift_quantiles(&[2.0, 3.0], &[0.0, 2.0], &[0.5, 0.25]).unwrap();
        assert_eq!(q, vec![1.5, 0.75]);
    }

    #[test]
    fn test_empty_probabilities() {
        assert_eq!(shift_quantiles(&[1.0], &[2.0], &[]).unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_assume_sorted() {
        let x = [1.0, 2.0, 4.0, 8.0];
        let y = [-1.0, 0.5, 3.0];
        let config = ShiftConfig::new().assume_sorted(true);
        let fast = shift_quantiles_with(&x, &y, &[0.1, 0.5, 0.9], &config).unwrap();
        let plain = shift_quantiles(&x, &y, &[0.1, 0.5, 0.9]).unwrap();
        assert_eq!(fast, plain);
    }

    #[test]
    fn test_invalid_samples() {
        assert_eq!(fast_shift(&[], &[1.0]), Err(Error::validity(Subject::X)));
        assert_eq!(fast_shift(&[1.0], &[]), Err(Error::validity(Subject::Y)));
        assert_eq!(
            fast_shift(&[f64::NAN], &[]),
            Err(Error::validity(Subject::X))
        );
        assert_eq!(
            fast_shift(&[1.0], &[f64::NAN]),
            Err(Error::validity(Subject::Y))
        );
    }

    #[test]
    fn test_invalid_probabilities() {
        for bad in [-0.01, 1.01, f64::NAN] {
            assert_eq!(
                shift_quantiles(&[1.0], &[2.0], &[0.5, bad]),
                Err(Error::domain(Subject::P))
            );
        }
    }

    #[test]
    fn test_convergence_error() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let config = ShiftConfig::new().max_iterations(1);
        let err = shift_quantiles_with(&x, &[0.0], &[0.5], &config).unwrap_err();
        assert_eq!(
            err,
            Error::Convergence {
                rank: 5,
                iterations: 1
            }
        );
        assert_eq!(err.violation(), None);
    }

    #[test]
    fn test_adjacent_floats_resolve() {
        let a = 1.0_f64;
        let b = f64::from_bits(a.to_bits() + 1);
        assert_eq!(shift_quantiles(&[a, b], &[0.0], &[0.0]).unwrap(), vec![a]);
        assert_eq!(shift_quantiles(&[a, b], &[0.0], &[1.0]).unwrap(), vec![b]);
    }

    #[test]
    fn test_differences_spanning_many_decades() {
        let x: Vec<f64> = (-300..=300).map(|k| 10f64.powi(k)).collect();
        let y = [0.0];
        assert_eq!(fast_shift(&x, &y).unwrap(), 1.0);
        let q = shift_quantiles(&x, &y, &[0.0, 0.1, 0.9, 1.0]).unwrap();
        let expected: Vec<f64> = [0.0, 0.1, 0.9, 1.0]
            .iter()
            .map(|&p| naive_quantile(&x, &y, p))
            .collect();
        assert_eq!(q, expected);
    }

    #[test]
    fn test_extreme_magnitudes_within_default_cap() {
        let x = [-f64::MAX, -1e-300, 0.0, f64::from_bits(1), 1e300, f64::MAX];
        let y = [-f64::MAX, 0.0, f64::MAX];
        for p in [0.0, 0.2, 0.5, 0.8, 1.0] {
            let q = shift_quantiles(&x, &y, &[p]).unwrap();
            assert_eq!(q[0], naive_quantile(&x, &y, p), "p = {p}");
        }
    }

    #[test]
    fn test_ordinal_preserves_order() {
        let values = [
            f64::NEG_INFINITY,
            -f64::MAX,
            -1.0,
            -f64::from_bits(1),
            -0.0,
            0.0,
            f64::from_bits(1),
            1.0,
            f64::MAX,
            f64::INFINITY,
        ];
        for w in values.windows(2) {
            assert!(ordinal(w[0]) < ordinal(w[1]), "{} vs {}", w[0], w[1]);
        }
        for v in values {
            assert_eq!(from_ordinal(ordinal(v)).to_bits(), v.to_bits());
        }
        assert_eq!(ordinal(0.0) - ordinal(-0.0), 1);
        assert_eq!(ordinal(f64::from_bits(1)) - ordinal(0.0), 1);
    }

    #[test]
    fn test_ratio_quantiles() {
        let x = [1.0, 2.0, 4.0, 8.0, 16.0];
        let y = [2.0, 4.0, 8.0, 16.0, 32.0];
        let q = ratio_quantiles(&x, &y, &[0.5], &ShiftConfig::default()).unwrap();
        assert!((q[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_requires_positive() {
        let config = ShiftConfig::default();
        assert_eq!(
            ratio_quantiles(&[1.0, 0.0], &[1.0], &[0.5], &config),
            Err(Error::positivity(Subject::X))
        );
        assert_eq!(
            ratio_quantiles(&[1.0], &[-2.0], &[0.5], &config),
            Err(Error::positivity(Subject::Y))
        );
    }

    #[test]
    fn test_count_at_or_below() {
        // differences: -1, 0, 1, 2
        let c = count_at_or_below(&[1.0, 2.0], &[0.0, 2.0], 0.5);
        assert_eq!(c.at_or_below, 2);
        assert_eq!(c.closest_below, 0.0);
        assert_eq!(c.closest_above, 1.0);
    }
}
