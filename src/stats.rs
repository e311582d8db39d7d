//! Order-statistic helpers on materialized samples.
//!
//! These are the plain O(n log n) building blocks: a sorted private copy
//! of a sample, its median, and R-7 quantiles. The fast pairwise
//! estimators never materialize their pairwise collections, but they sort
//! their inputs with [`sorted`] and the test oracles use [`median`] and
//! [`quantile_sorted`] on explicitly materialized pairs.
//!
//! # Algorithms
//!
//! - **Quantile**: R-7 linear interpolation (default in R, Python, Excel).
//!   Reference: Hyndman & Fan (1996), "Sample Quantiles in Statistical
//!   Packages", *The American Statistician* 50(4).

/// Returns a sorted copy of `data`, leaving the caller's slice untouched.
///
/// Uses the IEEE 754 total order, so the result is well defined even if
/// the caller skipped validation.
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut copy = data.to_vec();
    copy.sort_unstable_by(f64::total_cmp);
    copy
}

/// Returns `true` if `data` is in non-decreasing order.
pub fn is_sorted(data: &[f64]) -> bool {
    data.windows(2).all(|w| w[0] <= w[1])
}

/// Average of two finite values that stays finite near `f64::MAX`.
///
/// Halves before adding only when the plain sum overflows, so ordinary
/// and subnormal inputs round exactly like `(a + b) / 2`.
///
/// # Examples
/// ```
/// use u_robust::stats::midpoint;
/// assert_eq!(midpoint(1.0, 4.0), 2.5);
/// assert_eq!(midpoint(f64::MAX, f64::MAX), f64::MAX);
/// ```
pub fn midpoint(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum.is_finite() {
        sum / 2.0
    } else {
        a / 2.0 + b / 2.0
    }
}

/// Computes the median of `data` without mutating the input.
///
/// # Returns
/// - `None` if `data` is empty or contains NaN.
///
/// # Examples
/// ```
/// use u_robust::stats::median;
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
/// ```
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() || data.iter().any(|x| x.is_nan()) {
        return None;
    }
    let sorted = sorted(data);
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some(midpoint(sorted[n / 2 - 1], sorted[n / 2]))
    }
}

/// Computes the `p`-th quantile on **pre-sorted** data (R-7 method).
///
/// # Algorithm
/// For sorted data `x[0..n]` and quantile `p ∈ [0, 1]`:
/// 1. Compute `h = (n − 1) × p`
/// 2. Let `j = ⌊h⌋` and `g = h − j`
/// 3. Return `(1 − g) × x[j] + g × x[j+1]`
///
/// The caller must guarantee that `sorted_data` is sorted in
/// non-decreasing order.
///
/// # Returns
/// - `None` if `sorted_data` is empty or `p` is outside `[0, 1]`.
///
/// # Examples
/// ```
/// use u_robust::stats::quantile_sorted;
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile_sorted(&data, 0.0), Some(1.0));
/// assert_eq!(quantile_sorted(&data, 0.5), Some(3.0));
/// assert_eq!(quantile_sorted(&data, 0.125), Some(1.5));
/// ```
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    let n = sorted_data.len();
    if n == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if n == 1 {
        return Some(sorted_data[0]);
    }

    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();

    if j + 1 >= n {
        Some(sorted_data[n - 1])
    } else if g == 0.0 {
        Some(sorted_data[j])
    } else {
        Some((1.0 - g) * sorted_data[j] + g * sorted_data[j + 1])
    }
}
