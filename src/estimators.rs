//! Robust point estimators and their rank-based confidence bounds.
//!
//! These are the user-facing entry points. Each one validates its
//! inputs eagerly, in the priority order described in [`crate::error`],
//! and then delegates to the fast pairwise algorithms.
//!
//! | Estimator | Definition |
//! |---|---|
//! | [`center`] | median of pairwise averages |
//! | [`spread`] | median of pairwise absolute differences |
//! | [`rel_spread`] | `spread / |center|` |
//! | [`shift`] | median of pairwise differences `x_i - y_j` |
//! | [`ratio`] | median of pairwise ratios `x_i / y_j` |
//! | [`avg_spread`] | size-weighted mean of both spreads |
//! | [`disparity`] | `shift / avg_spread` |
//!
//! Every estimator except [`ratio`] and [`rel_spread`] has a bounds
//! counterpart. [`spread_bounds`] and [`disparity_bounds`] are randomized:
//! they pair observations at random and randomize the sign-test cutoff,
//! so each takes a generator in its `*_with_rng` form and seeds one from
//! the input otherwise.
//!
//! # Examples
//! ```
//! use u_robust::estimators::{shift, shift_bounds};
//! let x: Vec<f64> = (1..=30).map(f64::from).collect();
//! let y: Vec<f64> = (21..=50).map(f64::from).collect();
//! assert_eq!(shift(&x, &y).unwrap(), -20.0);
//!
//! let b = shift_bounds(&x, &y, 1e-4).unwrap();
//! assert!(b.contains(-20.0));
//! ```

use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::center::{fast_center, pairwise_average_rank};
use crate::config::ShiftConfig;
use crate::error::{check_misrate, check_positivity, check_validity, Error, Result, Subject};
use crate::margin::{min_misrate, pairwise_margin, sign_margin, signed_rank_margin};
use crate::random::{create_rng, seed_from_values, shuffle};
use crate::shift::{fast_shift, ratio_quantiles, shift_quantiles_with};
use crate::spread::fast_spread;
use crate::stats::sorted;

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Returns `true` if `value` lies within `[lower, upper]`.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{};{}]", self.lower, self.upper)
    }
}

// ============================================================================
// Point estimators
// ============================================================================

/// Center: the Hodges-Lehmann location estimate.
pub fn center(x: &[f64]) -> Result<f64> {
    fast_center(x)
}

/// Spread: the Shamos scale estimate.
///
/// # Errors
/// `sparity(x)` if the spread is zero.
pub fn spread(x: &[f64]) -> Result<f64> {
    let value = fast_spread(x)?;
    if value <= 0.0 {
        return Err(Error::sparity(Subject::X));
    }
    Ok(value)
}

/// RelSpread: spread relative to the magnitude of the center.
///
/// # Errors
/// `sparity(x)` if the spread is zero, `domain(x)` if the center is zero.
pub fn rel_spread(x: &[f64]) -> Result<f64> {
    let s = spread(x)?;
    let c = center(x)?;
    if c == 0.0 {
        return Err(Error::domain(Subject::X));
    }
    Ok(s / c.abs())
}

/// Shift: the Hodges-Lehmann two-sample location shift.
pub fn shift(x: &[f64], y: &[f64]) -> Result<f64> {
    fast_shift(x, y)
}

/// Ratio: the median of pairwise ratios `x_i / y_j`.
///
/// # Errors
/// `positivity(x)` / `positivity(y)` unless every value is strictly positive.
pub fn ratio(x: &[f64], y: &[f64]) -> Result<f64> {
    let q = ratio_quantiles(x, y, &[0.5], &ShiftConfig::default())?;
    Ok(q[0])
}

/// AvgSpread: `(n·spread(x) + m·spread(y)) / (n + m)`.
///
/// # Errors
/// `sparity(x)` / `sparity(y)` if either spread is zero.
pub fn avg_spread(x: &[f64], y: &[f64]) -> Result<f64> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    let spread_x = fast_spread(x)?;
    if spread_x <= 0.0 {
        return Err(Error::sparity(Subject::X));
    }
    let spread_y = fast_spread(y)?;
    if spread_y <= 0.0 {
        return Err(Error::sparity(Subject::Y));
    }
    let (n, m) = (x.len() as f64, y.len() as f64);
    Ok((n * spread_x + m * spread_y) / (n + m))
}

/// Disparity: shift in units of the average spread (an effect size).
pub fn disparity(x: &[f64], y: &[f64]) -> Result<f64> {
    let scale = avg_spread(x, y)?;
    Ok(fast_shift(x, y)? / scale)
}

// ============================================================================
// Bounds
// ============================================================================

/// Bounds on [`shift`] that miss the true shift with probability at most
/// `misrate`.
///
/// # Errors
/// - `validity(x)` / `validity(y)` for invalid samples.
/// - `domain(misrate)` if `misrate` is outside `(0, 1)` or below
///   [`min_misrate::two_sample`].
pub fn shift_bounds(x: &[f64], y: &[f64], misrate: f64) -> Result<Bounds> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    check_misrate(misrate)?;

    let (n, m) = (x.len(), y.len());
    if misrate < min_misrate::two_sample(n, m)? {
        return Err(Error::domain(Subject::Misrate));
    }

    let margin = pairwise_margin(n, m, misrate)?;
    let total = n * m;
    let half = (margin / 2).min((total - 1) / 2);
    let denominator = total.saturating_sub(1).max(1) as f64;
    let p = [
        half as f64 / denominator,
        (total - 1 - half) as f64 / denominator,
    ];
    debug!(n, m, margin, half, "shift bounds");

    let config = ShiftConfig::new().assume_sorted(true);
    let q = shift_quantiles_with(&sorted(x), &sorted(y), &p, &config)?;
    Ok(Bounds::new(q[0].min(q[1]), q[0].max(q[1])))
}

/// Bounds on [`ratio`], computed as [`shift_bounds`] on logarithms.
///
/// # Errors
/// As [`shift_bounds`], plus `positivity(x)` / `positivity(y)`.
pub fn ratio_bounds(x: &[f64], y: &[f64], misrate: f64) -> Result<Bounds> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    check_misrate(misrate)?;
    if misrate < min_misrate::two_sample(x.len(), y.len())? {
        return Err(Error::domain(Subject::Misrate));
    }
    check_positivity(x, Subject::X)?;
    check_positivity(y, Subject::Y)?;

    let log_x: Vec<f64> = x.iter().map(|v| v.ln()).collect();
    let log_y: Vec<f64> = y.iter().map(|v| v.ln()).collect();
    let log_bounds = shift_bounds(&log_x, &log_y, misrate)?;
    Ok(Bounds::new(log_bounds.lower.exp(), log_bounds.upper.exp()))
}

/// Bounds on [`center`] from the signed-rank distribution.
///
/// Exact for any sample symmetric about its center: the endpoints are the
/// pairwise averages of ranks `half + 1` and `N - half`, where
/// `N = n(n+1)/2` and `half` is half the signed-rank margin.
///
/// # Errors
/// - `validity(x)` for an invalid sample.
/// - `domain(misrate)` if `misrate` is outside `(0, 1)` or below
///   [`min_misrate::one_sample`].
/// - `domain(x)` if `x` has fewer than two observations.
pub fn center_bounds(x: &[f64], misrate: f64) -> Result<Bounds> {
    check_validity(x, Subject::X)?;
    check_misrate(misrate)?;

    let n = x.len();
    if n < 2 {
        return Err(Error::domain(Subject::X));
    }
    if misrate < min_misrate::one_sample(n)? {
        return Err(Error::domain(Subject::Misrate));
    }

    let margin = signed_rank_margin(n, misrate)?;
    let total = (n * (n + 1) / 2) as u64;
    let half = (margin as u64 / 2).min((total - 1) / 2);
    debug!(n, margin, half, "center bounds");

    let sorted = sorted(x);
    let lower = pairwise_average_rank(&sorted, half + 1)?;
    let upper = pairwise_average_rank(&sorted, total - half)?;
    Ok(Bounds::new(lower, upper))
}

/// Bounds on [`spread`] from disjoint pairs.
///
/// The sample is split at random into `n / 2` disjoint pairs. Their
/// absolute differences are independent, and half of them fall below the
/// true spread, so the sign-test margin selects two of their order
/// statistics as the endpoints.
///
/// The generator is seeded from `x`, so repeated calls agree.
///
/// # Errors
/// - `validity(x)` for an invalid sample.
/// - `domain(misrate)` if `misrate` is outside `(0, 1)` or below
///   [`min_misrate::one_sample`] of the pair count.
/// - `domain(x)` if `x` has fewer than two observations.
/// - `sparity(x)` if the spread of `x` is zero.
pub fn spread_bounds(x: &[f64], misrate: f64) -> Result<Bounds> {
    let mut rng = create_rng(seed_from_values(x));
    spread_bounds_with_rng(x, misrate, &mut rng)
}

/// [`spread_bounds`] with caller-supplied randomness.
pub fn spread_bounds_with_rng<R: Rng>(x: &[f64], misrate: f64, rng: &mut R) -> Result<Bounds> {
    check_validity(x, Subject::X)?;
    check_misrate(misrate)?;

    let pairs = x.len() / 2;
    if misrate < min_misrate::one_sample(pairs)? {
        return Err(Error::domain(Subject::Misrate));
    }
    if fast_spread(x)? <= 0.0 {
        return Err(Error::sparity(Subject::X));
    }

    let margin = sign_margin(pairs, misrate, rng)?;
    let half = (margin / 2).min((pairs - 1) / 2);
    debug!(n = x.len(), pairs, margin, half, "spread bounds");

    let mut order: Vec<usize> = (0..x.len()).collect();
    shuffle(&mut order, rng);
    let mut differences: Vec<f64> = order
        .chunks_exact(2)
        .map(|pair| (x[pair[0]] - x[pair[1]]).abs())
        .collect();
    differences.sort_unstable_by(f64::total_cmp);
    Ok(Bounds::new(differences[half], differences[pairs - 1 - half]))
}

/// Size-weighted combination of both samples' [`spread_bounds`], each at
/// half the misrate. Callers validate the inputs.
fn avg_spread_bounds_with_rng<R: Rng>(x: &[f64], y: &[f64], misrate: f64, rng: &mut R) -> Result<Bounds> {
    let alpha = misrate / 2.0;
    let bounds_x = spread_bounds_with_rng(x, alpha, rng)?;
    let bounds_y = spread_bounds_with_rng(y, alpha, rng)?;

    let (n, m) = (x.len() as f64, y.len() as f64);
    let (weight_x, weight_y) = (n / (n + m), m / (n + m));
    Ok(Bounds::new(
        weight_x * bounds_x.lower + weight_y * bounds_y.lower,
        weight_x * bounds_x.upper + weight_y * bounds_y.upper,
    ))
}

/// Bounds on [`disparity`].
///
/// Splits the misrate between [`shift_bounds`] and the average-spread
/// bounds (Bonferroni): each first gets its own minimum achievable
/// misrate, and the remainder is shared equally. The result is the range
/// of `shift / avg_spread` over both intervals, unbounded where the
/// spread interval reaches zero.
///
/// The generator is seeded from `x` and `y`, so repeated calls agree.
///
/// # Errors
/// - `validity(x)` / `validity(y)` for invalid samples.
/// - `domain(misrate)` if `misrate` is outside `(0, 1)`.
/// - `domain(x)` / `domain(y)` for a sample with fewer than two
///   observations.
/// - `domain(misrate)` if `misrate` cannot cover the minimum misrates of
///   both parts.
/// - `sparity(x)` / `sparity(y)` if either spread is zero.
pub fn disparity_bounds(x: &[f64], y: &[f64], misrate: f64) -> Result<Bounds> {
    let mut rng = create_rng(seed_from_values(&[x, y].concat()));
    disparity_bounds_with_rng(x, y, misrate, &mut rng)
}

/// [`disparity_bounds`] with caller-supplied randomness.
pub fn disparity_bounds_with_rng<R: Rng>(
    x: &[f64],
    y: &[f64],
    misrate: f64,
    rng: &mut R,
) -> Result<Bounds> {
    check_validity(x, Subject::X)?;
    check_validity(y, Subject::Y)?;
    check_misrate(misrate)?;

    let (n, m) = (x.len(), y.len());
    if n < 2 {
        return Err(Error::domain(Subject::X));
    }
    if m < 2 {
        return Err(Error::domain(Subject::Y));
    }

    let min_shift = min_misrate::two_sample(n, m)?;
    let min_avg = 2.0 * min_misrate::one_sample(n / 2)?.max(min_misrate::one_sample(m / 2)?);
    if misrate < min_shift + min_avg {
        return Err(Error::domain(Subject::Misrate));
    }
    let extra = misrate - (min_shift + min_avg);
    let alpha_shift = min_shift + extra / 2.0;
    let alpha_avg = min_avg + extra / 2.0;

    if fast_spread(x)? <= 0.0 {
        return Err(Error::sparity(Subject::X));
    }
    if fast_spread(y)? <= 0.0 {
        return Err(Error::sparity(Subject::Y));
    }
    debug!(n, m, alpha_shift, alpha_avg, "disparity bounds");

    let shift = shift_bounds(x, y, alpha_shift)?;
    let scale = avg_spread_bounds_with_rng(x, y, alpha_avg, rng)?;
    Ok(quotient_range(shift, scale))
}

/// Range of `s / a` for `s` in `shift` and `a` in `scale`, where `scale`
/// is non-negative and may touch zero.
fn quotient_range(shift: Bounds, scale: Bounds) -> Bounds {
    let (ls, us) = (shift.lower, shift.upper);
    let (la, ua) = (scale.lower, scale.upper);

    if la > 0.0 {
        let corners = [ls / la, ls / ua, us / la, us / ua];
        let lower = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let upper = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return Bounds::new(lower, upper);
    }

    let inf = f64::INFINITY;
    if ls == 0.0 && us == 0.0 {
        return Bounds::new(0.0, 0.0);
    }
    if ua <= 0.0 {
        // scale is exactly zero: only the sign of the shift survives
        return if ls >= 0.0 {
            Bounds::new(0.0, inf)
        } else if us <= 0.0 {
            Bounds::new(-inf, 0.0)
        } else {
            Bounds::new(-inf, inf)
        };
    }

    if ls > 0.0 {
        Bounds::new(ls / ua, inf)
    } else if us < 0.0 {
        Bounds::new(-inf, us / ua)
    } else if ls == 0.0 {
        Bounds::new(0.0, inf)
    } else if us == 0.0 {
        Bounds::new(-inf, 0.0)
    } else {
        Bounds::new(-inf, inf)
    }
}
