//! SignedRankMargin: one-sample margin from the Wilcoxon signed-rank
//! distribution.
//!
//! Under the null of a distribution symmetric about the true center, the
//! signed-rank statistic `W` is a sum over a uniformly random subset of
//! `{1, ..., n}`. The margin is twice the smallest `w` whose lower-tail
//! probability reaches `misrate / 2`.
//!
//! # Algorithms
//!
//! - **Exact** (`n <= 63`): subset-sum counts over all `2^n` sign
//!   patterns, which fit a `u64` up to `n = 63`.
//! - **Edgeworth** (larger `n`): normal approximation with the
//!   4th-cumulant correction, inverted by bisection.
//!
//! # Complexity
//! Exact: O(n³) time, O(n²) space. Edgeworth: O(log n).

use tracing::debug;

use super::{invert_cdf, min_misrate};
use crate::config::{MarginConfig, SIGNED_RANK_MAX_EXACT};
use crate::error::{check_misrate, Error, Result, Subject};
use crate::special::{hermite, standard_normal_cdf, standard_normal_pdf};

/// Number of extreme pairwise averages to exclude, over both tails.
///
/// # Errors
/// - `domain(x)` if `n == 0`.
/// - `domain(misrate)` if `misrate` is NaN, outside `(0, 1)`, or below
///   [`min_misrate::one_sample`].
///
/// # Examples
/// ```
/// use u_robust::margin::signed_rank_margin;
/// assert_eq!(signed_rank_margin(10, 0.05).unwrap(), 18);
/// ```
pub fn signed_rank_margin(n: usize, misrate: f64) -> Result<usize> {
    signed_rank_margin_with(n, misrate, &MarginConfig::default())
}

/// [`signed_rank_margin`] with an explicit exact/approximate crossover.
pub fn signed_rank_margin_with(n: usize, misrate: f64, config: &MarginConfig) -> Result<usize> {
    let floor = min_misrate::one_sample(n)?;
    check_misrate(misrate)?;
    if misrate < floor {
        return Err(Error::domain(Subject::Misrate));
    }

    let p = misrate / 2.0;
    let max_w = n * (n + 1) / 2;
    let raw = if n <= config.signed_rank_exact_limit.min(SIGNED_RANK_MAX_EXACT) {
        debug!(n, misrate, "signed-rank margin: exact");
        exact_lower_tail(n, p)
    } else {
        debug!(n, misrate, "signed-rank margin: edgeworth");
        invert_cdf(max_w, p, |w| edgeworth_cdf(n, w))
    };
    Ok(raw * 2)
}

/// Smallest `w` with `P(W <= w) >= p`.
fn exact_lower_tail(n: usize, p: f64) -> usize {
    let total = (1_u64 << n) as f64;
    let max_w = n * (n + 1) / 2;

    // counts[w]: number of subsets of {1..=i} summing to w
    let mut counts = vec![0_u64; max_w + 1];
    counts[0] = 1;
    for i in 1..=n {
        let reachable = i * (i + 1) / 2;
        for w in (i..=reachable).rev() {
            counts[w] += counts[w - i];
        }
    }

    let mut cumulative = 0_u64;
    for (w, &c) in counts.iter().enumerate() {
        cumulative += c;
        if cumulative as f64 / total >= p {
            return w;
        }
    }
    max_w
}

/// Edgeworth approximation of `P(W <= w)` with continuity correction.
fn edgeworth_cdf(n: usize, w: usize) -> f64 {
    let nf = n as f64;
    let mu = nf * (nf + 1.0) / 4.0;
    let sigma2 = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0;
    let kappa4 = -nf * (nf + 1.0) * (2.0 * nf + 1.0) * (3.0 * nf * nf + 3.0 * nf - 1.0) / 240.0;

    let z = (w as f64 - mu + 0.5) / sigma2.sqrt();
    let e3 = kappa4 / (24.0 * sigma2 * sigma2);
    (standard_normal_cdf(z) - standard_normal_pdf(z) * e3 * hermite(3, z)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_exact_values() {
        assert_eq!(signed_rank_margin(5, 0.1).unwrap(), 2);
        assert_eq!(signed_rank_margin(10, 0.01).unwrap(), 8);
        assert_eq!(signed_rank_margin(10, 0.05).unwrap(), 18);
        assert_eq!(signed_rank_margin(20, 0.05).unwrap(), 106);
        assert_eq!(signed_rank_margin(30, 1e-4).unwrap(), 112);
        assert_eq!(signed_rank_margin(63, 1e-3).unwrap(), 1072);
    }

    #[test]
    fn test_known_edgeworth_values() {
        assert_eq!(signed_rank_margin(64, 1e-3).unwrap(), 1112);
        assert_eq!(signed_rank_margin(100, 1e-3).unwrap(), 3156);
        assert_eq!(signed_rank_margin(1000, 1e-4).unwrap(), 429542);
    }

    #[test]
    fn test_edgeworth_near_crossover() {
        let exact = signed_rank_margin(63, 1e-3).unwrap();
        let approx = signed_rank_margin_with(63, 1e-3, &MarginConfig::new().signed_rank_exact_limit(0)).unwrap();
        assert_eq!(exact, 1072);
        assert_eq!(approx, 1070);
    }

    #[test]
    fn test_exactly_at_min_misrate() {
        assert_eq!(signed_rank_margin(2, 0.5).unwrap(), 0);
        assert_eq!(signed_rank_margin(3, 0.25).unwrap(), 0);
        let floor = min_misrate::one_sample(40).unwrap();
        assert_eq!(signed_rank_margin(40, floor).unwrap(), 0);
    }

    #[test]
    fn test_below_min_misrate() {
        assert_eq!(
            signed_rank_margin(3, 0.2),
            Err(Error::domain(Subject::Misrate))
        );
        assert_eq!(
            signed_rank_margin(1, 0.9),
            Err(Error::domain(Subject::Misrate))
        );
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(signed_rank_margin(0, 0.1), Err(Error::domain(Subject::X)));
        for bad in [0.0, 1.0, f64::NAN, -1.0] {
            assert_eq!(
                signed_rank_margin(10, bad),
                Err(Error::domain(Subject::Misrate))
            );
        }
    }

    #[test]
    fn test_exact_handles_largest_n() {
        // 2^63 sign patterns, the largest count that fits u64
        let margin = signed_rank_margin(63, 0.5).unwrap();
        assert!(margin <= 63 * 64 / 2);
    }

    #[test]
    fn test_exact_distribution_small_n() {
        // n = 3: W takes 0, 1, 2, 3, 3, 4, 5, 6 with equal weight
        assert_eq!(exact_lower_tail(3, 1.0 / 8.0), 0);
        assert_eq!(exact_lower_tail(3, 2.0 / 8.0), 1);
        assert_eq!(exact_lower_tail(3, 5.0 / 8.0), 3);
        assert_eq!(exact_lower_tail(3, 1.0), 6);
    }
}
