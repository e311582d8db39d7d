//! SignMargin: one-sample margin from the sign-test distribution.
//!
//! Under the null, the number of disjoint-pair differences falling below
//! the true spread is Binomial(m, 1/2). Its CDF jumps in steps of
//! `C(m, r) / 2^m`, so no fixed cutoff hits `misrate / 2` exactly. The
//! margin therefore randomizes between the two neighbouring cutoffs,
//! taking the upper one with the probability that makes the expected
//! tail mass equal to the request.
//!
//! The binomial tail is accumulated in log space, so `m` is unbounded.

use rand::Rng;

use super::min_misrate;
use crate::error::{check_misrate, Error, Result, Subject};

/// Randomized number of extreme disjoint-pair differences to exclude,
/// over both tails.
///
/// The result is `2r` or `2(r + 1)`, where `r` is the largest cutoff
/// whose Binomial(m, 1/2) lower tail stays within `misrate / 2`.
///
/// # Errors
/// - `domain(x)` if `m == 0`.
/// - `domain(misrate)` if `misrate` is NaN, outside `(0, 1)`, or below
///   [`min_misrate::one_sample`].
///
/// # Examples
/// ```
/// use u_robust::margin::sign_margin;
/// use u_robust::random::create_rng;
/// let mut rng = create_rng(1);
/// let margin = sign_margin(20, 0.05, &mut rng).unwrap();
/// assert!(margin == 10 || margin == 12);
/// ```
pub fn sign_margin<R: Rng>(m: usize, misrate: f64, rng: &mut R) -> Result<usize> {
    let floor = min_misrate::one_sample(m)?;
    check_misrate(misrate)?;
    if misrate < floor {
        return Err(Error::domain(Subject::Misrate));
    }

    let target = misrate / 2.0;
    let split = TailSplit::find(m, target);
    let cutoff = if rng.random::<f64>() < split.upper_probability(target) {
        split.cutoff + 1
    } else {
        split.cutoff
    };
    Ok(cutoff * 2)
}

/// The Binomial(m, 1/2) CDF around `target`, in natural logarithms.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TailSplit {
    /// Largest `r` with `CDF(r) <= target` (0 if even `CDF(0)` exceeds it).
    cutoff: usize,
    /// `ln CDF(cutoff)`.
    log_cdf: f64,
    /// `ln PMF(cutoff + 1)`, `-inf` past the support.
    log_next_pmf: f64,
}

impl TailSplit {
    fn find(m: usize, target: f64) -> Self {
        let log_target = target.ln();
        let mut log_pmf = -(m as f64) * std::f64::consts::LN_2;
        let mut split = Self {
            cutoff: 0,
            log_cdf: log_pmf,
            log_next_pmf: log_pmf,
        };
        if split.log_cdf > log_target {
            return split;
        }

        for r in 1..=m {
            // PMF(r) = PMF(r - 1) · (m - r + 1) / r
            let log_pmf_next = log_pmf + ((m - r + 1) as f64).ln() - (r as f64).ln();
            let log_cdf_next = log_add_exp(split.log_cdf, log_pmf_next);
            split.log_next_pmf = log_pmf_next;
            if log_cdf_next > log_target {
                return split;
            }
            split.cutoff = r;
            split.log_cdf = log_cdf_next;
            log_pmf = log_pmf_next;
        }
        split.log_next_pmf = f64::NEG_INFINITY;
        split
    }

    /// Probability of stepping past `cutoff` so that the expected lower
    /// tail mass equals `target`.
    fn upper_probability(&self, target: f64) -> f64 {
        let log_target = target.ln();
        if log_target <= self.log_cdf || !self.log_next_pmf.is_finite() {
            return 0.0;
        }
        let log_gap = log_sub_exp(log_target, self.log_cdf);
        if !log_gap.is_finite() {
            return 0.0;
        }
        (log_gap - self.log_next_pmf).exp().clamp(0.0, 1.0)
    }
}

/// `ln(e^a + e^b)`.
fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let top = a.max(b);
    top + ((a - top).exp() + (b - top).exp()).ln()
}

/// `ln(e^a - e^b)` for `a >= b`.
fn log_sub_exp(a: f64, b: f64) -> f64 {
    if b == f64::NEG_INFINITY {
        return a;
    }
    let ratio = (b - a).exp();
    if ratio >= 1.0 {
        f64::NEG_INFINITY
    } else {
        a + (-ratio).ln_1p()
    }
}
