//! Smallest misrate a rank-based bound can achieve.
//!
//! With zero margin the bound spans every order statistic, and it still
//! misses with the probability that the statistic lands on one of its two
//! extreme values. Requests below that floor cannot be honored.

use crate::error::{Error, Result, Subject};
use crate::special::binomial;

/// Minimum misrate of a one-sample signed-rank bound: `2^(1-n)`.
///
/// # Errors
/// `domain(x)` if `n == 0`.
///
/// # Examples
/// ```
/// use u_robust::margin::min_misrate::one_sample;
/// assert_eq!(one_sample(3).unwrap(), 0.25);
/// ```
pub fn one_sample(n: usize) -> Result<f64> {
    if n == 0 {
        return Err(Error::domain(Subject::X));
    }
    Ok(2.0_f64.powf(1.0 - n as f64))
}

/// Minimum misrate of a two-sample pairwise bound: `2 / C(n+m, n)`.
///
/// # Errors
/// `domain(x)` if `n == 0`, `domain(y)` if `m == 0`.
///
/// # Examples
/// ```
/// use u_robust::margin::min_misrate::two_sample;
/// assert_eq!(two_sample(2, 2).unwrap(), 2.0 / 6.0);
/// ```
pub fn two_sample(n: usize, m: usize) -> Result<f64> {
    if n == 0 {
        return Err(Error::domain(Subject::X));
    }
    if m == 0 {
        return Err(Error::domain(Subject::Y));
    }
    Ok(2.0 / binomial(n + m, n))
}
