//! Margin functions for rank-based confidence bounds.
//!
//! A margin is the number of extreme order statistics to drop, summed
//! over both tails, so that the interval spanned by the remaining ones
//! covers the true parameter with probability at least `1 - misrate`.
//!
//! - [`pairwise`]: two-sample margin from the Mann-Whitney `U`
//!   distribution, for bounds on Shift and Ratio.
//! - [`signed_rank`]: one-sample margin from the Wilcoxon signed-rank
//!   distribution, for bounds on Center.
//! - [`sign`]: randomized one-sample margin from the sign-test
//!   distribution, for bounds on Spread over disjoint pairs.
//! - [`min_misrate`]: the smallest misrate each family can honor.
//!
//! The pairwise and signed-rank margins use an exact null distribution
//! for small samples and an Edgeworth expansion beyond a crossover size
//! (see [`crate::config::MarginConfig`]).

pub mod min_misrate;
pub mod pairwise;
pub mod sign;
pub mod signed_rank;

pub use pairwise::{pairwise_margin, pairwise_margin_with};
pub use sign::sign_margin;
pub use signed_rank::{signed_rank_margin, signed_rank_margin_with};

/// Inverts a monotone CDF on `0..=max` by bisection: returns the largest
/// `a` with `cdf(a) < p`, or `0` if every value reaches `p`.
///
/// Shared by the Edgeworth paths, whose CDFs are non-decreasing in the
/// statistic.
pub(crate) fn invert_cdf<F: Fn(usize) -> f64>(max: usize, p: f64, cdf: F) -> usize {
    let (mut a, mut b) = (0, max);
    while a + 1 < b {
        let c = a + (b - a) / 2;
        if cdf(c) < p {
            a = c;
        } else {
            b = c;
        }
    }
    if cdf(b) < p {
        b
    } else {
        a
    }
}
