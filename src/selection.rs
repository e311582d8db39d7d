//! Exact order-statistic selection over a monotone implicit matrix.
//!
//! FastCenter and FastSpread both select a rank from a quadratic
//! collection of pairwise values that is never materialized. Over a
//! sorted sample those values form an upper-triangular matrix whose rows
//! are non-decreasing left to right, and whose columns are monotone in
//! the row index. Each estimator describes its matrix through
//! [`PairwiseMatrix`]; this module runs the shared search.
//!
//! # Algorithm
//! Monahan's selection scheme (ACM Algorithm 616) generalized to any
//! monotone pairing rule:
//!
//! 1. **Partition**: count entries strictly below a pivot with one O(n)
//!    monotone sweep, capturing the largest entry below and the smallest
//!    entry at or above the pivot on the way.
//! 2. **Target check**: the entries below the pivot are exactly the
//!    order statistics `1..=count`, so a count adjacent to a target rank
//!    resolves it from the captured boundary values.
//! 3. **Stall**: an unchanged count means ties keep producing the same
//!    partition; fall back to the midrange of the active window.
//! 4. **Shrink**: per-row windows `[left, right)` drop every entry that
//!    cannot hold a target rank.
//! 5. **Next pivot**: a uniformly random active entry's row, weighted by
//!    window width, and that row's median column.
//!
//! Reference: Monahan (1984), "Algorithm 616: Fast Computation of the
//! Hodges-Lehmann Location Estimator", *ACM TOMS* 10(3), pp. 265–270.
//!
//! # Complexity
//! Time: expected O(n log n), Space: O(n)
//!
//! The random source only changes the iteration path. The returned value
//! is the exact order statistic for every random stream.

use rand::Rng;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::random::weighted_choose;
use crate::stats::midpoint;

/// Once this few candidates remain they are resolved directly.
const DIRECT_RESOLVE_LIMIT: u64 = 2;

/// A conceptually sorted-by-row matrix of pairwise values over one
/// sorted sample, addressed by `(row, column)` with `column >= first_column(row)`.
pub(crate) trait PairwiseMatrix {
    /// Number of rows, equal to the number of columns.
    fn size(&self) -> usize;

    /// Index of the first column that row `row` pairs with.
    fn first_column(&self, row: usize) -> usize;

    fn value(&self, row: usize, column: usize) -> f64;

    /// Pivot used for the first partition.
    fn initial_pivot(&self) -> f64;

    /// Writes, for every row, the first column whose value is `>= pivot`
    /// into `splits` and returns the totals for the whole matrix.
    fn partition(&self, pivot: f64, splits: &mut [usize]) -> Partition;

    /// Total number of entries.
    fn total(&self) -> u64 {
        (0..self.size())
            .map(|row| self.size().saturating_sub(self.first_column(row)) as u64)
            .sum()
    }
}

/// Result of one partition sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Partition {
    /// Number of entries strictly below the pivot.
    pub below: u64,
    /// Largest entry strictly below the pivot (`-inf` if none).
    pub largest_below: f64,
    /// Smallest entry at or above the pivot (`+inf` if none).
    pub smallest_at_or_above: f64,
}

impl Partition {
    pub(crate) fn new() -> Self {
        Self {
            below: 0,
            largest_below: f64::NEG_INFINITY,
            smallest_at_or_above: f64::INFINITY,
        }
    }

    /// Folds one row's contribution into the totals.
    pub(crate) fn record_row(&mut self, below: usize, last_below: Option<f64>, first_above: Option<f64>) {
        self.below += below as u64;
        if let Some(v) = last_below {
            self.largest_below = self.largest_below.max(v);
        }
        if let Some(v) = first_above {
            self.smallest_at_or_above = self.smallest_at_or_above.min(v);
        }
    }
}

/// One or two adjacent 1-based ranks whose values are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RankTarget {
    pub low: u64,
    pub high: u64,
}

impl RankTarget {
    /// Middle rank(s) of `total` entries: one rank when `total` is odd,
    /// two adjacent ranks when it is even.
    pub(crate) fn median(total: u64) -> Self {
        Self {
            low: (total + 1) / 2,
            high: (total + 2) / 2,
        }
    }

    pub(crate) fn single(rank: u64) -> Self {
        Self {
            low: rank,
            high: rank,
        }
    }

    /// Resolves the target from a partition whose count sits next to it.
    fn resolve(&self, part: &Partition) -> Option<f64> {
        if self.low == self.high {
            if part.below == self.low {
                Some(part.largest_below)
            } else if part.below + 1 == self.low {
                Some(part.smallest_at_or_above)
            } else {
                None
            }
        } else if part.below == self.low {
            Some(midpoint(part.largest_below, part.smallest_at_or_above))
        } else {
            None
        }
    }
}

/// Selects the target rank(s) of `matrix` exactly.
///
/// `target` ranks must lie in `1..=matrix.total()`.
pub(crate) fn select<M, R>(matrix: &M, target: RankTarget, rng: &mut R) -> Result<f64>
where
    M: PairwiseMatrix,
    R: Rng,
{
    let n = matrix.size();
    let stalled = || Error::SelectionStalled { rank: target.low };

    let mut left: Vec<usize> = (0..n).map(|row| matrix.first_column(row).min(n)).collect();
    let mut right = vec![n; n];
    let mut splits = vec![0_usize; n];
    let mut widths = vec![0_u64; n];

    // Entries left of every window; all of them rank below the targets.
    let mut discarded_below: u64 = 0;
    let mut previous_below: Option<u64> = None;
    let mut pivot = matrix.initial_pivot();
    let mut iteration = 0_usize;

    loop {
        iteration += 1;
        let part = matrix.partition(pivot, &mut splits);
        trace!(iteration, pivot, below = part.below, "selection partition");

        if let Some(value) = target.resolve(&part) {
            debug!(iteration, "selection resolved at pivot boundary");
            return Ok(value);
        }

        if previous_below == Some(part.below) {
            let (lo, hi) = active_range(matrix, &left, &right).ok_or_else(stalled)?;
            debug!(iteration, lo, hi, "selection stalled, switching to midrange pivot");
            if lo == hi {
                return Ok(lo);
            }
            pivot = midrange(lo, hi);
            continue;
        }
        previous_below = Some(part.below);

        if part.below < target.low {
            for (l, &s) in left.iter_mut().zip(&splits) {
                *l = (*l).max(s);
            }
            discarded_below = discarded_below.max(part.below);
        } else {
            for (r, &s) in right.iter_mut().zip(&splits) {
                *r = (*r).min(s);
            }
        }

        let mut active = 0_u64;
        for ((w, &l), &r) in widths.iter_mut().zip(&left).zip(&right) {
            *w = r.saturating_sub(l) as u64;
            active += *w;
        }

        if active == 0 {
            return Err(stalled());
        }
        if active <= DIRECT_RESOLVE_LIMIT {
            return resolve_remaining(matrix, &left, &right, target, discarded_below)
                .ok_or_else(stalled);
        }

        let row = weighted_choose(&widths, active, rng).ok_or_else(stalled)?;
        let column = left[row] + (right[row] - left[row] - 1) / 2;
        pivot = matrix.value(row, column);
    }
}

/// Smallest and largest entries still inside the windows.
fn active_range<M: PairwiseMatrix>(matrix: &M, left: &[usize], right: &[usize]) -> Option<(f64, f64)> {
    let mut range: Option<(f64, f64)> = None;
    for (row, (&l, &r)) in left.iter().zip(right).enumerate() {
        if l >= r {
            continue;
        }
        let row_min = matrix.value(row, l);
        let row_max = matrix.value(row, r - 1);
        range = Some(match range {
            Some((lo, hi)) => (lo.min(row_min), hi.max(row_max)),
            None => (row_min, row_max),
        });
    }
    range
}

/// A pivot strictly above `lo` and at most `hi`, so the next partition
/// splits the active entries.
fn midrange(lo: f64, hi: f64) -> f64 {
    let mid = midpoint(lo, hi);
    if mid > lo && mid <= hi {
        mid
    } else {
        hi
    }
}

/// Picks the targets out of the last few active entries.
fn resolve_remaining<M: PairwiseMatrix>(
    matrix: &M,
    left: &[usize],
    right: &[usize],
    target: RankTarget,
    discarded_below: u64,
) -> Option<f64> {
    let mut remaining: Vec<f64> = left
        .iter()
        .zip(right)
        .enumerate()
        .flat_map(|(row, (&l, &r))| (l..r).map(move |column| (row, column)))
        .map(|(row, column)| matrix.value(row, column))
        .collect();
    remaining.sort_unstable_by(f64::total_cmp);

    let low = target.low.checked_sub(discarded_below + 1)? as usize;
    let high = target.high.checked_sub(discarded_below + 1)? as usize;
    let lo = *remaining.get(low)?;
    let hi = *remaining.get(high)?;
    Some(if low == high { lo } else { midpoint(lo, hi) })
}
