//! FastSpread: the Shamos scale estimator.
//!
//! Spread is the median of all `n(n-1)/2` pairwise absolute differences
//! `|x_i - x_j|` with `i < j`. Over a sorted sample these are
//! `a_j - a_i`, which grow along each row and shrink down each column,
//! so the same selection kernel as Center applies with a different sweep.
//!
//! Reference: Shamos (1976), "Geometry and statistics: Problems at the
//! interface", in *Algorithms and Complexity*, pp. 251–280.
//!
//! # Complexity
//! Time: expected O(n log n), Space: O(n)

use rand::Rng;

use crate::error::{check_validity, Result, Subject};
use crate::random::{create_rng, seed_from_values};
use crate::selection::{select, PairwiseMatrix, Partition, RankTarget};
use crate::stats::sorted;

/// Pairwise differences `a_j - a_i`, `i < j`, of a sorted sample.
struct PairwiseDifferences<'a> {
    sorted: &'a [f64],
}

impl PairwiseMatrix for PairwiseDifferences<'_> {
    fn size(&self) -> usize {
        self.sorted.len()
    }

    fn first_column(&self, row: usize) -> usize {
        row + 1
    }

    fn value(&self, row: usize, column: usize) -> f64 {
        self.sorted[column] - self.sorted[row]
    }

    fn initial_pivot(&self) -> f64 {
        let n = self.sorted.len();
        self.sorted[n / 2] - self.sorted[(n - 1) / 2]
    }

    fn partition(&self, pivot: f64, splits: &mut [usize]) -> Partition {
        let n = self.size();
        let mut part = Partition::new();
        // A difference below pivot in row i stays below it in row i+1.
        let mut column = 1;
        for row in 0..n {
            column = column.max(row + 1);
            while column < n && self.value(row, column) < pivot {
                column += 1;
            }
            splits[row] = column;
            let first = row + 1;
            part.record_row(
                column - first,
                (column > first).then(|| self.value(row, column - 1)),
                (column < n).then(|| self.value(row, column)),
            );
        }
        part
    }
}

/// Computes Spread, the median of pairwise absolute differences.
///
/// Returns `0.0` for a single observation and whenever more than half of
/// the pairs are ties.
///
/// # Errors
/// `validity(x)` if `values` is empty or holds a non-finite value.
///
/// # Examples
/// ```
/// use u_robust::spread::fast_spread;
/// assert_eq!(fast_spread(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(), 2.0);
/// ```
pub fn fast_spread(values: &[f64]) -> Result<f64> {
    let mut rng = create_rng(seed_from_values(values));
    fast_spread_with_rng(values, &mut rng)
}

/// [`fast_spread`] with caller-supplied randomness. The result does not
/// depend on `rng`.
pub fn fast_spread_with_rng<R: Rng>(values: &[f64], rng: &mut R) -> Result<f64> {
    check_validity(values, Subject::X)?;
    match values {
        [_] => return Ok(0.0),
        [a, b] => return Ok((a - b).abs()),
        _ => {}
    }

    let sorted = sorted(values);
    let matrix = PairwiseDifferences { sorted: &sorted };
    select(&matrix, RankTarget::median(matrix.total()), rng)
}
