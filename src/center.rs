//! FastCenter: the Hodges-Lehmann location estimator.
//!
//! Center is the median of all `n(n+1)/2` pairwise averages
//! `(x_i + x_j) / 2` with `i <= j`, self-pairs included. It tolerates
//! up to ~29% contaminated observations while staying nearly as
//! efficient as the mean under normality.
//!
//! The pairwise averages are never stored. Over the sorted sample they
//! form the upper triangle of a matrix that grows along both rows and
//! columns, which [`crate::selection`] searches directly.
//!
//! # Complexity
//! Time: expected O(n log n), Space: O(n)
//!
//! # Examples
//! ```
//! use u_robust::center::fast_center;
//! let c = fast_center(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(c, 3.0);
//! ```

use rand::Rng;

use crate::error::{check_validity, Error, Result, Subject};
use crate::random::{create_rng, seed_from_values};
use crate::selection::{select, PairwiseMatrix, Partition, RankTarget};
use crate::stats::{midpoint, sorted};

/// Pairwise averages `(a_i + a_j) / 2`, `i <= j`, of a sorted sample.
struct PairwiseAverages<'a> {
    sorted: &'a [f64],
}

impl PairwiseMatrix for PairwiseAverages<'_> {
    fn size(&self) -> usize {
        self.sorted.len()
    }

    fn first_column(&self, row: usize) -> usize {
        row
    }

    fn value(&self, row: usize, column: usize) -> f64 {
        midpoint(self.sorted[row], self.sorted[column])
    }

    fn initial_pivot(&self) -> f64 {
        let n = self.sorted.len();
        midpoint(self.sorted[(n - 1) / 2], self.sorted[n / 2])
    }

    fn partition(&self, pivot: f64, splits: &mut [usize]) -> Partition {
        let n = self.size();
        let mut part = Partition::new();
        // Row i+1 never pairs below pivot past where row i stopped.
        let mut column = n;
        for row in 0..n {
            while column > row && self.value(row, column - 1) >= pivot {
                column -= 1;
            }
            let split = column.max(row);
            splits[row] = split;
            part.record_row(
                split - row,
                (split > row).then(|| self.value(row, split - 1)),
                (split < n).then(|| self.value(row, split)),
            );
        }
        part
    }
}

/// Computes Center, the median of pairwise averages.
///
/// The selection pivots are drawn from a generator seeded by the input's
/// bit pattern, so repeated calls walk the same path.
///
/// # Errors
/// `validity(x)` if `values` is empty or holds a non-finite value.
pub fn fast_center(values: &[f64]) -> Result<f64> {
    let mut rng = create_rng(seed_from_values(values));
    fast_center_with_rng(values, &mut rng)
}

/// [`fast_center`] with caller-supplied randomness. The result does not
/// depend on `rng`.
pub fn fast_center_with_rng<R: Rng>(values: &[f64], rng: &mut R) -> Result<f64> {
    check_validity(values, Subject::X)?;
    match values {
        [x] => return Ok(*x),
        [a, b] => return Ok(midpoint(*a, *b)),
        _ => {}
    }

    let sorted = sorted(values);
    let matrix = PairwiseAverages { sorted: &sorted };
    select(&matrix, RankTarget::median(matrix.total()), rng)
}

/// Returns the `k`-th smallest (1-based) pairwise average of a sorted
/// sample, self-pairs included.
///
/// Used for the rank-based confidence bounds around Center.
///
/// # Errors
/// - `validity(x)` if `sorted` is empty or holds a non-finite value.
/// - `domain(p)` if `k` is not in `1..=n(n+1)/2`.
pub fn pairwise_average_rank(sorted: &[f64], k: u64) -> Result<f64> {
    check_validity(sorted, Subject::X)?;
    let matrix = PairwiseAverages { sorted };
    if k == 0 || k > matrix.total() {
        return Err(Error::domain(Subject::P));
    }
    let mut rng = create_rng(seed_from_values(sorted) ^ k);
    select(&matrix, RankTarget::single(k), &mut rng)
}


#[cfg(test)]
mod proptests {
    use super::tests::naive_center;
    use super::*;
    use proptest::prelude::*;

    fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-1e6_f64..1e6, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn matches_naive(data in finite_vec(1, 60)) {
            prop_assert_eq!(fast_center(&data).unwrap(), naive_center(&data));
        }

        #[test]
        fn matches_naive_with_ties(data in proptest::collection::vec(-5_i32..5, 1..60)) {
            let values: Vec<f64> = data.into_iter().map(f64::from).collect();
            prop_assert_eq!(fast_center(&values).unwrap(), naive_center(&values));
        }

        #[test]
        fn independent_of_rng(data in finite_vec(3, 60), seed in 0_u64..10000) {
            let mut rng = create_rng(seed);
            prop_assert_eq!(
                fast_center_with_rng(&data, &mut rng).unwrap(),
                fast_center(&data).unwrap()
            );
        }

        #[test]
        fn every_rank_matches_naive(data in proptest::collection::vec(-50_i32..50, 1..15)) {
            let s = sorted(&data.into_iter().map(f64::from).collect::<Vec<_>>());
            let mut avgs = Vec::new();
            for i in 0..s.len() {
                for j in i..s.len() {
                    avgs.push(midpoint(s[i], s[j]));
                }
            }
            avgs.sort_by(f64::total_cmp);
            for (k, &expected) in avgs.iter().enumerate() {
                prop_assert_eq!(pairwise_average_rank(&s, k as u64 + 1).unwrap(), expected);
            }
        }
    }
}
