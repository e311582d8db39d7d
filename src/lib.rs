//! # u-robust
//!
//! Robust nonparametric estimators built on pairwise statistics.
//!
//! Center, Spread and Shift are medians over all pairs of observations:
//! a quadratic amount of data that this crate never materializes. Sorted
//! samples turn each pairwise collection into an implicit monotone matrix,
//! and the algorithms here select exact order statistics from it in
//! near-linear time. The margin functions turn a requested misrate into
//! the number of extreme pairs to drop when building confidence bounds.
//!
//! ## Modules
//!
//! - [`center`]: FastCenter, the median of pairwise averages
//! - [`spread`]: FastSpread, the median of pairwise absolute differences
//! - [`shift`]: FastShift, quantiles of two-sample pairwise differences
//! - [`margin`]: PairwiseMargin, SignedRankMargin, SignMargin, minimum misrates
//! - [`estimators`]: user-facing estimators and their bounds
//! - [`special`], [`stats`], [`random`]: numerical building blocks
//! - [`error`], [`config`]: error types and tunable options
//!
//! ## Design Philosophy
//!
//! - **Exact, not approximate**: every estimate is the true order
//!   statistic of the pairwise collection, tested against naive oracles
//! - **Deterministic**: randomized pivots are seeded from the input, so
//!   identical inputs take identical paths
//! - **Property-based testing**: invariance laws verified via proptest
//!
//! ## Example
//!
//! ```
//! use u_robust::estimators::{center, center_bounds, spread};
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! assert_eq!(center(&x).unwrap(), 3.0);
//! assert_eq!(spread(&x).unwrap(), 2.0);
//!
//! let b = center_bounds(&x, 0.1).unwrap();
//! assert!(b.contains(3.0));
//! ```

pub mod center;
pub mod config;
pub mod error;
pub mod estimators;
pub mod margin;
pub mod random;
pub mod shift;
pub mod special;
pub mod spread;
pub mod stats;

mod selection;

pub use config::{MarginConfig, ShiftConfig};
pub use error::{AssumptionId, Error, Result, Subject, Violation};
pub use estimators::Bounds;
