//! Tunable constants and option structs.
//!
//! Every function that takes a config also has a plain variant that uses
//! [`Default`], so most callers never touch this module.

/// Largest `n` for which the signed-rank distribution can be tabulated
/// exactly: the `2^n` sign patterns must fit a 64-bit count.
pub const SIGNED_RANK_MAX_EXACT: usize = 63;

/// Options for the pairwise-difference quantile search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftConfig {
    /// Skip sorting because the caller guarantees both samples are
    /// sorted in non-decreasing order. Default: `false`.
    pub assume_sorted: bool,

    /// Hard cap on binary-search iterations per rank. Each iteration
    /// halves the ordinal range of `f64`, so any input resolves within 65
    /// and the default of 128 is never reached.
    pub max_iterations: usize,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            assume_sorted: false,
            max_iterations: 128,
        }
    }
}

impl ShiftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assume_sorted(mut self, assume_sorted: bool) -> Self {
        self.assume_sorted = assume_sorted;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Crossover points between the exact and the Edgeworth margin paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarginConfig {
    /// PairwiseMargin is exact while `n + m` does not exceed this. Default: 400.
    pub pairwise_exact_limit: usize,

    /// SignedRankMargin is exact while `n` does not exceed this.
    /// Default and ceiling: [`SIGNED_RANK_MAX_EXACT`].
    pub signed_rank_exact_limit: usize,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            pairwise_exact_limit: 400,
            signed_rank_exact_limit: SIGNED_RANK_MAX_EXACT,
        }
    }
}

impl MarginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairwise_exact_limit(mut self, limit: usize) -> Self {
        self.pairwise_exact_limit = limit;
        self
    }

    /// Values above [`SIGNED_RANK_MAX_EXACT`] are clamped.
    pub fn signed_rank_exact_limit(mut self, limit: usize) -> Self {
        self.signed_rank_exact_limit = limit.min(SIGNED_RANK_MAX_EXACT);
        self
    }
}
