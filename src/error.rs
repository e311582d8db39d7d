//! Error types shared by every estimator.
//!
//! Precondition failures are reported as a [`Violation`]: an
//! [`AssumptionId`] naming *which* assumption failed and a [`Subject`]
//! naming *which* argument triggered it. Both render to the short string
//! identifiers used by the cross-language reference fixtures
//! (`"validity"`, `"domain"`, `"x"`, `"misrate"`, ...).
//!
//! # Priority
//!
//! When several assumptions are violated at once, the one declared first
//! in [`AssumptionId`] is reported. For two-sample functions `x` is
//! checked before `y`.

use std::fmt;

/// Assumption identifiers in canonical priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssumptionId {
    /// Sample must be non-empty and contain only finite values.
    Validity,
    /// Parameter lies outside its valid domain.
    Domain,
    /// All values must be strictly positive.
    Positivity,
    /// Sample must not be tie-dominant (Spread > 0).
    Sparity,
}

impl AssumptionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssumptionId::Validity => "validity",
            AssumptionId::Domain => "domain",
            AssumptionId::Positivity => "positivity",
            AssumptionId::Sparity => "sparity",
        }
    }
}

impl fmt::Display for AssumptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The argument that triggered a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    /// The first (or only) sample.
    X,
    /// The second sample.
    Y,
    /// The misrate parameter of a bounds or margin function.
    Misrate,
    /// A requested quantile probability.
    P,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::X => "x",
            Subject::Y => "y",
            Subject::Misrate => "misrate",
            Subject::P => "p",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specific assumption violation: `id(subject)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Violation {
    pub id: AssumptionId,
    pub subject: Subject,
}

impl Violation {
    pub fn new(id: AssumptionId, subject: Subject) -> Self {
        Self { id, subject }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.subject)
    }
}

/// Errors returned by the estimators in this crate.
///
/// [`Error::Assumption`] is the only variant reachable with well-formed
/// input. The remaining variants signal a broken internal invariant and
/// exist so that such a failure surfaces instead of a wrong number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("assumption violated: {0}")]
    Assumption(Violation),

    #[error("pairwise difference search did not converge for rank {rank} within {iterations} iterations")]
    Convergence { rank: u64, iterations: usize },

    #[error("selection window emptied before resolving rank {rank}")]
    SelectionStalled { rank: u64 },
}

impl Error {
    pub fn validity(subject: Subject) -> Self {
        Error::Assumption(Violation::new(AssumptionId::Validity, subject))
    }

    pub fn domain(subject: Subject) -> Self {
        Error::Assumption(Violation::new(AssumptionId::Domain, subject))
    }

    pub fn positivity(subject: Subject) -> Self {
        Error::Assumption(Violation::new(AssumptionId::Positivity, subject))
    }

    pub fn sparity(subject: Subject) -> Self {
        Error::Assumption(Violation::new(AssumptionId::Sparity, subject))
    }

    /// Returns the violation for assumption errors, `None` for internal ones.
    pub fn violation(&self) -> Option<Violation> {
        match self {
            Error::Assumption(v) => Some(*v),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Checks that a sample is non-empty and finite.
pub fn check_validity(values: &[f64], subject: Subject) -> Result<()> {
    if values.is_empty() || !values.iter().all(|v| v.is_finite()) {
        return Err(Error::validity(subject));
    }
    Ok(())
}

/// Checks that every value is strictly positive.
pub fn check_positivity(values: &[f64], subject: Subject) -> Result<()> {
    if values.iter().any(|&v| v <= 0.0) {
        return Err(Error::positivity(subject));
    }
    Ok(())
}

/// Checks that `misrate` is a probability in `(0, 1)`.
pub fn check_misrate(misrate: f64) -> Result<()> {
    if misrate.is_nan() || misrate <= 0.0 || misrate >= 1.0 {
        return Err(Error::domain(Subject::Misrate));
    }
    Ok(())
}
