//! Errors raised by the solver core.
//!
//! A satisfiability verdict is never an error: UNSAT is reported as
//! `Ok(None)`. Errors are either configuration mistakes caught before the
//! search starts or broken internal invariants that abort the current solve.

use crate::sat::literal::Variable;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The heuristic selector is not one of `0`, `1`, `2` or their names.
    #[error("unrecognised heuristic `{0}` (expected 0/first, 1/jw or 2/vsids)")]
    UnknownHeuristic(String),

    /// The VSIDS decay factor must lie in `(0, 1)`.
    #[error("invalid decay factor {0}, expected a value in (0, 1)")]
    InvalidDecay(f64),

    /// A branch was requested although no variable is left to split on.
    #[error("no unassigned variable left to branch on")]
    NoBranchVariable,

    /// A variable was assigned a value opposite to the one it already holds.
    #[error("variable {var} is already assigned {current}")]
    ConflictingAssignment { var: Variable, current: bool },

    /// A literal names a variable the formula was not built with.
    #[error("variable {0} does not belong to this formula")]
    UnknownVariable(Variable),
}

impl SolveError {
    /// `true` for errors that indicate a bug in the search rather than bad
    /// configuration.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NoBranchVariable | Self::ConflictingAssignment { .. } | Self::UnknownVariable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SolveError>;
