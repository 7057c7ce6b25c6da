//! Error types for problem setup.

use thiserror::Error;

/// Errors that can occur while installing a problem into the solver.
///
/// Solve-time outcomes (infeasibility, iteration limits, numerical
/// breakdown) are reported through `SolveStatus`, never through this type.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Problem validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// SVD of the equality system did not converge
    #[error("Could not decompose the equality constraints")]
    EqualityDecomposition,

    /// The reduced problem has no inequality rows left to solve
    #[error("No inequality constraints after reduction")]
    NoInequalities,
}

/// Result type for setup operations.
pub type SetupResult<T> = Result<T, SetupError>;
