//! Dense primal log-barrier interior-point solver for linear programs.
//!
//! Problems are stated in the general bounded form
//!
//! ```text
//! minimize/maximize  c^T x
//! subject to         q <= A x <= p
//!                    l <=  x  <= u
//! ```
//!
//! with any bound allowed to be infinite. Coincident finite bounds are
//! equality constraints; they are eliminated through a nullspace
//! parametrization before iterating. The remaining bounds become
//! half-spaces and the optimum is traced along the central path with a
//! damped Newton iteration.
//!
//! # Example
//!
//! ```ignore
//! use lp_barrier::{LinearProgram, SolverSettings};
//!
//! // minimize x subject to 0 <= x <= 10
//! let mut lp = LinearProgram::new(0, 1);
//! lp.c[0] = 1.0;
//! lp.l[0] = 0.0;
//! lp.u[0] = 10.0;
//!
//! let result = lp_barrier::solve(&lp, &SolverSettings::default())?;
//! assert!(result.status.has_solution());
//! assert!(result.x[0].abs() < 1e-3);
//! ```
//!
//! For repeated solves of related problems (objective sweeps, warm
//! starts, objective thresholds) drive an [`InteriorPoint`] directly.

#![warn(clippy::all)]

pub mod barrier;
pub mod error;
pub mod linalg;
pub mod problem;
pub mod reduce;
pub mod solver;

pub use error::{SetupError, SetupResult};
pub use problem::{
    BoundKind, LinearProgram, SolveInfo, SolveResult, SolveStatus, SolverSettings,
};
pub use solver::InteriorPoint;

pub use barrier::BarrierSolver;

use nalgebra::DVector;

/// Solve a linear program in one call.
///
/// Builds a fresh [`InteriorPoint`] with the given settings, installs
/// `lp`, and solves. The solution vector and objective in the result are
/// meaningful only when `status.has_solution()`.
pub fn solve(lp: &LinearProgram, settings: &SolverSettings) -> SetupResult<SolveResult> {
    let mut ip = InteriorPoint::new();
    ip.settings = settings.clone();
    ip.set(lp)?;

    let status = ip.solve();
    let (x, objective) = if status.has_solution() {
        (ip.optimum(), ip.objective_value())
    } else {
        (DVector::zeros(0), f64::NAN)
    };

    Ok(SolveResult {
        status,
        x,
        objective,
        info: ip.info().clone(),
    })
}
