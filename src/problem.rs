//! Problem data structures and validation.
//!
//! This module defines the linear program representation and all
//! associated settings, status, and result types.

use std::fmt;

use nalgebra::{DMatrix, DVector};

/// Linear program over dense data.
///
/// The solver works with the general form:
///
/// ```text
/// minimize/maximize  c^T x
/// subject to         q <= A x <= p
///                    l <=  x  <= u
/// ```
///
/// Any of the bounds may be infinite. A row (or variable) whose lower and
/// upper bounds coincide and are finite is an equality constraint; the
/// solver eliminates those before iterating. How each row and variable is
/// treated follows from which of its bounds are finite, see [`BoundKind`].
///
/// # Dimensions
///
/// - `n`: number of variables (length of c, l, u; columns of A)
/// - `m`: number of constraint rows (length of q, p; rows of A)
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // A is standard mathematical notation
pub struct LinearProgram {
    /// Objective direction; `false` maximizes
    pub minimize: bool,

    /// Objective vector c (length n)
    pub c: DVector<f64>,

    /// Constraint matrix A (m × n, dense)
    pub A: DMatrix<f64>,

    /// Row lower bounds q (length m, -inf where absent)
    pub q: DVector<f64>,

    /// Row upper bounds p (length m, +inf where absent)
    pub p: DVector<f64>,

    /// Variable lower bounds l (length n, -inf where absent)
    pub l: DVector<f64>,

    /// Variable upper bounds u (length n, +inf where absent)
    pub u: DVector<f64>,
}

/// How a constraint row or variable is bounded.
///
/// Derived from the finiteness pattern of its lower/upper bound pair; an
/// explicit tag rather than a pair of booleans so bound counting stays
/// exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// Neither bound is finite
    Free,

    /// Only the lower bound is finite
    LowerBounded,

    /// Only the upper bound is finite
    UpperBounded,

    /// Both bounds are finite and distinct
    Bounded,

    /// Both bounds are finite and equal: an equality constraint
    Fixed,
}

impl BoundKind {
    /// Classify a lower/upper bound pair.
    ///
    /// Crossed finite bounds (`lo > hi`) classify as `Bounded`; they encode
    /// an empty feasible interval and surface as `Infeasible` at solve time
    /// rather than as a setup error.
    pub fn classify(lo: f64, hi: f64) -> BoundKind {
        match (lo.is_finite(), hi.is_finite()) {
            (false, false) => BoundKind::Free,
            (true, false) => BoundKind::LowerBounded,
            (false, true) => BoundKind::UpperBounded,
            (true, true) => {
                if lo == hi {
                    BoundKind::Fixed
                } else {
                    BoundKind::Bounded
                }
            }
        }
    }

    /// Whether this kind carries a finite lower bound.
    pub fn has_lower(self) -> bool {
        matches!(
            self,
            BoundKind::LowerBounded | BoundKind::Bounded | BoundKind::Fixed
        )
    }

    /// Whether this kind carries a finite upper bound.
    pub fn has_upper(self) -> bool {
        matches!(
            self,
            BoundKind::UpperBounded | BoundKind::Bounded | BoundKind::Fixed
        )
    }
}

impl LinearProgram {
    /// Create an all-zero program with `rows` constraint rows and `vars`
    /// variables. All bounds start infinite and the direction is minimize.
    pub fn new(rows: usize, vars: usize) -> Self {
        LinearProgram {
            minimize: true,
            c: DVector::zeros(vars),
            A: DMatrix::zeros(rows, vars),
            q: DVector::from_element(rows, f64::NEG_INFINITY),
            p: DVector::from_element(rows, f64::INFINITY),
            l: DVector::from_element(vars, f64::NEG_INFINITY),
            u: DVector::from_element(vars, f64::INFINITY),
        }
    }

    /// Get the number of variables (n)
    pub fn num_vars(&self) -> usize {
        self.c.len()
    }

    /// Get the number of constraint rows (m)
    pub fn num_rows(&self) -> usize {
        self.p.len()
    }

    /// Bound classification of constraint row `i`.
    pub fn row_kind(&self, i: usize) -> BoundKind {
        BoundKind::classify(self.q[i], self.p[i])
    }

    /// Bound classification of variable `j`.
    pub fn var_kind(&self, j: usize) -> BoundKind {
        BoundKind::classify(self.l[j], self.u[j])
    }

    /// Validate problem dimensions.
    ///
    /// Bound ordering is not checked: a crossed pair (`l > u` or
    /// `q > p`) encodes an empty feasible interval and surfaces as
    /// `Infeasible` at solve time.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.num_vars();
        let m = self.num_rows();

        if self.A.nrows() != m || self.A.ncols() != n {
            return Err(format!(
                "A has shape {}×{}, expected {}×{}",
                self.A.nrows(),
                self.A.ncols(),
                m,
                n
            ));
        }
        if self.q.len() != m {
            return Err(format!("q has length {}, expected {}", self.q.len(), m));
        }
        if self.l.len() != n {
            return Err(format!("l has length {}, expected {}", self.l.len(), n));
        }
        if self.u.len() != n {
            return Err(format!("u has length {}, expected {}", self.u.len(), n));
        }

        Ok(())
    }

    /// Objective value c^T x.
    pub fn objective(&self, x: &DVector<f64>) -> f64 {
        self.c.dot(x)
    }

    /// Whether `x` satisfies every row constraint and variable bound to
    /// within `tol`.
    pub fn satisfies(&self, x: &DVector<f64>, tol: f64) -> bool {
        if x.len() != self.num_vars() {
            return false;
        }
        let ax = &self.A * x;
        for i in 0..self.num_rows() {
            if ax[i] > self.p[i] + tol || ax[i] < self.q[i] - tol {
                return false;
            }
        }
        for j in 0..self.num_vars() {
            if x[j] > self.u[j] + tol || x[j] < self.l[j] - tol {
                return false;
            }
        }
        true
    }
}

/// Solver settings and parameters.
#[derive(Debug, Clone)]
pub struct SolverSettings {
    /// Feasibility tolerance for point-satisfaction checks
    pub tol_zero: f64,

    /// Newton decrement threshold that ends the inner loop
    pub tol_inner: f64,

    /// Duality-gap proxy threshold that ends the outer loop
    pub tol_outer: f64,

    /// Diagnostic output volume, 0 (silent) through 4 (line-search detail).
    /// Has no effect on the iterates.
    pub verbose: u8,
}

impl Default for SolverSettings {
    fn default() -> Self {
        // Allow environment variable override for diagnostic volume
        let verbose = std::env::var("LP_BARRIER_VERBOSE")
            .ok()
            .and_then(|s| s.parse::<u8>().ok())
            .unwrap_or(0);

        Self {
            tol_zero: 1e-5,
            tol_inner: 1e-7,
            tol_outer: 1e-5,
            verbose,
        }
    }
}

/// Solution status.
///
/// A closed set of outcomes; solve never panics or errors on numerical
/// trouble, it reports one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Converged to the target duality gap
    Optimal,

    /// Converged, but a requested objective threshold was never crossed
    OptimalNoBreak,

    /// Stopped early because the objective crossed the requested threshold
    SubOptimal,

    /// No strictly feasible point exists, or none was found
    Infeasible,

    /// Outer continuation loop hit its iteration cap
    MaxIters,

    /// Newton system unsolvable by both Cholesky and the SVD fallback
    NumericalError,
}

impl SolveStatus {
    /// True when the solver holds a usable point: converged or stopped at
    /// the objective threshold.
    pub fn has_solution(&self) -> bool {
        matches!(
            self,
            SolveStatus::Optimal | SolveStatus::OptimalNoBreak | SolveStatus::SubOptimal
        )
    }

    /// True when the solve ran to full convergence.
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalNoBreak)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "Optimal"),
            SolveStatus::OptimalNoBreak => write!(f, "Optimal (break not reached)"),
            SolveStatus::SubOptimal => write!(f, "SubOptimal"),
            SolveStatus::Infeasible => write!(f, "Infeasible"),
            SolveStatus::MaxIters => write!(f, "MaxIters"),
            SolveStatus::NumericalError => write!(f, "Numerical Error"),
        }
    }
}

/// Solve result with solution and diagnostics.
#[derive(Debug, Clone)]
pub struct SolveResult {
    /// Solution status
    pub status: SolveStatus,

    /// Optimum in the original variable space; empty unless
    /// `status.has_solution()`
    pub x: DVector<f64>,

    /// Objective value at the optimum; NaN unless `status.has_solution()`
    pub objective: f64,

    /// Iteration and fallback counters
    pub info: SolveInfo,
}

/// Detailed solve information and diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SolveInfo {
    /// Outer (barrier continuation) passes completed
    pub outer_iters: usize,

    /// Total inner Newton iterations across all outer passes
    pub newton_iters: usize,

    /// Newton systems that fell back from Cholesky to SVD
    pub svd_fallbacks: usize,

    /// Line searches that underflowed the minimum step size
    pub line_search_stalls: usize,
}

impl SolveInfo {
    /// Merge counters from a nested solve into this one.
    pub fn absorb(&mut self, other: &SolveInfo) {
        self.outer_iters += other.outer_iters;
        self.newton_iters += other.newton_iters;
        self.svd_fallbacks += other.svd_fallbacks;
        self.line_search_stalls += other.line_search_stalls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_classification() {
        let inf = f64::INFINITY;
        assert_eq!(BoundKind::classify(-inf, inf), BoundKind::Free);
        assert_eq!(BoundKind::classify(0.0, inf), BoundKind::LowerBounded);
        assert_eq!(BoundKind::classify(-inf, 5.0), BoundKind::UpperBounded);
        assert_eq!(BoundKind::classify(0.0, 5.0), BoundKind::Bounded);
        assert_eq!(BoundKind::classify(3.0, 3.0), BoundKind::Fixed);
        // crossed bounds stay Bounded, they become an infeasible row pair
        assert_eq!(BoundKind::classify(10.0, 5.0), BoundKind::Bounded);
    }

    #[test]
    fn test_bound_predicates() {
        assert!(!BoundKind::Free.has_lower());
        assert!(!BoundKind::Free.has_upper());
        assert!(BoundKind::LowerBounded.has_lower());
        assert!(!BoundKind::LowerBounded.has_upper());
        assert!(!BoundKind::UpperBounded.has_lower());
        assert!(BoundKind::UpperBounded.has_upper());
        assert!(BoundKind::Bounded.has_lower());
        assert!(BoundKind::Bounded.has_upper());
        assert!(BoundKind::Fixed.has_lower());
        assert!(BoundKind::Fixed.has_upper());
    }

    #[test]
    fn test_new_dimensions() {
        let lp = LinearProgram::new(3, 2);
        assert_eq!(lp.num_rows(), 3);
        assert_eq!(lp.num_vars(), 2);
        assert!(lp.minimize);
        assert!(lp.validate().is_ok());
        for i in 0..3 {
            assert_eq!(lp.row_kind(i), BoundKind::Free);
        }
        for j in 0..2 {
            assert_eq!(lp.var_kind(j), BoundKind::Free);
        }
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let mut lp = LinearProgram::new(2, 2);
        lp.q = DVector::zeros(3);
        assert!(lp.validate().is_err());

        let mut lp = LinearProgram::new(2, 2);
        lp.A = DMatrix::zeros(2, 1);
        assert!(lp.validate().is_err());

        let mut lp = LinearProgram::new(2, 2);
        lp.u = DVector::zeros(1);
        assert!(lp.validate().is_err());
    }

    #[test]
    fn test_satisfies() {
        // x + y <= 4, x >= 0, y in [0, 3]
        let mut lp = LinearProgram::new(1, 2);
        lp.A[(0, 0)] = 1.0;
        lp.A[(0, 1)] = 1.0;
        lp.p[0] = 4.0;
        lp.l[0] = 0.0;
        lp.l[1] = 0.0;
        lp.u[1] = 3.0;

        let x = DVector::from_vec(vec![1.0, 2.0]);
        assert!(lp.satisfies(&x, 1e-9));

        let x = DVector::from_vec(vec![3.0, 2.0]); // row violated
        assert!(!lp.satisfies(&x, 1e-9));

        let x = DVector::from_vec(vec![-0.5, 1.0]); // bound violated
        assert!(!lp.satisfies(&x, 1e-9));

        // within tolerance of a bound counts as satisfied
        let x = DVector::from_vec(vec![-1e-8, 1.0]);
        assert!(lp.satisfies(&x, 1e-6));

        // wrong dimension never satisfies
        let x = DVector::from_vec(vec![0.0]);
        assert!(!lp.satisfies(&x, 1e-6));
    }

    #[test]
    fn test_objective() {
        let mut lp = LinearProgram::new(0, 2);
        lp.c = DVector::from_vec(vec![2.0, -1.0]);
        let x = DVector::from_vec(vec![3.0, 4.0]);
        assert_eq!(lp.objective(&x), 2.0);
    }

    #[test]
    fn test_settings_defaults() {
        let s = SolverSettings::default();
        assert_eq!(s.tol_zero, 1e-5);
        assert_eq!(s.tol_inner, 1e-7);
        assert_eq!(s.tol_outer, 1e-5);
    }

    #[test]
    fn test_status_predicates() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::OptimalNoBreak.has_solution());
        assert!(SolveStatus::SubOptimal.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::MaxIters.has_solution());
        assert!(!SolveStatus::NumericalError.has_solution());

        assert!(SolveStatus::Optimal.is_optimal());
        assert!(SolveStatus::OptimalNoBreak.is_optimal());
        assert!(!SolveStatus::SubOptimal.is_optimal());
    }

    #[test]
    fn test_info_absorb() {
        let mut a = SolveInfo {
            outer_iters: 2,
            newton_iters: 5,
            svd_fallbacks: 0,
            line_search_stalls: 1,
        };
        let b = SolveInfo {
            outer_iters: 3,
            newton_iters: 7,
            svd_fallbacks: 2,
            line_search_stalls: 0,
        };
        a.absorb(&b);
        assert_eq!(a.outer_iters, 5);
        assert_eq!(a.newton_iters, 12);
        assert_eq!(a.svd_fallbacks, 2);
        assert_eq!(a.line_search_stalls, 1);
    }
}
