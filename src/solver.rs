//! Front-end solver for general linear programs.
//!
//! Normalizes an installed [`LinearProgram`] into the pure inequality
//! form the barrier iteration understands: equality constraints are
//! eliminated through a nullspace parametrization and every remaining
//! bound becomes a half-space. Points move between the two variable
//! spaces through a [`ReducedMap`].

use nalgebra::DVector;

use crate::barrier::BarrierSolver;
use crate::error::{SetupError, SetupResult};
use crate::linalg::nullspace;
use crate::problem::{LinearProgram, SolveInfo, SolveStatus, SolverSettings};
use crate::reduce::{equality_system, inequality_rows, ReducedMap};

/// Interior-point solver over a general linear program.
///
/// Install a problem with [`set`], then call [`solve`]; the optimum is
/// read back in the original variables through [`optimum`]. Objective
/// and threshold changes between solves go through [`set_objective`] and
/// [`set_objective_break`] so they stay consistent with the installed
/// reduction.
///
/// [`set`]: InteriorPoint::set
/// [`solve`]: InteriorPoint::solve
/// [`optimum`]: InteriorPoint::optimum
/// [`set_objective`]: InteriorPoint::set_objective
/// [`set_objective_break`]: InteriorPoint::set_objective_break
#[derive(Debug, Clone)]
pub struct InteriorPoint {
    /// Tolerances and diagnostic volume, copied to the barrier stage on
    /// every solve
    pub settings: SolverSettings,

    solver: BarrierSolver,
    map: ReducedMap,
    problem: LinearProgram,
    foffset: f64,
    eq_consistent: bool,
}

impl InteriorPoint {
    /// Create an empty solver; install a problem with [`set`] before
    /// solving.
    ///
    /// [`set`]: InteriorPoint::set
    pub fn new() -> Self {
        InteriorPoint {
            settings: SolverSettings::default(),
            solver: BarrierSolver::new(0, 0),
            map: ReducedMap::Passthrough,
            problem: LinearProgram::new(0, 0),
            foffset: 0.0,
            eq_consistent: true,
        }
    }

    /// Install a problem, replacing any previous one.
    ///
    /// Eliminates fixed rows and variables, normalizes the remaining
    /// bounds to half-spaces, and loads the reduced system into the
    /// barrier stage. Inconsistent equality constraints are not an
    /// error here; the next [`solve`] reports `Infeasible`.
    ///
    /// [`solve`]: InteriorPoint::solve
    pub fn set(&mut self, lp: &LinearProgram) -> SetupResult<()> {
        lp.validate().map_err(SetupError::InvalidProblem)?;
        let v = self.settings.verbose;
        let n = lp.num_vars();

        let (aeq, beq) = equality_system(lp);
        let mut eq_consistent = true;
        let map = if aeq.nrows() == 0 {
            ReducedMap::Passthrough
        } else {
            let Some(d) = nullspace(&aeq, &beq) else {
                if v >= 1 {
                    println!("Could not decompose the equality constraints");
                }
                return Err(SetupError::EqualityDecomposition);
            };
            // the decomposition is least-squares, so an inconsistent
            // system still yields a point; record the mismatch
            let residual = (&aeq * &d.particular - &beq).amax();
            eq_consistent = residual <= self.settings.tol_zero * (1.0 + beq.amax());
            if d.basis.ncols() == 0 {
                ReducedMap::Determined { x0: d.particular }
            } else {
                ReducedMap::Nullspace {
                    x0: d.particular,
                    basis: d.basis,
                }
            }
        };

        if matches!(map, ReducedMap::Determined { .. }) {
            if v >= 1 {
                println!("Equality constraints determine every variable");
            }
            self.solver.resize(0, 0);
            let (_, foffset) = map.reduced_objective(&lp.c, lp.minimize);
            self.foffset = foffset;
            self.map = map;
            self.problem = lp.clone();
            self.eq_consistent = eq_consistent;
            return Ok(());
        }

        let (g, h) = inequality_rows(lp);
        if g.nrows() == 0 {
            return Err(SetupError::NoInequalities);
        }

        if aeq.nrows() > 0 && v >= 1 {
            println!(
                "Decomposed the problem from {} to {} variables",
                n,
                map.reduced_vars(n)
            );
        }

        let (gr, hr) = map.transform_rows(&g, &h);
        let (cr, foffset) = map.reduced_objective(&lp.c, lp.minimize);

        self.solver.resize(gr.nrows(), map.reduced_vars(n));
        self.solver.A = gr;
        self.solver.p = hr;
        self.solver.c = cr;
        self.solver.settings = self.settings.clone();

        self.foffset = foffset;
        self.map = map;
        self.problem = lp.clone();
        self.eq_consistent = eq_consistent;
        Ok(())
    }

    /// Replace the objective vector without rebuilding the reduction.
    pub fn set_objective(&mut self, c: &DVector<f64>) -> SetupResult<()> {
        if c.len() != self.problem.num_vars() {
            return Err(SetupError::InvalidProblem(format!(
                "objective has length {}, expected {}",
                c.len(),
                self.problem.num_vars()
            )));
        }
        self.problem.c = c.clone();
        let (cr, foffset) = self.map.reduced_objective(c, self.problem.minimize);
        self.solver.c = cr;
        self.foffset = foffset;
        Ok(())
    }

    /// Stop the next solve once the objective passes `value`: below it
    /// when minimizing, above it when maximizing.
    pub fn set_objective_break(&mut self, value: f64) {
        // the barrier stage always minimizes +-(c^T x - foffset)
        if self.problem.minimize {
            self.solver.set_objective_break(value - self.foffset);
        } else {
            self.solver.set_objective_break(self.foffset - value);
        }
    }

    /// Supply a starting point in the original variables.
    ///
    /// The point is projected onto the reduced space, so it should
    /// satisfy the equality constraints and be strictly interior to
    /// every inequality.
    pub fn set_initial_point(&mut self, x: &DVector<f64>) {
        if x.len() != self.problem.num_vars() {
            eprintln!(
                "Warning: initial point has {} entries, problem has {} variables",
                x.len(),
                self.problem.num_vars()
            );
            self.solver.clear_initial_point();
            return;
        }
        let y = self.map.project(x);
        self.solver.set_initial_point(y);
    }

    /// Configured starting point mapped back to the original variables.
    pub fn initial_point(&self) -> Option<DVector<f64>> {
        self.solver.initial_point().map(|y| self.map.recover(y))
    }

    /// Run the solver on the installed problem.
    pub fn solve(&mut self) -> SolveStatus {
        let v = self.settings.verbose;
        self.solver.settings = self.settings.clone();

        if !self.eq_consistent {
            if v >= 1 {
                println!("Equality constraints are inconsistent");
            }
            return SolveStatus::Infeasible;
        }

        if let ReducedMap::Determined { x0 } = &self.map {
            // nothing left to iterate on, verify the pinned point
            let feasible = self.problem.satisfies(x0, self.settings.tol_zero);
            if v >= 1 {
                if feasible {
                    println!("Every variable is determined; the pinned point is feasible");
                } else {
                    println!("Every variable is determined; the pinned point violates a constraint");
                }
            }
            return if feasible {
                SolveStatus::Optimal
            } else {
                SolveStatus::Infeasible
            };
        }

        self.solver.solve()
    }

    /// Best point of the last solve, in the original variables.
    pub fn optimum(&self) -> DVector<f64> {
        self.map.recover(self.solver.optimum())
    }

    /// Objective of the installed problem at [`optimum`].
    ///
    /// [`optimum`]: InteriorPoint::optimum
    pub fn objective_value(&self) -> f64 {
        self.problem.objective(&self.optimum())
    }

    /// Iteration counters from the last solve.
    pub fn info(&self) -> &SolveInfo {
        self.solver.info()
    }
}

impl Default for InteriorPoint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// min c^T x over the unit box in two variables.
    fn unit_box(c0: f64, c1: f64) -> LinearProgram {
        let mut lp = LinearProgram::new(0, 2);
        lp.c[0] = c0;
        lp.c[1] = c1;
        lp.l[0] = 0.0;
        lp.u[0] = 1.0;
        lp.l[1] = 0.0;
        lp.u[1] = 1.0;
        lp
    }

    #[test]
    fn test_set_objective_rebinds() {
        let mut ip = InteriorPoint::new();
        ip.set(&unit_box(1.0, 0.0)).unwrap();

        let status = ip.solve();
        assert!(status.has_solution(), "unexpected status: {:?}", status);
        assert!(ip.optimum()[0].abs() < 1e-3);

        ip.set_objective(&DVector::from_vec(vec![-1.0, 0.0])).unwrap();
        let status = ip.solve();
        assert!(status.has_solution(), "unexpected status: {:?}", status);
        assert!((ip.optimum()[0] - 1.0).abs() < 1e-3);
        assert!((ip.objective_value() + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_objective_checks_dimensions() {
        let mut ip = InteriorPoint::new();
        ip.set(&unit_box(1.0, 0.0)).unwrap();
        let err = ip.set_objective(&DVector::from_vec(vec![1.0]));
        assert!(matches!(err, Err(SetupError::InvalidProblem(_))));
    }

    #[test]
    fn test_initial_point_maps_through_equalities() {
        // x + y = 1 with box bounds: one reduced variable
        let mut lp = LinearProgram::new(1, 2);
        lp.A[(0, 0)] = 1.0;
        lp.A[(0, 1)] = 1.0;
        lp.q[0] = 1.0;
        lp.p[0] = 1.0;
        lp.l[0] = 0.0;
        lp.u[0] = 1.0;
        lp.l[1] = 0.0;
        lp.u[1] = 1.0;

        let mut ip = InteriorPoint::new();
        ip.set(&lp).unwrap();

        ip.set_initial_point(&DVector::from_vec(vec![0.3, 0.7]));
        let x0 = ip.initial_point().unwrap();
        assert!((x0[0] - 0.3).abs() < 1e-10);
        assert!((x0[1] - 0.7).abs() < 1e-10);

        // wrong dimension leaves the start unset
        let mut ip = InteriorPoint::new();
        ip.set(&lp).unwrap();
        ip.set_initial_point(&DVector::from_vec(vec![0.3]));
        assert!(ip.initial_point().is_none());
    }

    #[test]
    fn test_no_inequalities_is_a_setup_error() {
        // x fixed, y completely free: nothing bounds the reduced space
        let mut lp = LinearProgram::new(0, 2);
        lp.l[0] = 1.0;
        lp.u[0] = 1.0;

        let mut ip = InteriorPoint::new();
        let err = ip.set(&lp);
        assert!(matches!(err, Err(SetupError::NoInequalities)));
    }

    #[test]
    fn test_invalid_dimensions_are_rejected() {
        let mut lp = unit_box(1.0, 0.0);
        lp.c = DVector::zeros(3);

        let mut ip = InteriorPoint::new();
        assert!(matches!(
            ip.set(&lp),
            Err(SetupError::InvalidProblem(_))
        ));
    }
}
