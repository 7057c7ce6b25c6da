//! Primal log-barrier iteration.
//!
//! Solves `min c^T x  s.t.  A x < p` (every row strict) by following the
//! central path: an outer loop sharpens the barrier weight `t` while an
//! inner damped-Newton loop re-centers at each weight. Problems with
//! equality constraints or two-sided bounds are reduced to this form by
//! [`crate::solver::InteriorPoint`] first.

use nalgebra::{DMatrix, DVector};

use crate::linalg::{pseudo_recip, solve_conditioned, SolveMethod};
use crate::problem::{SolveInfo, SolveStatus, SolverSettings};

const MAX_OUTER_ITERS: usize = 30;
const MAX_INNER_ITERS: usize = 10;

/// Initial central-path weight.
const T_INIT: f64 = 0.01;
/// Weight multiplier per outer iteration.
const MU: f64 = 15.0;
/// Sufficient-decrease fraction in the backtracking line search.
const ALPHA: f64 = 0.2;
/// Step shrink factor per backtrack.
const BETA: f64 = 0.5;
/// Steps below this are treated as a stall.
const S_MIN: f64 = 1e-10;
/// Starting slack value for the phase-1 problem.
const FEAS_SEED: f64 = 1e6;

/// Barrier solver over a pure inequality system `A x <= p`.
///
/// Iterates only over strictly interior points, so it needs a strictly
/// feasible start: either one supplied through [`set_initial_point`] or
/// one found by an internal phase-1 solve.
///
/// [`set_initial_point`]: BarrierSolver::set_initial_point
#[derive(Debug, Clone)]
#[allow(non_snake_case)] // A is standard mathematical notation
pub struct BarrierSolver {
    /// Inequality matrix A (rows are half-spaces `A_i x <= p_i`)
    pub A: DMatrix<f64>,

    /// Inequality right-hand side p
    pub p: DVector<f64>,

    /// Objective vector c, always minimized
    pub c: DVector<f64>,

    /// Tolerances and diagnostic volume
    pub settings: SolverSettings,

    objective_break: Option<f64>,
    x0: Option<DVector<f64>>,
    xopt: DVector<f64>,
    feasibility: Option<Box<BarrierSolver>>,
    info: SolveInfo,
}

impl BarrierSolver {
    /// Create a zeroed solver for `rows` inequalities over `vars`
    /// variables.
    pub fn new(rows: usize, vars: usize) -> Self {
        BarrierSolver {
            A: DMatrix::zeros(rows, vars),
            p: DVector::zeros(rows),
            c: DVector::zeros(vars),
            settings: SolverSettings::default(),
            objective_break: None,
            x0: None,
            xopt: DVector::zeros(vars),
            feasibility: None,
            info: SolveInfo::default(),
        }
    }

    /// Zero out the problem data and drop any previous solution state.
    /// Settings and the objective threshold survive a resize.
    pub fn resize(&mut self, rows: usize, vars: usize) {
        self.A = DMatrix::zeros(rows, vars);
        self.p = DVector::zeros(rows);
        self.c = DVector::zeros(vars);
        self.x0 = None;
        self.xopt = DVector::zeros(vars);
        self.feasibility = None;
        self.info = SolveInfo::default();
    }

    /// Stop the next solve as soon as the objective falls below `value`.
    pub fn set_objective_break(&mut self, value: f64) {
        self.objective_break = Some(value);
    }

    /// Supply a strictly interior starting point. A point of the wrong
    /// dimension is rejected and the solver falls back to its phase-1
    /// search.
    pub fn set_initial_point(&mut self, x: DVector<f64>) {
        if x.len() != self.c.len() {
            eprintln!(
                "Warning: initial point has {} entries, problem has {} variables",
                x.len(),
                self.c.len()
            );
            self.x0 = None;
            return;
        }
        self.x0 = Some(x);
    }

    /// Forget the configured starting point; the next solve runs the
    /// phase-1 search again.
    pub fn clear_initial_point(&mut self) {
        self.x0 = None;
    }

    /// Starting point the next solve will use, if one is set.
    pub fn initial_point(&self) -> Option<&DVector<f64>> {
        self.x0.as_ref()
    }

    /// Auxiliary solver from the last phase-1 search, kept for
    /// inspection.
    pub fn feasibility_solver(&self) -> Option<&BarrierSolver> {
        self.feasibility.as_deref()
    }

    /// Best iterate of the last solve.
    pub fn optimum(&self) -> &DVector<f64> {
        &self.xopt
    }

    /// Iteration counters from the last solve, phase-1 work included.
    pub fn info(&self) -> &SolveInfo {
        &self.info
    }

    /// Linear objective `c^T x`.
    fn objective(&self, x: &DVector<f64>) -> f64 {
        self.c.dot(x)
    }

    /// Whether every slack `p_i - A_i x` is strictly positive.
    fn is_interior(&self, x: &DVector<f64>) -> bool {
        let slack = &self.p - &self.A * x;
        slack.iter().all(|&v| v > 0.0)
    }

    /// Barrier objective `t c^T x - sum_i ln(p_i - A_i x)`, infinite
    /// outside the interior.
    fn barrier_objective(&self, x: &DVector<f64>, t: f64) -> f64 {
        let mut obj = t * self.c.dot(x);
        let slack = &self.p - &self.A * x;
        for &s in slack.iter() {
            if s <= 0.0 {
                return f64::INFINITY;
            }
            obj -= s.ln();
        }
        obj
    }

    /// Run the barrier iteration.
    ///
    /// Starts from the configured initial point, or from a phase-1 solve
    /// when none is set. Repeated calls restart from the same initial
    /// point and give the same answer.
    pub fn solve(&mut self) -> SolveStatus {
        let v = self.settings.verbose;
        self.info = SolveInfo::default();

        if v >= 1 {
            println!(
                "Solving barrier LP ({} rows, {} vars):",
                self.p.len(),
                self.c.len()
            );
        }

        if self.x0.is_none() {
            self.find_feasible_point();
        }
        let Some(start) = self.x0.clone() else {
            if v >= 1 {
                println!("Could not find an initial feasible point");
            }
            return SolveStatus::Infeasible;
        };

        if v >= 2 {
            println!("x0 = {:?}", start.as_slice());
        }

        // xopt restarts from x0 on every solve
        self.xopt = start;

        let mut t = T_INIT;
        let mut gap = 1.0;
        let mut iter_outer = 0usize;

        while gap > self.settings.tol_outer {
            if v >= 2 {
                println!("Current xopt = {:?}", self.xopt.as_slice());
            }

            iter_outer += 1;
            if iter_outer > MAX_OUTER_ITERS {
                eprintln!(
                    "Warning: barrier outer loop did not converge within {} iters",
                    MAX_OUTER_ITERS
                );
                return SolveStatus::MaxIters;
            }

            t *= MU;
            if v >= 2 {
                println!(" Outer iter {}, t={:.3e}", iter_outer, t);
            }

            let mut dec: f64 = 1.0;
            let mut iter_inner = 0usize;
            while dec.abs() > self.settings.tol_inner && iter_inner <= MAX_INNER_ITERS {
                iter_inner += 1;
                self.info.newton_iters += 1;
                if v >= 3 {
                    println!("  Inner iter {}, dec={:.3e}", iter_inner, dec);
                }

                // Newton system for the barrier objective:
                //   H = A^T diag(d)^2 A,  g = A^T d + t c
                // with d the componentwise reciprocal of the slack
                let slack = &self.p - &self.A * &self.xopt;
                let d = slack.map(pseudo_recip);

                let mut hsub = self.A.clone();
                for (i, mut row) in hsub.row_iter_mut().enumerate() {
                    row *= d[i];
                }
                let h = hsub.tr_mul(&hsub);

                let mut g = self.A.tr_mul(&d);
                g.axpy(t, &self.c, 1.0);

                let Some((step, method)) = solve_conditioned(&h, &g) else {
                    if v >= 1 {
                        println!("Newton system could not be solved");
                    }
                    return SolveStatus::NumericalError;
                };
                if method == SolveMethod::Svd {
                    self.info.svd_fallbacks += 1;
                    if v >= 1 {
                        println!("Solved by SVD");
                    }
                }
                let dx = -step;

                dec = g.dot(&dx);

                // Longest step keeping every slack positive, capped at 2;
                // shrink to 99% of the boundary when it binds
                let mut s = 1.0;
                let phi0 = self.barrier_objective(&self.xopt, t);
                let adx = &self.A * &dx;
                let mut smax: f64 = 2.0;
                for i in 0..slack.len() {
                    debug_assert!(slack[i] >= 0.0, "iterate left the interior");
                    if adx[i] > 0.0 {
                        smax = smax.min(slack[i] / adx[i]);
                    }
                }
                if smax <= 1.0 {
                    s = 0.99 * smax;
                }

                let mut iter_backtrack = 0usize;
                loop {
                    iter_backtrack += 1;
                    if v >= 4 {
                        println!(
                            "   Backtrack iter {}, s={:.3e}, dec={:.3e}",
                            iter_backtrack, s, dec
                        );
                    }
                    let xcur = &self.xopt + &dx * s;
                    if self.is_interior(&xcur)
                        && self.barrier_objective(&xcur, t) <= phi0 + ALPHA * s * dec
                    {
                        self.xopt = xcur;
                        break;
                    }
                    s *= BETA;
                    if s < S_MIN {
                        self.info.line_search_stalls += 1;
                        if v >= 2 {
                            println!("Line search step became negligible, breaking");
                        }
                        break;
                    }
                }

                if v >= 3 {
                    println!(
                        "  Inner iter {}, obj={:.6e}, s={:.3e}, dec={:.3e}, gap={:.3e}",
                        iter_inner,
                        self.objective(&self.xopt),
                        s,
                        dec,
                        self.p.len() as f64 / t
                    );
                }

                if let Some(brk) = self.objective_break {
                    if self.objective(&self.xopt) < brk {
                        return SolveStatus::SubOptimal;
                    }
                }
                if s < S_MIN {
                    break;
                }
            }

            gap = self.p.len() as f64 / t;
            self.info.outer_iters += 1;
        }

        if v >= 1 {
            println!("Optimization was successful.");
        }

        if let Some(brk) = self.objective_break {
            let obj = self.objective(&self.xopt);
            if obj >= brk {
                if v >= 1 {
                    println!("Objective threshold {} was not reached, value is {}", brk, obj);
                }
                return SolveStatus::OptimalNoBreak;
            }
        }
        SolveStatus::Optimal
    }

    /// Phase-1 search for a strictly interior point.
    ///
    /// Solves an auxiliary program with one extra slack variable `s`
    /// placed ahead of the originals, rows relaxed to `A_i x - s <= p_i`,
    /// and objective `min s`. Any `x` is interior to the relaxed rows for
    /// large enough `s`, and an iterate with `s < 0` is strictly interior
    /// to the original rows. The auxiliary objective has no finite
    /// minimum when the original interior is nonempty, so the solve is
    /// stopped by an objective threshold of zero instead of run to
    /// optimality.
    fn find_feasible_point(&mut self) {
        let v = self.settings.verbose;
        let m = self.p.len();
        let n = self.c.len();

        if v >= 1 {
            println!(" - finding feasible point:");
        }

        let mut aux = BarrierSolver::new(m, n + 1);
        aux.settings = self.settings.clone();
        aux.c[0] = 1.0;
        for i in 0..m {
            aux.A[(i, 0)] = -1.0;
        }
        aux.A.view_mut((0, 1), (m, n)).copy_from(&self.A);
        aux.p.copy_from(&self.p);

        let mut seed = DVector::zeros(n + 1);
        seed[0] = FEAS_SEED;
        aux.set_initial_point(seed);
        aux.set_objective_break(0.0);

        if v >= 2 {
            println!(" - solve feasibility problem");
        }
        let status = aux.solve();
        self.info.absorb(aux.info());

        // The auxiliary status alone does not guarantee strict
        // interiority; check the extracted point against the original
        // rows directly.
        let mut found = false;
        if !matches!(
            status,
            SolveStatus::Infeasible | SolveStatus::NumericalError
        ) {
            let candidate = aux.optimum().rows(1, n).clone_owned();
            if self.is_interior(&candidate) {
                self.x0 = Some(candidate);
                found = true;
            }
        }
        self.feasibility = Some(Box::new(aux));

        if v >= 1 {
            if found {
                println!(" - found a feasible point");
            } else {
                println!(" - found NO feasible point");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0 <= x <= 10 as two half-spaces.
    fn interval_solver() -> BarrierSolver {
        let mut s = BarrierSolver::new(2, 1);
        s.A[(0, 0)] = 1.0;
        s.A[(1, 0)] = -1.0;
        s.p[0] = 10.0;
        s.p[1] = 0.0;
        s.c[0] = 1.0;
        s
    }

    #[test]
    fn test_minimize_over_interval() {
        let mut s = interval_solver();
        s.set_initial_point(DVector::from_vec(vec![5.0]));

        let status = s.solve();
        assert!(
            matches!(status, SolveStatus::Optimal),
            "unexpected status: {:?}",
            status
        );
        assert!(s.optimum()[0].abs() < 1e-3, "x = {}", s.optimum()[0]);
        assert!(s.info().outer_iters > 0);
        assert!(s.info().newton_iters > 0);
    }

    #[test]
    fn test_unreached_break_reports_no_break() {
        let mut s = interval_solver();
        s.set_initial_point(DVector::from_vec(vec![5.0]));
        s.set_objective_break(-1.0); // minimum is 0, never crossed

        let status = s.solve();
        assert!(
            matches!(status, SolveStatus::OptimalNoBreak),
            "unexpected status: {:?}",
            status
        );
        assert!(s.optimum()[0].abs() < 1e-3);
    }

    #[test]
    fn test_crossed_break_stops_early() {
        let mut s = interval_solver();
        s.set_initial_point(DVector::from_vec(vec![5.0]));
        s.set_objective_break(2.0);

        let status = s.solve();
        assert!(
            matches!(status, SolveStatus::SubOptimal),
            "unexpected status: {:?}",
            status
        );
        assert!(s.optimum()[0] < 2.0);
    }

    #[test]
    fn test_phase1_finds_interior_start() {
        let mut s = interval_solver();
        // no initial point: solve must run the phase-1 search itself

        let status = s.solve();
        assert!(
            matches!(status, SolveStatus::Optimal),
            "unexpected status: {:?}",
            status
        );
        assert!(s.optimum()[0].abs() < 1e-3);
        let x0 = s.initial_point().unwrap();
        assert!(x0[0] > 0.0 && x0[0] < 10.0, "x0 = {}", x0[0]);
        assert!(s.feasibility_solver().is_some());
    }

    #[test]
    fn test_empty_interior_is_infeasible() {
        // x <= 5 and x >= 10 cannot both hold
        let mut s = BarrierSolver::new(2, 1);
        s.A[(0, 0)] = 1.0;
        s.A[(1, 0)] = -1.0;
        s.p[0] = 5.0;
        s.p[1] = -10.0;
        s.c[0] = 1.0;

        let status = s.solve();
        assert!(
            matches!(status, SolveStatus::Infeasible),
            "unexpected status: {:?}",
            status
        );
        assert!(s.initial_point().is_none());
    }

    #[test]
    fn test_initial_point_dimension_check() {
        let mut s = interval_solver();
        s.set_initial_point(DVector::from_vec(vec![1.0, 2.0]));
        assert!(s.initial_point().is_none());

        s.set_initial_point(DVector::from_vec(vec![1.0]));
        assert!(s.initial_point().is_some());

        // a bad point does not leave the previous one in place
        s.set_initial_point(DVector::from_vec(vec![1.0, 2.0]));
        assert!(s.initial_point().is_none());
    }

    #[test]
    fn test_resize_clears_state() {
        let mut s = interval_solver();
        s.set_initial_point(DVector::from_vec(vec![5.0]));
        s.solve();

        s.resize(1, 2);
        assert_eq!(s.A.nrows(), 1);
        assert_eq!(s.A.ncols(), 2);
        assert!(s.initial_point().is_none());
        assert_eq!(s.optimum().len(), 2);
    }
}
