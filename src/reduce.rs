use nalgebra::{DMatrix, DVector};

use crate::problem::{BoundKind, LinearProgram};

/// Collect every equality constraint of `lp` into one system `aeq x = beq`.
///
/// Fixed rows come first in row order, then fixed variables as unit rows
/// in variable order. The system has zero rows when nothing is fixed.
pub fn equality_system(lp: &LinearProgram) -> (DMatrix<f64>, DVector<f64>) {
    let m = lp.num_rows();
    let n = lp.num_vars();

    let mut neq = 0;
    for i in 0..m {
        if lp.row_kind(i) == BoundKind::Fixed {
            neq += 1;
        }
    }
    for j in 0..n {
        if lp.var_kind(j) == BoundKind::Fixed {
            neq += 1;
        }
    }

    let mut aeq = DMatrix::zeros(neq, n);
    let mut beq = DVector::zeros(neq);
    let mut k = 0;
    for i in 0..m {
        if lp.row_kind(i) == BoundKind::Fixed {
            aeq.row_mut(k).copy_from(&lp.A.row(i));
            beq[k] = lp.p[i];
            k += 1;
        }
    }
    for j in 0..n {
        if lp.var_kind(j) == BoundKind::Fixed {
            aeq[(k, j)] = 1.0;
            beq[k] = lp.l[j];
            k += 1;
        }
    }

    (aeq, beq)
}

/// Rewrite every non-fixed bound of `lp` as a half-space, producing the
/// canonical system `g x <= h` over the original variables.
///
/// Each two-sided row or variable yields two half-spaces. Rows
/// contribute their upper bound first, variables their lower bound
/// first. Fixed rows and variables are left to [`equality_system`].
pub fn inequality_rows(lp: &LinearProgram) -> (DMatrix<f64>, DVector<f64>) {
    let m = lp.num_rows();
    let n = lp.num_vars();

    let mut nineq = 0;
    for i in 0..m {
        let kind = lp.row_kind(i);
        if kind == BoundKind::Fixed {
            continue;
        }
        if kind.has_upper() {
            nineq += 1;
        }
        if kind.has_lower() {
            nineq += 1;
        }
    }
    for j in 0..n {
        let kind = lp.var_kind(j);
        if kind == BoundKind::Fixed {
            continue;
        }
        if kind.has_lower() {
            nineq += 1;
        }
        if kind.has_upper() {
            nineq += 1;
        }
    }

    let mut g = DMatrix::zeros(nineq, n);
    let mut h = DVector::zeros(nineq);
    let mut k = 0;
    for i in 0..m {
        let kind = lp.row_kind(i);
        if kind == BoundKind::Fixed {
            continue;
        }
        if kind.has_upper() {
            // A_i x <= p_i
            g.row_mut(k).copy_from(&lp.A.row(i));
            h[k] = lp.p[i];
            k += 1;
        }
        if kind.has_lower() {
            // q_i <= A_i x  becomes  -A_i x <= -q_i
            let neg = -lp.A.row(i).clone_owned();
            g.row_mut(k).copy_from(&neg);
            h[k] = -lp.q[i];
            k += 1;
        }
    }
    for j in 0..n {
        let kind = lp.var_kind(j);
        if kind == BoundKind::Fixed {
            continue;
        }
        if kind.has_lower() {
            // l_j <= x_j  becomes  -x_j <= -l_j
            g[(k, j)] = -1.0;
            h[k] = -lp.l[j];
            k += 1;
        }
        if kind.has_upper() {
            // x_j <= u_j
            g[(k, j)] = 1.0;
            h[k] = lp.u[j];
            k += 1;
        }
    }

    (g, h)
}

/// Change of variables induced by the equality constraints.
///
/// The barrier iteration runs over the reduced variables `y`; this map
/// carries points and inequality rows between the two spaces.
#[derive(Debug, Clone)]
pub enum ReducedMap {
    /// No equality constraints; reduced variables are the originals
    Passthrough,

    /// Equalities leave `x = x0 + basis y` with orthonormal `basis`
    Nullspace {
        x0: DVector<f64>,
        basis: DMatrix<f64>,
    },

    /// Equalities pin every variable at `x0`; nothing is left to solve
    Determined { x0: DVector<f64> },
}

impl ReducedMap {
    /// Number of reduced variables given `original` problem variables.
    pub fn reduced_vars(&self, original: usize) -> usize {
        match self {
            ReducedMap::Passthrough => original,
            ReducedMap::Nullspace { basis, .. } => basis.ncols(),
            ReducedMap::Determined { .. } => 0,
        }
    }

    /// Map a reduced point back to the original variables.
    pub fn recover(&self, y: &DVector<f64>) -> DVector<f64> {
        match self {
            ReducedMap::Passthrough => y.clone(),
            ReducedMap::Nullspace { x0, basis } => x0 + basis * y,
            ReducedMap::Determined { x0 } => x0.clone(),
        }
    }

    /// Reduced representation of an original-space point.
    ///
    /// The basis is orthonormal, so `y = basis^T (x - x0)`; exact
    /// whenever `x` satisfies the equality constraints.
    pub fn project(&self, x: &DVector<f64>) -> DVector<f64> {
        match self {
            ReducedMap::Passthrough => x.clone(),
            ReducedMap::Nullspace { x0, basis } => basis.tr_mul(&(x - x0)),
            ReducedMap::Determined { .. } => DVector::zeros(0),
        }
    }

    /// Rewrite the half-space system `g x <= h` over the reduced
    /// variables.
    pub fn transform_rows(
        &self,
        g: &DMatrix<f64>,
        h: &DVector<f64>,
    ) -> (DMatrix<f64>, DVector<f64>) {
        match self {
            ReducedMap::Passthrough => (g.clone(), h.clone()),
            ReducedMap::Nullspace { x0, basis } => (g * basis, h - g * x0),
            ReducedMap::Determined { .. } => (DMatrix::zeros(0, 0), DVector::zeros(0)),
        }
    }

    /// Objective over the reduced variables, always in minimization
    /// form, plus the constant offset `c^T x0`.
    ///
    /// The offset is reported for the original (unnegated) objective
    /// even when `minimize` is false.
    pub fn reduced_objective(&self, c: &DVector<f64>, minimize: bool) -> (DVector<f64>, f64) {
        let (cr, offset) = match self {
            ReducedMap::Passthrough => (c.clone(), 0.0),
            ReducedMap::Nullspace { x0, basis } => (basis.tr_mul(c), c.dot(x0)),
            ReducedMap::Determined { x0 } => (DVector::zeros(0), c.dot(x0)),
        };
        if minimize {
            (cr, offset)
        } else {
            (-cr, offset)
        }
    }
}
