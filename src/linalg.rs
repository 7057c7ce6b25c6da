//! Dense linear algebra kernels.
//!
//! Two jobs live here: solving the symmetric Newton systems that the
//! barrier iteration produces, and decomposing equality constraints into
//! a particular solution plus an orthonormal nullspace basis.

use nalgebra::{Cholesky, DMatrix, DVector, SVD};

/// Reciprocal that maps exact zero to zero instead of infinity.
pub fn pseudo_recip(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        1.0 / v
    }
}

/// Which factorization produced a Newton step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// Cholesky factorization succeeded
    Cholesky,

    /// Cholesky failed, SVD least-squares fallback was used
    Svd,
}

/// Solve the symmetric system `h x = b` with diagonal conditioning.
///
/// The system is rescaled by `S = diag(1/sqrt(|h_ii|))` so that the
/// conditioned matrix has a unit diagonal, then factorized by Cholesky.
/// When the matrix is not positive definite the SVD pseudo-inverse is
/// used instead, which also covers rank-deficient systems. Returns `None`
/// only when both factorizations fail.
pub fn solve_conditioned(h: &DMatrix<f64>, b: &DVector<f64>) -> Option<(DVector<f64>, SolveMethod)> {
    let n = h.nrows();

    let scale = DVector::from_fn(n, |i, _| {
        let d = h[(i, i)].abs();
        if d > 0.0 {
            1.0 / d.sqrt()
        } else {
            1.0
        }
    });

    let mut hs = h.clone();
    for i in 0..n {
        for j in 0..n {
            hs[(i, j)] *= scale[i] * scale[j];
        }
    }
    let bs = b.component_mul(&scale);

    if let Some(chol) = Cholesky::new(hs.clone()) {
        let z = chol.solve(&bs);
        return Some((z.component_mul(&scale), SolveMethod::Cholesky));
    }

    let svd = SVD::try_new(hs, true, true, f64::EPSILON, 0)?;
    let tol = svd.singular_values.amax() * n as f64 * f64::EPSILON;
    let z = svd.solve(&bs, tol).ok()?;
    Some((z.component_mul(&scale), SolveMethod::Svd))
}

/// Affine parametrization of the solution set of `aeq x = beq`.
///
/// Every solution has the form `x = particular + basis * y` for a free
/// vector `y`. When the constraints pin down every variable the basis
/// has zero columns.
#[derive(Debug, Clone)]
pub struct NullspaceDecomposition {
    /// Minimum-norm solution of the equality system
    pub particular: DVector<f64>,

    /// Orthonormal nullspace basis, one column per remaining degree of
    /// freedom (n × k)
    pub basis: DMatrix<f64>,
}

/// Decompose `aeq x = beq` by SVD.
///
/// Returns `None` when the SVD does not converge. An inconsistent system
/// still decomposes; `particular` is then the least-squares point and the
/// caller decides what a nonzero residual means.
pub fn nullspace(aeq: &DMatrix<f64>, beq: &DVector<f64>) -> Option<NullspaceDecomposition> {
    let m = aeq.nrows();
    let n = aeq.ncols();

    // nalgebra computes the thin SVD, which drops the trailing rows of
    // V^T when m < n. Padding with zero rows keeps all n right singular
    // vectors available for the nullspace basis.
    let rows = m.max(n);
    let mut padded = DMatrix::zeros(rows, n);
    padded.view_mut((0, 0), (m, n)).copy_from(aeq);
    let mut rhs = DVector::zeros(rows);
    rhs.rows_mut(0, m).copy_from(beq);

    let svd = SVD::try_new(padded, true, true, f64::EPSILON, 0)?;
    let tol = svd.singular_values.amax() * rows as f64 * f64::EPSILON;

    let particular = svd.solve(&rhs, tol).ok()?;
    let v_t = svd.v_t.as_ref()?;

    let null_rows: Vec<usize> = (0..svd.singular_values.len())
        .filter(|&i| svd.singular_values[i] <= tol)
        .collect();

    let mut basis = DMatrix::zeros(n, null_rows.len());
    for (k, &i) in null_rows.iter().enumerate() {
        basis.column_mut(k).copy_from(&v_t.row(i).transpose());
    }

    Some(NullspaceDecomposition { particular, basis })
}
