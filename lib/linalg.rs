//! Dense linear solves for Newton updates.

use std::ops::Range;
use nalgebra::{ DMatrix, DVector, LU };
use ndarray as nd;
use crate::{ Arr1, Arr2 };

/// Pivots smaller than this fraction of the largest pivot mark a matrix as
/// numerically singular.
pub const PIVOT_RTOL: f64 = 1e-13;

/// Solve `a x = b` by LU decomposition with partial pivoting.
///
/// Returns `None` if `a` is not square, its size does not match `b`, it is
/// singular or ill-conditioned to within [`PIVOT_RTOL`], or the solution is not
/// finite.
pub fn solve_dense<S, T>(a: &Arr2<S>, b: &Arr1<T>) -> Option<nd::Array1<f64>>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    let n = b.len();
    if a.dim() != (n, n) { return None; }
    if n == 0 { return Some(nd::Array1::zeros(0)); }
    let m = DMatrix::from_fn(n, n, |i, j| a[[i, j]]);
    let rhs = DVector::from_iterator(n, b.iter().copied());
    let lu = LU::new(m);
    let pivots: Vec<f64> = lu.u().diagonal().iter().map(|p| p.abs()).collect();
    let pmax = pivots.iter().copied().fold(0.0_f64, f64::max);
    let pmin = pivots.iter().copied().fold(f64::INFINITY, f64::min);
    if !(pmax > 0.0) || pmin <= PIVOT_RTOL * pmax { return None; }
    let x = lu.solve(&rhs)?;
    x.iter().all(|xk| xk.is_finite())
        .then(|| x.iter().copied().collect())
}

/// Copy of the sub-matrix of `a` on the given rows and columns, preserving
/// their order; used to pull the diagonal block of a Jacobian for block
/// updates.
pub fn block<S>(a: &Arr2<S>, rows: Range<usize>, cols: Range<usize>)
    -> nd::Array2<f64>
where S: nd::Data<Elem = f64>
{
    a.slice(nd::s![rows, cols]).to_owned()
}
