//! Interpolation of cell values between meshes via Lagrange polynomials.
//!
//! ```
//! use ndarray as nd;
//! use splitfdm::interp::{ Interpolation, resample };
//!
//! let x: nd::Array1<f64> = nd::Array::linspace(0.0, 1.0, 6);
//! let y = x.mapv(|xk| xk.powi(3) - xk).insert_axis(nd::Axis(1));
//! let xnew = nd::array![0.1, 0.5, 0.9];
//! let ynew = resample(&x, &y, &xnew, Interpolation::Cubic).unwrap();
//! assert!(
//!     xnew.iter().zip(ynew.column(0))
//!         .all(|(xk, yk)| (yk - (xk.powi(3) - xk)).abs() < 1e-12)
//! );
//! ```

use ndarray as nd;
use num_traits::Num;
use serde::{ Deserialize, Serialize };
use crate::error::LengthError;

/// Compute the value of a sampled function via a Lagrange polynomial through
/// every sample.
pub fn lagrange<S, T, A>(
    data_x: &nd::ArrayBase<S, nd::Ix1>,
    data_y: &nd::ArrayBase<T, nd::Ix1>,
    x: A,
) -> Result<A, LengthError>
where
    S: nd::Data<Elem = A>,
    T: nd::Data<Elem = A>,
    A: Num + Copy
{
    LengthError::check(data_x, data_y)?;
    let res: A
        = data_x.iter().zip(data_y).enumerate()
        .map(|(j, (xj, yj))| {
            let xj = *xj;
            let inner
                = data_x.iter().enumerate()
                .filter(|(m, _)| *m != j)
                .map(|(_, xm)| (x - *xm) / (xj - *xm))
                .fold(A::one(), A::mul);
            *yj * inner
        })
        .fold(A::zero(), A::add);
    Ok(res)
}

/// Polynomial order used by [`resample`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Two-point linear interpolation.
    #[default]
    Linear,
    /// Four-point cubic Lagrange interpolation, falling back to fewer points
    /// near the ends of short meshes.
    Cubic,
}

impl Interpolation {
    fn points(&self) -> usize {
        match self {
            Self::Linear => 2,
            Self::Cubic => 4,
        }
    }
}

// index of the left end of the interval containing `x`, clamped to the data
fn bracket<S>(data_x: &crate::Arr1<S>, x: f64) -> usize
where S: nd::Data<Elem = f64>
{
    let n = data_x.len();
    let upper = data_x.as_slice()
        .map(|s| s.partition_point(|xk| *xk <= x))
        .unwrap_or_else(|| data_x.iter().take_while(|xk| **xk <= x).count());
    upper.saturating_sub(1).min(n.saturating_sub(2))
}

/// Interpolate every column of `values`, sampled at `data_x`, onto `x`.
///
/// `data_x` must be strictly increasing.
pub fn resample<S, T, U>(
    data_x: &crate::Arr1<S>,
    values: &crate::Arr2<T>,
    x: &crate::Arr1<U>,
    method: Interpolation,
) -> Result<nd::Array2<f64>, LengthError>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
    U: nd::Data<Elem = f64>,
{
    let n = data_x.len();
    LengthError::check_len(values.nrows(), n)?;
    let mut out: nd::Array2<f64> = nd::Array2::zeros((x.len(), values.ncols()));
    if n == 0 { return Ok(out); }
    if n == 1 {
        out.outer_iter_mut().for_each(|mut row| row.assign(&values.row(0)));
        return Ok(out);
    }
    let npts = method.points().min(n);
    for (xk, mut row) in x.iter().zip(out.outer_iter_mut()) {
        let i = bracket(data_x, *xk);
        // window of `npts` points centered on the bracketing interval
        let lo = (i + 1).saturating_sub(npts / 2).min(n - npts);
        let window_x = data_x.slice(nd::s![lo..lo + npts]);
        for (v, r) in row.iter_mut().enumerate() {
            let window_y = values.slice(nd::s![lo..lo + npts, v]);
            *r = lagrange(&window_x, &window_y, *xk)?;
        }
    }
    Ok(out)
}
