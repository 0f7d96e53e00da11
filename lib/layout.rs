//! Mapping between per-cell variable values and the flat vectors the
//! nonlinear solvers operate on.
//!
//! Two orderings are supported:
//! - cell-major, where all variables of cell 0 come first, then cell 1, etc.;
//! - split, where variables `0..s` of every cell form a leading (outer) block
//!   and variables `s..nv` of every cell form a trailing (inner) block.
//!
//! ```
//! use splitfdm::layout::StateLayout;
//!
//! // 3 cells, 3 variables, split after the first variable
//! let layout = StateLayout::Split(1);
//! assert_eq!(layout.index(0, 0, 3, 3), 0);
//! assert_eq!(layout.index(2, 0, 3, 3), 2);
//! assert_eq!(layout.index(0, 1, 3, 3), 3);
//! assert_eq!(layout.index(1, 2, 3, 3), 6);
//! assert_eq!(layout.cut(3), Some(3));
//! ```

use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    Arr2,
    error::{ ConfigError, LengthError, SolveError },
};

/// Ordering of the flattened interior state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StateLayout {
    /// All variables of a cell are contiguous.
    #[default]
    CellMajor,
    /// Variables before the given index form the outer block, the rest the
    /// inner block.
    Split(usize),
}

impl StateLayout {
    /// Position in the flat vector of variable `var` in interior cell `cell`.
    pub fn index(&self, cell: usize, var: usize, nx: usize, nv: usize)
        -> usize
    {
        match *self {
            Self::CellMajor => cell * nv + var,
            Self::Split(s) if var < s => cell * s + var,
            Self::Split(s) => nx * s + cell * (nv - s) + (var - s),
        }
    }

    /// Inverse of [`Self::index`]: the `(cell, var)` pair stored at `k`.
    pub fn position(&self, k: usize, nx: usize, nv: usize) -> (usize, usize) {
        match *self {
            Self::CellMajor => (k / nv, k % nv),
            Self::Split(s) if k < nx * s => (k / s, k % s),
            Self::Split(s) => {
                let j = k - nx * s;
                (j / (nv - s), s + j % (nv - s))
            },
        }
    }

    /// Index into the flat vector dividing the outer and inner blocks, if any.
    pub fn cut(&self, nx: usize) -> Option<usize> {
        match *self {
            Self::CellMajor => None,
            Self::Split(s) => Some(nx * s),
        }
    }

    /// Check that a split leaves both blocks non-empty.
    pub fn check(&self, nv: usize) -> Result<(), ConfigError> {
        match *self {
            Self::CellMajor => Ok(()),
            Self::Split(s) => {
                (s > 0 && s < nv).then_some(())
                    .ok_or(ConfigError::BadSplit { split_loc: s, limit: nv })
            },
        }
    }

    /// Flatten an `(nx, nv)` array of interior values.
    pub fn flatten<S>(&self, values: &Arr2<S>) -> nd::Array1<f64>
    where S: nd::Data<Elem = f64>
    {
        let (nx, nv) = values.dim();
        let mut flat: nd::Array1<f64> = nd::Array1::zeros(nx * nv);
        for ((cell, var), &v) in values.indexed_iter() {
            flat[self.index(cell, var, nx, nv)] = v;
        }
        flat
    }

    /// Scatter a flat vector back into an `(nx, nv)` array of interior
    /// values.
    pub fn unflatten<S, T>(&self, flat: &crate::Arr1<S>, values: &mut Arr2<T>)
        -> Result<(), LengthError>
    where
        S: nd::Data<Elem = f64>,
        T: nd::DataMut<Elem = f64>,
    {
        let (nx, nv) = values.dim();
        LengthError::check_len(flat.len(), nx * nv)?;
        for ((cell, var), v) in values.indexed_iter_mut() {
            *v = flat[self.index(cell, var, nx, nv)];
        }
        Ok(())
    }

    /// Permute a cell-major square matrix (e.g. an analytic Jacobian) into
    /// this ordering.
    pub fn permute_matrix<S>(&self, a: &Arr2<S>, nx: usize, nv: usize)
        -> nd::Array2<f64>
    where S: nd::Data<Elem = f64>
    {
        if *self == Self::CellMajor { return a.to_owned(); }
        let n = nx * nv;
        let map: Vec<usize>
            = (0..n)
            .map(|k| self.index(k / nv, k % nv, nx, nv))
            .collect();
        let mut out: nd::Array2<f64> = nd::Array2::zeros((n, n));
        for ((i, j), &aij) in a.indexed_iter() {
            out[[map[i], map[j]]] = aij;
        }
        out
    }
}

/// Per-variable admissible ranges, given as a list of lower bounds and a list
/// of upper bounds (one entry per variable each).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableBounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl VariableBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// Check the bounds against a variable count.
    pub fn check(&self, nv: usize) -> Result<(), ConfigError> {
        for len in [self.lower.len(), self.upper.len()] {
            (len == nv).then_some(())
                .ok_or(ConfigError::BoundsLength { expected: nv, got: len })?;
        }
        self.lower.iter().zip(&self.upper).enumerate()
            .try_for_each(|(index, (&lower, &upper))| {
                (lower <= upper).then_some(())
                    .ok_or(ConfigError::InvertedBounds { index, lower, upper })
            })
    }

    /// Extend the per-variable bounds to every component of a flat state
    /// vector in the given ordering.
    pub fn extend(&self, layout: StateLayout, nx: usize) -> StateBounds {
        let nv = self.lower.len();
        let mut lower: nd::Array1<f64> = nd::Array1::zeros(nx * nv);
        let mut upper: nd::Array1<f64> = nd::Array1::zeros(nx * nv);
        for cell in 0..nx {
            for var in 0..nv {
                let k = layout.index(cell, var, nx, nv);
                lower[k] = self.lower[var];
                upper[k] = self.upper[var];
            }
        }
        StateBounds { lower, upper, layout, nx, nv }
    }
}

/// Component-wise bound box on a flat state vector.
#[derive(Clone, Debug, PartialEq)]
pub struct StateBounds {
    pub lower: nd::Array1<f64>,
    pub upper: nd::Array1<f64>,
    layout: StateLayout,
    nx: usize,
    nv: usize,
}

impl StateBounds {
    /// Number of components.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize { self.lower.len() }

    /// Return `true` if every component of `x` lies inside the box.
    pub fn contains<S>(&self, x: &crate::Arr1<S>) -> bool
    where S: nd::Data<Elem = f64>
    {
        nd::Zip::from(x).and(&self.lower).and(&self.upper)
            .all(|&xk, &lo, &hi| lo <= xk && xk <= hi)
    }

    /// Project `x` onto the box in place.
    pub fn clip<S>(&self, x: &mut crate::Arr1<S>)
    where S: nd::DataMut<Elem = f64>
    {
        nd::Zip::from(x).and(&self.lower).and(&self.upper)
            .for_each(|xk, &lo, &hi| { *xk = xk.clamp(lo, hi); });
    }

    /// Largest `alpha` in `[0, 1]` such that `x + alpha * dx` stays inside the
    /// box, assuming `x` already does.
    pub fn max_step<S, T>(&self, x: &crate::Arr1<S>, dx: &crate::Arr1<T>)
        -> f64
    where
        S: nd::Data<Elem = f64>,
        T: nd::Data<Elem = f64>,
    {
        let mut alpha: f64 = 1.0;
        nd::Zip::from(x).and(dx).and(&self.lower).and(&self.upper)
            .for_each(|&xk, &dk, &lo, &hi| {
                if dk > 0.0 && xk + dk > hi {
                    alpha = alpha.min((hi - xk) / dk);
                } else if dk < 0.0 && xk + dk < lo {
                    alpha = alpha.min((lo - xk) / dk);
                }
            });
        alpha.clamp(0.0, 1.0)
    }

    /// First component of `x` outside the box, if any, as the violation it
    /// represents.
    pub(crate) fn first_violation<S>(&self, x: &crate::Arr1<S>)
        -> Option<SolveError>
    where S: nd::Data<Elem = f64>
    {
        x.iter().zip(&self.lower).zip(&self.upper).enumerate()
            .find(|(_, ((&xk, &lo), &hi))| xk < lo || xk > hi)
            .map(|(k, ((&value, &lower), &upper))| {
                let (cell, var) = self.layout.position(k, self.nx, self.nv);
                SolveError::BoundsViolation { cell, var, value, lower, upper }
            })
    }
}
