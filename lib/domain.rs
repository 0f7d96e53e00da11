//! The computational mesh: interior cells, ghost cells, coordinates, and the
//! per-cell values of every named variable.
//!
//! Rows of the value array are cells in coordinate order, with `ng` ghost rows
//! on either side of the `nx` interior rows; columns are variables in the order
//! given at construction. Interior cell `i` therefore lives at row `ng + i`.
//!
//! Coordinates are stored with the same shape as the values. Interior rows are
//! shared by every variable, but ghost coordinates belong to the boundary
//! condition of each variable: mirror images of the interior about the face,
//! except on periodic sides where they are the far-end cells shifted by the
//! domain length.

use ndarray as nd;
use crate::{
    bc::Side,
    derivatives::Stencil,
    error::{ ConfigError, LengthError },
    utils::array_diff,
};

/// One-dimensional cell-centered mesh with ghost cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    nx: usize,
    ng: usize,
    xmin: f64,
    xmax: f64,
    names: Vec<String>,
    x: nd::Array2<f64>,
    values: nd::Array2<f64>,
}

impl Domain {
    /// Create a uniform mesh of `nx` cells on `[xmin, xmax]` with `ng` ghost
    /// cells on each side and all values set to zero.
    ///
    /// Cell centers are placed at `xmin + (i + 1/2) (xmax - xmin) / nx`.
    pub fn new(nx: usize, ng: usize, extent: (f64, f64), variables: &[&str])
        -> Result<Self, ConfigError>
    {
        check_extent(extent)?;
        (nx > 0).then_some(()).ok_or(ConfigError::NoCells)?;
        let h = (extent.1 - extent.0) / nx as f64;
        let x: nd::Array1<f64>
            = (0..nx).map(|i| extent.0 + (i as f64 + 0.5) * h).collect();
        Self::from_coordinates(x, ng, extent, variables)
    }

    /// Create a mesh from explicit interior cell centers, which must be
    /// strictly increasing and lie strictly inside `extent`.
    pub fn from_coordinates(
        x: nd::Array1<f64>,
        ng: usize,
        extent: (f64, f64),
        variables: &[&str],
    ) -> Result<Self, ConfigError>
    {
        check_extent(extent)?;
        let nx = x.len();
        (nx > 0).then_some(()).ok_or(ConfigError::NoCells)?;
        check_ghosts(ng, nx)?;
        check_coordinates(&x, extent)?;
        (!variables.is_empty()).then_some(())
            .ok_or(ConfigError::NoVariables)?;
        let mut names: Vec<String> = Vec::with_capacity(variables.len());
        for var in variables.iter() {
            if names.iter().any(|n| n == var) {
                return Err(ConfigError::DuplicateVariable(var.to_string()));
            }
            names.push(var.to_string());
        }
        let nv = names.len();
        let mut domain = Self {
            nx,
            ng,
            xmin: extent.0,
            xmax: extent.1,
            names,
            x: nd::Array2::zeros((nx + 2 * ng, nv)),
            values: nd::Array2::zeros((nx + 2 * ng, nv)),
        };
        domain.set_coordinates(&x);
        Ok(domain)
    }

    // interior rows for every variable, mirrored ghosts until boundary
    // conditions say otherwise
    fn set_coordinates(&mut self, x: &nd::Array1<f64>) {
        let (ng, nx) = (self.ng, self.nx);
        self.x.slice_mut(nd::s![ng..ng + nx, ..])
            .assign(&x.view().insert_axis(nd::Axis(1)));
        let (ilo, ihi) = (self.ilo(), self.ihi());
        let (xmin, xmax) = (self.xmin, self.xmax);
        for mut col in self.x.columns_mut() {
            for k in 1..=ng {
                col[ilo - k] = 2.0 * xmin - col[ilo + k - 1];
                col[ihi + k] = 2.0 * xmax - col[ihi + 1 - k];
            }
        }
    }

    /// Number of interior cells.
    pub fn nx(&self) -> usize { self.nx }

    /// Number of ghost cells on each side.
    pub fn ng(&self) -> usize { self.ng }

    /// Number of variables.
    pub fn nv(&self) -> usize { self.names.len() }

    /// Total number of rows, ghosts included.
    pub fn len(&self) -> usize { self.nx + 2 * self.ng }

    /// Always `false`; a domain has at least one interior cell.
    pub fn is_empty(&self) -> bool { false }

    /// Row of the first interior cell.
    pub fn ilo(&self) -> usize { self.ng }

    /// Row of the last interior cell.
    pub fn ihi(&self) -> usize { self.ng + self.nx - 1 }

    /// Physical extent `(xmin, xmax)`.
    pub fn extent(&self) -> (f64, f64) { (self.xmin, self.xmax) }

    /// Variable names, in column order.
    pub fn variables(&self) -> &[String] { &self.names }

    /// Column of the variable `name`, if it exists.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub(crate) fn require_variable(&self, name: &str)
        -> Result<usize, ConfigError>
    {
        self.variable_index(name)
            .ok_or_else(|| ConfigError::UnknownVariable(name.to_string()))
    }

    /// Cell coordinates seen by variable `var`, ghosts included.
    ///
    /// *Panics if `var` is out of range*.
    pub fn x(&self, var: usize) -> nd::ArrayView1<'_, f64> {
        self.x.column(var)
    }

    /// Interior cell coordinates.
    pub fn interior_x(&self) -> nd::ArrayView1<'_, f64> {
        self.x.slice(nd::s![self.ilo()..=self.ihi(), 0])
    }

    /// Distances between neighboring interior cell centers (`nx - 1` values).
    pub fn spacing(&self) -> nd::Array1<f64> {
        array_diff(&self.interior_x())
    }

    /// All cell values, ghosts included, with shape `(nx + 2 ng, nv)`.
    pub fn values(&self) -> &nd::Array2<f64> { &self.values }

    /// Interior cell values with shape `(nx, nv)`.
    pub fn interior(&self) -> nd::ArrayView2<'_, f64> {
        self.values.slice(nd::s![self.ilo()..=self.ihi(), ..])
    }

    /// Mutable interior cell values with shape `(nx, nv)`.
    ///
    /// Ghost values are not updated; re-apply boundary conditions afterward.
    pub fn interior_mut(&mut self) -> nd::ArrayViewMut2<'_, f64> {
        let (ilo, ihi) = (self.ilo(), self.ihi());
        self.values.slice_mut(nd::s![ilo..=ihi, ..])
    }

    /// Value of variable `var` in interior cell `cell`.
    ///
    /// *Panics if either index is out of range*.
    pub fn value(&self, cell: usize, var: usize) -> f64 {
        self.values[[self.ng + cell, var]]
    }

    /// Set the value of variable `var` in interior cell `cell`.
    ///
    /// *Panics if either index is out of range*.
    pub fn set_value(&mut self, cell: usize, var: usize, value: f64) {
        self.values[[self.ng + cell, var]] = value;
    }

    /// Value of variable `var` in the `k`-th ghost cell (`k = 1..=ng`, counted
    /// outward) on `side`.
    ///
    /// *Panics if `k` is zero or greater than `ng`*.
    pub fn ghost(&self, side: Side, k: usize, var: usize) -> f64 {
        assert!(k >= 1 && k <= self.ng, "ghost index out of range");
        match side {
            Side::Left => self.values[[self.ilo() - k, var]],
            Side::Right => self.values[[self.ihi() + k, var]],
        }
    }

    /// Overwrite all interior values of one variable.
    pub fn set_variable<S>(&mut self, var: usize, values: &crate::Arr1<S>)
        -> Result<(), LengthError>
    where S: nd::Data<Elem = f64>
    {
        LengthError::check_len(values.len(), self.nx)?;
        let (ilo, ihi) = (self.ilo(), self.ihi());
        self.values.slice_mut(nd::s![ilo..=ihi, var]).assign(values);
        Ok(())
    }

    /// Mutable coordinates and values of variable `var`, ghosts included.
    pub(crate) fn columns_mut(&mut self, var: usize)
        -> (nd::ArrayViewMut1<'_, f64>, nd::ArrayViewMut1<'_, f64>)
    {
        (self.x.column_mut(var), self.values.column_mut(var))
    }

    /// The `2 nb + 1`-cell window centered on interior cell `cell`.
    ///
    /// *Panics if the window leaves the ghost layer*.
    pub fn stencil(&self, cell: usize, nb: usize) -> Stencil<'_> {
        assert!(nb <= self.ng, "stencil half-width exceeds ghost layer");
        let center = self.ng + cell;
        Stencil::new(
            self.x.slice(nd::s![center - nb..=center + nb, ..]),
            self.values.slice(nd::s![center - nb..=center + nb, ..]),
        )
    }

    /// Replace the interior mesh and values wholesale, as after a refinement
    /// pass. Ghost coordinates are mirrored and ghost values zeroed until
    /// boundary conditions are applied again.
    pub(crate) fn replace_interior(
        &mut self,
        x: nd::Array1<f64>,
        values: nd::Array2<f64>,
    ) -> Result<(), ConfigError>
    {
        let nx = x.len();
        (nx > 0).then_some(()).ok_or(ConfigError::NoCells)?;
        check_ghosts(self.ng, nx)?;
        check_coordinates(&x, (self.xmin, self.xmax))?;
        let nv = self.nv();
        let ng = self.ng;
        self.nx = nx;
        self.x = nd::Array2::zeros((nx + 2 * ng, nv));
        self.values = nd::Array2::zeros((nx + 2 * ng, nv));
        self.values.slice_mut(nd::s![ng..ng + nx, ..]).assign(&values);
        self.set_coordinates(&x);
        Ok(())
    }
}

fn check_extent(extent: (f64, f64)) -> Result<(), ConfigError> {
    (extent.0.is_finite() && extent.1.is_finite() && extent.0 < extent.1)
        .then_some(())
        .ok_or(ConfigError::BadExtent(extent.0, extent.1))
}

fn check_ghosts(ng: usize, nx: usize) -> Result<(), ConfigError> {
    (ng > 0).then_some(()).ok_or(ConfigError::NoGhosts)?;
    (ng <= nx).then_some(()).ok_or(ConfigError::TooManyGhosts { ng, nx })
}

fn check_coordinates(x: &nd::Array1<f64>, extent: (f64, f64))
    -> Result<(), ConfigError>
{
    let increasing = x.iter().zip(x.iter().skip(1)).all(|(a, b)| a < b);
    let inside = x.iter().all(|xk| extent.0 < *xk && *xk < extent.1);
    (increasing && inside).then_some(()).ok_or(ConfigError::BadCoordinates)
}
