//! Residual models.
//!
//! A [`Model`] maps the values in a [`Stencil`] to the residual of every
//! variable at the stencil's center cell. The solvers treat it as a black box
//! and only ever call it through [`Model::residual`] and
//! [`Model::cell_residual`]; an analytic Jacobian is optional.
//!
//! Most models are assembled from independent [`Equation`] terms with
//! [`EquationModel`], whose residual is the sum of its terms.

use ndarray as nd;
use crate::{
    derivatives::Stencil,
    domain::Domain,
    error::ConfigError,
};

/// A single additive contribution to the residual.
pub trait Equation: Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    /// Indices of the variables whose residuals this term contributes to.
    fn variables(&self) -> &[usize];

    /// Number of neighbor cells required on each side.
    fn stencil_width(&self) -> usize { 1 }

    /// Add this term's contribution at the center of `st` into `out`, which
    /// has one entry per variable.
    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>);
}

/// Residual function over a [`Domain`].
pub trait Model: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Number of neighbor cells required on each side.
    fn stencil_width(&self) -> usize { 1 }

    /// Check the model against the domain's variable list.
    fn check(&self, _variables: &[String]) -> Result<(), ConfigError> { Ok(()) }

    /// Write the residual of every variable at the center of `st` into `out`.
    fn cell_residual(&self, st: &Stencil, out: nd::ArrayViewMut1<f64>);

    /// Analytic Jacobian of the flattened interior residual with respect to
    /// the flattened interior state, both in cell-major order, for the
    /// current state and boundary values. `None` selects the
    /// finite-difference approximation.
    fn jacobian(&self, _domain: &Domain) -> Option<nd::Array2<f64>> { None }

    /// Residuals of every interior cell, shape `(nx, nv)`.
    ///
    /// Ghost cells must already hold values consistent with the boundary
    /// conditions.
    fn residual(&self, domain: &Domain) -> nd::Array2<f64> {
        let mut out: nd::Array2<f64> = nd::Array2::zeros((domain.nx(), domain.nv()));
        let nb = self.stencil_width();
        out.outer_iter_mut().enumerate()
            .for_each(|(cell, row)| {
                self.cell_residual(&domain.stencil(cell, nb), row);
            });
        out
    }
}

/// [`Model`] formed by summing a list of [`Equation`]s.
pub struct EquationModel {
    name: String,
    equations: Vec<Box<dyn Equation>>,
}

impl EquationModel {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), equations: Vec::new() }
    }

    /// Add a term.
    pub fn with<E>(mut self, equation: E) -> Self
    where E: Equation + 'static
    {
        self.equations.push(Box::new(equation));
        self
    }

    /// Add a boxed term.
    pub fn push(&mut self, equation: Box<dyn Equation>) {
        self.equations.push(equation);
    }

    /// Number of terms.
    pub fn len(&self) -> usize { self.equations.len() }

    /// Return `true` if there are no terms.
    pub fn is_empty(&self) -> bool { self.equations.is_empty() }
}

impl std::fmt::Debug for EquationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.equations.iter().map(|e| e.name()).collect();
        f.debug_struct("EquationModel")
            .field("name", &self.name)
            .field("equations", &names)
            .finish()
    }
}

impl Model for EquationModel {
    fn name(&self) -> &str { &self.name }

    fn stencil_width(&self) -> usize {
        self.equations.iter()
            .map(|e| e.stencil_width())
            .max()
            .unwrap_or(1)
    }

    fn check(&self, variables: &[String]) -> Result<(), ConfigError> {
        let nv = variables.len();
        let mut governed = vec![false; nv];
        for eq in self.equations.iter() {
            for &index in eq.variables().iter() {
                (index < nv).then_some(())
                    .ok_or_else(|| ConfigError::EquationOutOfRange {
                        equation: eq.name().to_string(),
                        index,
                        nv,
                    })?;
                governed[index] = true;
            }
        }
        governed.iter().zip(variables)
            .find(|(g, _)| !**g)
            .map_or(Ok(()), |(_, name)| {
                Err(ConfigError::UngovernedVariable(name.clone()))
            })
    }

    fn cell_residual(&self, st: &Stencil, mut out: nd::ArrayViewMut1<f64>) {
        out.fill(0.0);
        self.equations.iter()
            .for_each(|eq| { eq.residual(st, &mut out); });
    }
}
