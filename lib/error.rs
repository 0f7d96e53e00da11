//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow]. Errors raised
//! by individual stages ([`ConfigError`], [`SolveError`], [`MeshError`]) all
//! convert into the crate-level [`FdmError`].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray as nd;
use thiserror::Error;
use crate::bc::Side;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        Self::check_len(a.len(), b.len())
    }

    pub(crate) fn check_len(na: usize, nb: usize) -> Result<(), Self> {
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned when a simulation, solver, or refinement pass is set up with
/// invalid parameters.
///
/// These are always detected eagerly, before any iteration takes place.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A domain must carry at least one variable.
    #[error("domain must have at least one variable")]
    NoVariables,

    /// Variable names must be unique.
    #[error("variable names must be unique; got duplicate {0:?}")]
    DuplicateVariable(String),

    /// A variable name was not found in the domain.
    #[error("unknown variable {0:?}")]
    UnknownVariable(String),

    /// A domain must have at least one interior cell.
    #[error("domain must have at least one interior cell")]
    NoCells,

    /// Returned when `xmin >= xmax` or either is not finite.
    #[error("domain extent must satisfy xmin < xmax; got [{0}, {1}]")]
    BadExtent(f64, f64),

    /// Interior coordinates must increase strictly and lie inside the extent.
    #[error("interior coordinates must be strictly increasing and inside the domain extent")]
    BadCoordinates,

    /// At least one ghost cell is needed on each side.
    #[error("ghost cell count must be at least 1")]
    NoGhosts,

    /// Ghost cells are filled by mirroring interior cells, so there can be no
    /// more of them than interior cells.
    #[error("ghost cell count {ng} exceeds the number of interior cells {nx}")]
    TooManyGhosts { ng: usize, nx: usize },

    /// The model's stencil does not fit inside the ghost layer.
    #[error("model requires a stencil half-width of {required} but the domain has {ng} ghost cells")]
    StencilTooWide { required: usize, ng: usize },

    /// An equation refers to a variable index the domain does not have.
    #[error("equation {equation:?} acts on variable {index} but the domain has {nv} variables")]
    EquationOutOfRange { equation: String, index: usize, nv: usize },

    /// Every variable needs at least one equation producing its residual.
    #[error("variable {0:?} is not governed by any equation")]
    UngovernedVariable(String),

    /// Both sides of every variable need a boundary condition.
    #[error("missing boundary condition for variable {var:?} on the {side} side")]
    MissingBoundary { var: String, side: Side },

    /// Explicit initial-condition arrays must match the interior size.
    #[error("initial condition for {var:?} has {got} values; expected {expected}")]
    InitialLength { var: String, got: usize, expected: usize },

    /// The split location must leave both blocks non-empty.
    #[error("split location must satisfy 0 < split_loc < {limit}; got {split_loc}")]
    BadSplit { split_loc: usize, limit: usize },

    /// Per-variable bounds must have one entry per variable.
    #[error("bounds must have one entry per variable; expected {expected}, got {got}")]
    BoundsLength { expected: usize, got: usize },

    /// Lower bound above upper bound.
    #[error("bounds for variable {index} are inverted: [{lower}, {upper}]")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },

    /// Returned when a non-positive tolerance is encountered.
    #[error("tolerance must be greater than 0; got {0}")]
    BadTolerance(f64),

    /// Returned when a zero iteration cap is encountered.
    #[error("maxiters must be greater than 0; got {0}")]
    BadMaxiters(usize),

    /// Returned when a step size is non-positive or not finite.
    #[error("step size must be positive and finite; got {0}")]
    BadStep(f64),

    /// Returned for inconsistent refinement settings.
    #[error("invalid refinement settings: {0}")]
    BadRefinement(&'static str),
}

impl ConfigError {
    pub(crate) fn check_tolerance(tolerance: f64) -> Result<(), Self> {
        (tolerance > 0.0 && tolerance.is_finite()).then_some(())
            .ok_or(Self::BadTolerance(tolerance))
    }

    pub(crate) fn check_maxiters(maxiters: usize) -> Result<(), Self> {
        (maxiters != 0).then_some(()).ok_or(Self::BadMaxiters(maxiters))
    }

    pub(crate) fn check_step(step: f64) -> Result<(), Self> {
        (step > 0.0 && step.is_finite()).then_some(())
            .ok_or(Self::BadStep(step))
    }
}

/// Returned from the Newton, split-Newton, and time-stepping routines.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The iteration cap was reached without meeting the tolerance.
    #[error("failed to converge after {iterations} iterations; last residual norm {residual_norm:.3e}")]
    ConvergenceFailure { iterations: usize, residual_norm: f64 },

    /// The (sub-)Jacobian could not be factored.
    #[error("singular or ill-conditioned Jacobian at iteration {iteration}")]
    NumericalSingularity { iteration: usize },

    /// A state component lies outside its bound box and the policy forbids
    /// clipping it.
    #[error("variable {var} in cell {cell} = {value} lies outside its bounds [{lower}, {upper}]")]
    BoundsViolation { cell: usize, var: usize, value: f64, lower: f64, upper: f64 },

    /// NaN or infinity appeared in the state.
    #[error("non-finite value encountered during {stage}")]
    NonFinite { stage: &'static str },

    /// [`ConfigError`]
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// [`LengthError`]
    #[error("array length error: {0}")]
    Length(#[from] LengthError),
}

/// Returned from adaptive mesh refinement.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A pass would leave fewer cells than allowed.
    #[error("mesh refinement would leave {cells} cells; at least {min_cells} are required")]
    Degenerate { cells: usize, min_cells: usize },

    /// The mesh kept changing between converged solves.
    #[error("mesh did not stabilize after {passes} refinement passes")]
    Unstable { passes: usize },

    /// [`ConfigError`]
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// [`LengthError`]
    #[error("array length error: {0}")]
    Length(#[from] LengthError),
}

/// Crate-level error returned by [`Simulation`][crate::simulation::Simulation]
/// operations.
#[derive(Debug, Error)]
pub enum FdmError {
    /// [`ConfigError`]
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// [`SolveError`]
    #[error("solver error: {0}")]
    Solve(#[from] SolveError),

    /// [`MeshError`]
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
}

pub type FdmResult<T> = Result<T, FdmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_helpers() {
        assert!(ConfigError::check_tolerance(1e-8).is_ok());
        assert!(matches!(
            ConfigError::check_tolerance(0.0),
            Err(ConfigError::BadTolerance(_)),
        ));
        assert!(ConfigError::check_tolerance(f64::NAN).is_err());
        assert!(matches!(
            ConfigError::check_maxiters(0),
            Err(ConfigError::BadMaxiters(0)),
        ));
        assert!(ConfigError::check_step(-0.1).is_err());
        assert!(LengthError::check_len(3, 4).is_err());
    }

    #[test]
    fn errors_compose() {
        let err: FdmError = SolveError::from(ConfigError::NoCells).into();
        assert!(matches!(err, FdmError::Solve(SolveError::Config(_))));
        let msg = SolveError::ConvergenceFailure {
            iterations: 12,
            residual_norm: 1.5e-3,
        }
        .to_string();
        assert!(msg.contains("12 iterations"));
        assert!(msg.contains("1.500e-3"));
    }
}
