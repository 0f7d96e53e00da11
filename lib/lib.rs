//! Provides a one-dimensional finite-difference framework for the steady-state
//! and transient solution of systems of partial differential equations on a
//! cell-centered mesh with ghost cells.
//!
//! Provides implementations for the following numerical routines:
//! - Steady state:
//!     - Damped Newton-Raphson on the full discrete system (optional Armijo
//!       line search and pseudo-transient continuation)
//!     - Split Newton: block Gauss-Seidel over an outer and inner block of
//!       variables, with Newton sub-iterations on each block
//! - Time-dependent:
//!     - Forward Euler
//!     - Classical fourth-order Runge-Kutta
//!     - Backward Euler (solved with the Newton routine above)
//! - Mesh:
//!     - Gradient/curvature-driven adaptive refinement and coarsening with
//!       linear or cubic reinterpolation
//!
//! Jacobians are either supplied by the model or approximated with banded
//! finite differences. See [`docs`] for theoretical background.
//!
//! ```
//! use splitfdm::{
//!     bc::{ BoundaryCondition as BC, BoundarySpec },
//!     domain::Domain,
//!     equations::Diffusion,
//!     ic::{ InitialCondition as IC, InitialConditions },
//!     model::EquationModel,
//!     simulation::{ Simulation, SteadyStateConfig },
//! };
//!
//! let domain = Domain::new(16, 1, (0.0, 1.0), &["u"]).unwrap();
//! let model = EquationModel::new("heat")
//!     .with(Diffusion::new(1.0, vec![0]));
//! let ics = InitialConditions::new().set("u", IC::Constant(0.0));
//! let bcs = BoundarySpec::new()
//!     .pair("u", BC::Dirichlet(1.0), BC::Dirichlet(3.0));
//! let mut sim = Simulation::new(domain, model, &ics, &bcs).unwrap();
//! let res = sim.steady_state(&SteadyStateConfig::default()).unwrap();
//! assert!(res.residual_norm < 1e-8);
//! // steady heat conduction is linear between the boundary values
//! let u = sim.domain().interior().column(0).to_owned();
//! let x = sim.domain().interior_x().to_owned();
//! assert!(
//!     u.iter().zip(&x)
//!         .all(|(uk, xk)| (uk - (1.0 + 2.0 * xk)).abs() < 1e-8)
//! );
//! ```

pub mod error;
pub mod layout;
pub mod domain;
pub mod bc;
pub mod ic;
pub mod derivatives;
pub mod model;
pub mod equations;
pub mod interp;
pub mod linalg;
pub mod newton;
pub mod split_newton;
pub mod refine;
pub mod timestep;
pub mod simulation;
pub mod utils;

pub mod docs;

pub(crate) const DEF_TOLERANCE: f64 = 1e-8;
pub(crate) const DEF_MAXITERS: usize = 100;

pub type Arr1<S> = ndarray::ArrayBase<S, ndarray::Ix1>;
pub type Arr2<S> = ndarray::ArrayBase<S, ndarray::Ix2>;
