//! High-level driver tying a [`Domain`], a [`Model`], and boundary conditions
//! together.
//!
//! A [`Simulation`] owns its domain for its whole lifetime. Ghost cells are
//! refilled after every change to the interior, so residuals always see a
//! consistent virtual field. The two entry points are
//! - [`Simulation::evolve`], a single fixed-size time step, and
//! - [`Simulation::steady_state`], a Newton or split-Newton solve, optionally
//!   alternated with refinement passes until the mesh stops changing.
//!
//! ```
//! use splitfdm::{
//!     bc::{ BoundaryCondition as BC, BoundarySpec },
//!     domain::Domain,
//!     equations::{ Diffusion, Exchange },
//!     ic::{ InitialCondition as IC, InitialConditions },
//!     model::EquationModel,
//!     simulation::{ Simulation, SteadyStateConfig },
//!     split_newton::SplitConfig,
//! };
//!
//! let domain = Domain::new(12, 1, (0.0, 1.0), &["a", "b"]).unwrap();
//! let model = EquationModel::new("pair")
//!     .with(Diffusion::new(0.5, vec![0, 1]))
//!     .with(Exchange::new(2.0, 0, 1));
//! let ics = InitialConditions::new()
//!     .set("a", IC::Constant(1.0))
//!     .set("b", IC::Constant(0.0));
//! let bcs = BoundarySpec::new()
//!     .pair("a", BC::Dirichlet(1.0), BC::Neumann(0.0))
//!     .pair("b", BC::Neumann(0.0), BC::Dirichlet(0.0));
//! let mut sim = Simulation::new(domain, model, &ics, &bcs).unwrap();
//! let config = SteadyStateConfig {
//!     split: Some(SplitConfig::new(1)),
//!     ..SteadyStateConfig::default()
//! };
//! let res = sim.steady_state(&config).unwrap();
//! assert!(res.residual_norm < config.newton.tolerance);
//! ```

use std::ops::Range;
use log::{ debug, info };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    bc::{ Boundaries, BoundarySpec },
    domain::Domain,
    error::{ ConfigError, FdmResult, LengthError, MeshError, SolveError },
    ic::InitialConditions,
    layout::{ StateLayout, VariableBounds },
    model::Model,
    newton::{ Convergence, NewtonConfig, NonlinearSystem, SolveResult, newton },
    refine::{ RefineConfig, RefineReport, refine },
    split_newton::{ SplitConfig, split_newton },
    timestep::{ EvolveConfig, step },
};

/// Settings for [`Simulation::steady_state`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyStateConfig {
    pub newton: NewtonConfig,
    /// Use split Newton with this partition instead of full Newton.
    pub split: Option<SplitConfig>,
    /// Admissible range of each variable.
    pub bounds: Option<VariableBounds>,
    /// Alternate converged solves with refinement passes.
    pub refinement: Option<RefineConfig>,
    /// Maximum number of refinement passes before the mesh is declared
    /// unstable.
    pub max_refinement_passes: usize,
}

impl Default for SteadyStateConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            split: None,
            bounds: None,
            refinement: None,
            max_refinement_passes: 10,
        }
    }
}

impl SteadyStateConfig {
    /// Check all settings against a variable count.
    pub fn check(&self, nv: usize) -> Result<(), ConfigError> {
        self.newton.check()?;
        if let Some(split) = self.split.as_ref() {
            StateLayout::Split(split.split_loc).check(nv)?;
            split.check()?;
        }
        if let Some(bounds) = self.bounds.as_ref() { bounds.check(nv)?; }
        if let Some(refinement) = self.refinement.as_ref() {
            refinement.check()?;
            ConfigError::check_maxiters(self.max_refinement_passes)?;
        }
        Ok(())
    }

    fn layout(&self) -> StateLayout {
        self.split.as_ref()
            .map(|s| StateLayout::Split(s.split_loc))
            .unwrap_or_default()
    }
}

/// Outcome of a successful [`Simulation::steady_state`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SteadyState {
    /// Total number of Newton updates over all solves.
    pub iterations: usize,
    /// Residual norm at the end of the last solve.
    pub residual_norm: f64,
    /// Number of refinement passes performed.
    pub refinement_passes: usize,
    /// Number of interior cells of the final mesh.
    pub cells: usize,
}

/// The discretized residual of a model on a domain, seen as a nonlinear
/// system in the unknown interior values.
///
/// Every evaluation writes the given state into the domain and refills the
/// ghost cells.
pub struct DiscreteSystem<'a> {
    domain: &'a mut Domain,
    model: &'a dyn Model,
    boundaries: &'a Boundaries,
    layout: StateLayout,
}

impl<'a> DiscreteSystem<'a> {
    pub fn new(
        domain: &'a mut Domain,
        model: &'a dyn Model,
        boundaries: &'a Boundaries,
        layout: StateLayout,
    ) -> Self
    {
        Self { domain, model, boundaries, layout }
    }

    /// The flattened current interior state.
    pub fn state(&self) -> nd::Array1<f64> {
        self.layout.flatten(&self.domain.interior())
    }

    fn load(&mut self, x: &nd::Array1<f64>) -> SolveResult<()> {
        self.layout.unflatten(x, &mut self.domain.interior_mut())?;
        self.boundaries.apply(self.domain);
        Ok(())
    }

    // finite-difference columns; only the cells whose stencil can see the
    // perturbed cell, directly or through a ghost cell, are re-evaluated
    fn fd_jacobian(&mut self, cols: Range<usize>) -> nd::Array2<f64> {
        let nx = self.domain.nx();
        let nv = self.domain.nv();
        let ng = self.domain.ng();
        let nb = self.model.stencil_width();
        let base = self.model.residual(self.domain);
        let mut jac: nd::Array2<f64> = nd::Array2::zeros((nx * nv, cols.len()));
        let mut rcell: nd::Array1<f64> = nd::Array1::zeros(nv);
        let sqrt_eps = f64::EPSILON.sqrt();
        for (c, k) in cols.enumerate() {
            let (cell, var) = self.layout.position(k, nx, nv);
            let saved = self.domain.values().column(var).to_owned();
            let xk = self.domain.value(cell, var);
            let xp = xk + sqrt_eps * xk.abs().max(1.0);
            let h = xp - xk;
            self.domain.set_value(cell, var, xp);
            self.boundaries.apply_variable(self.domain, var);

            let mut affected = vec![false; nx];
            let lo = cell.saturating_sub(nb);
            let hi = (cell + nb).min(nx - 1);
            affected[lo..=hi].iter_mut().for_each(|a| { *a = true; });
            let column = self.domain.values().column(var);
            for g in 1..=ng.min(nb) {
                let left = ng - g;
                if column[left] != saved[left] {
                    affected[..=(nb - g).min(nx - 1)].iter_mut()
                        .for_each(|a| { *a = true; });
                }
                let right = ng + nx - 1 + g;
                if column[right] != saved[right] {
                    affected[nx - 1 - (nb - g).min(nx - 1)..].iter_mut()
                        .for_each(|a| { *a = true; });
                }
            }

            for i in (0..nx).filter(|&i| affected[i]) {
                self.model.cell_residual(&self.domain.stencil(i, nb), rcell.view_mut());
                for v in 0..nv {
                    let d = (rcell[v] - base[[i, v]]) / h;
                    if d != 0.0 {
                        jac[[self.layout.index(i, v, nx, nv), c]] = d;
                    }
                }
            }

            let (_, mut col) = self.domain.columns_mut(var);
            col.assign(&saved);
        }
        jac
    }
}

impl<'a> NonlinearSystem for DiscreteSystem<'a> {
    fn len(&self) -> usize { self.domain.nx() * self.domain.nv() }

    fn residual(&mut self, x: &nd::Array1<f64>) -> SolveResult<nd::Array1<f64>> {
        self.load(x)?;
        let r = self.model.residual(self.domain);
        Ok(self.layout.flatten(&r))
    }

    fn jacobian(&mut self, x: &nd::Array1<f64>, cols: Range<usize>)
        -> SolveResult<nd::Array2<f64>>
    {
        self.load(x)?;
        let n = self.len();
        if let Some(jac) = self.model.jacobian(self.domain) {
            LengthError::check_len(jac.nrows(), n)?;
            LengthError::check_len(jac.ncols(), n)?;
            let jac = self.layout
                .permute_matrix(&jac, self.domain.nx(), self.domain.nv());
            return Ok(jac.slice(nd::s![.., cols]).to_owned());
        }
        Ok(self.fd_jacobian(cols))
    }
}

/// A model, its domain, and its boundary conditions.
pub struct Simulation {
    domain: Domain,
    model: Box<dyn Model>,
    boundaries: Boundaries,
    time: f64,
}

impl Simulation {
    /// Set up a simulation, validating the model and boundary conditions
    /// against the domain and applying the initial conditions.
    pub fn new<M>(
        domain: Domain,
        model: M,
        ics: &InitialConditions,
        bcs: &BoundarySpec,
    ) -> Result<Self, ConfigError>
    where M: Model + 'static
    {
        Self::from_boxed(domain, Box::new(model), ics, bcs)
    }

    /// Like [`Self::new`], for an already boxed model.
    pub fn from_boxed(
        mut domain: Domain,
        model: Box<dyn Model>,
        ics: &InitialConditions,
        bcs: &BoundarySpec,
    ) -> Result<Self, ConfigError>
    {
        model.check(domain.variables())?;
        let required = model.stencil_width();
        (required <= domain.ng()).then_some(())
            .ok_or(ConfigError::StencilTooWide { required, ng: domain.ng() })?;
        let boundaries = bcs.resolve(domain.variables())?;
        ics.apply(&mut domain)?;
        boundaries.apply(&mut domain);
        debug!(
            "simulation: model {:?} on {} cells x {} variables",
            model.name(), domain.nx(), domain.nv(),
        );
        Ok(Self { domain, model, boundaries, time: 0.0 })
    }

    pub fn domain(&self) -> &Domain { &self.domain }

    pub fn model(&self) -> &dyn Model { self.model.as_ref() }

    pub fn boundaries(&self) -> &Boundaries { &self.boundaries }

    /// Simulated time accumulated by [`Self::evolve`].
    pub fn time(&self) -> f64 { self.time }

    /// Overwrite the interior values of a variable and refill ghost cells.
    pub fn set_variable<S>(&mut self, name: &str, values: &crate::Arr1<S>)
        -> FdmResult<()>
    where S: nd::Data<Elem = f64>
    {
        let var = self.domain.require_variable(name)?;
        self.domain.set_variable(var, values).map_err(SolveError::from)?;
        self.apply_bc();
        Ok(())
    }

    /// Refill every ghost cell from the interior.
    pub fn apply_bc(&mut self) {
        self.boundaries.apply(&mut self.domain);
    }

    /// Residual of every interior cell, shape `(nx, nv)`.
    pub fn residuals(&mut self) -> nd::Array2<f64> {
        self.apply_bc();
        self.model.residual(&self.domain)
    }

    /// Euclidean norm of the full residual.
    pub fn residual_norm(&mut self) -> f64 {
        let r = self.residuals();
        r.iter().map(|rk| rk * rk).sum::<f64>().sqrt()
    }

    /// View the simulation as a nonlinear system in the given ordering.
    pub fn system(&mut self, layout: StateLayout) -> DiscreteSystem<'_> {
        DiscreteSystem::new(
            &mut self.domain,
            self.model.as_ref(),
            &self.boundaries,
            layout,
        )
    }

    /// Advance by one forward Euler step of size `dt`.
    pub fn evolve(&mut self, dt: f64) -> FdmResult<()> {
        self.evolve_with(dt, &EvolveConfig::default()).map(|_| ())
    }

    /// Advance by one step of size `dt` with the given scheme, then run a
    /// refinement pass if one is configured.
    pub fn evolve_with(&mut self, dt: f64, config: &EvolveConfig)
        -> FdmResult<Option<RefineReport>>
    {
        if let Some(rc) = config.refinement.as_ref() { rc.check()?; }
        self.apply_bc();
        let y0 = StateLayout::CellMajor.flatten(&self.domain.interior());
        let mut sys = self.system(StateLayout::CellMajor);
        let stepped = step(&mut sys, &y0, dt, config.scheme, &config.newton);
        let y = match stepped {
            Ok(y) => y,
            Err(err) => {
                self.restore(&y0, StateLayout::CellMajor)?;
                return Err(err.into());
            },
        };
        self.restore(&y, StateLayout::CellMajor)?;
        self.time += dt;
        debug!("evolve: t = {:.6e}", self.time);
        config.refinement.as_ref()
            .map(|rc| self.refine(rc))
            .transpose()
    }

    /// Run one refinement pass and refill ghost cells.
    pub fn refine(&mut self, config: &RefineConfig) -> FdmResult<RefineReport> {
        let report = refine(&mut self.domain, config)?;
        self.apply_bc();
        Ok(report)
    }

    fn restore(&mut self, x: &nd::Array1<f64>, layout: StateLayout)
        -> Result<(), SolveError>
    {
        layout.unflatten(x, &mut self.domain.interior_mut())?;
        self.apply_bc();
        Ok(())
    }

    fn solve_once(&mut self, config: &SteadyStateConfig)
        -> Result<Convergence, SolveError>
    {
        self.apply_bc();
        let layout = config.layout();
        let nx = self.domain.nx();
        let bounds = config.bounds.as_ref().map(|b| b.extend(layout, nx));
        let x0 = layout.flatten(&self.domain.interior());
        let mut sys = self.system(layout);
        let result = match (config.split.as_ref(), layout.cut(nx)) {
            (Some(split), Some(cut)) => {
                split_newton(
                    &mut sys, x0.clone(), cut, split, &config.newton, bounds.as_ref())
            },
            _ => newton(&mut sys, x0.clone(), &config.newton, bounds.as_ref()),
        };
        match result {
            Ok((x, conv)) => {
                self.restore(&x, layout)?;
                Ok(conv)
            },
            Err(err) => {
                self.restore(&x0, layout)?;
                Err(err)
            },
        }
    }

    /// Drive the residual to zero, alternating with refinement passes if
    /// configured until a pass leaves the mesh unchanged.
    ///
    /// On a solver failure the interior state is reset to what it was before
    /// the failing solve.
    pub fn steady_state(&mut self, config: &SteadyStateConfig)
        -> FdmResult<SteadyState>
    {
        config.check(self.domain.nv())?;
        let mut iterations: usize = 0;
        let mut refinement_passes: usize = 0;
        loop {
            let conv = self.solve_once(config)?;
            iterations += conv.iterations;
            let done = SteadyState {
                iterations,
                residual_norm: conv.residual_norm,
                refinement_passes,
                cells: self.domain.nx(),
            };
            let Some(rc) = config.refinement.as_ref() else {
                info!(
                    "steady state: {} updates, |r| = {:.3e}",
                    iterations, conv.residual_norm,
                );
                return Ok(done);
            };
            if refinement_passes >= config.max_refinement_passes {
                return Err(MeshError::Unstable { passes: refinement_passes }.into());
            }
            let report = self.refine(rc)?;
            refinement_passes += 1;
            if report.is_unchanged() {
                info!(
                    "steady state: {} updates over {} refinement passes, \
                    {} cells, |r| = {:.3e}",
                    iterations, refinement_passes, done.cells, conv.residual_norm,
                );
                return Ok(SteadyState { refinement_passes, ..done });
            }
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("model", &self.model.name())
            .field("domain", &self.domain)
            .field("time", &self.time)
            .finish()
    }
}
