//! Single-step time integration of `dy/dt = f(y)`.
//!
//! The right-hand side is the same [`NonlinearSystem`] residual the
//! steady-state solvers drive to zero, so a steady state is a fixed point of
//! every scheme here.

use std::ops::Range;
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    error::{ ConfigError, SolveError },
    newton::{ NewtonConfig, NonlinearSystem, SolveResult, newton },
    refine::RefineConfig,
    utils::{ all_finite, array_step },
};

/// Time integration scheme.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScheme {
    /// `y + dt f(y)`.
    #[default]
    ForwardEuler,
    /// Classical fourth-order Runge-Kutta.
    Rk4,
    /// `y_new = y + dt f(y_new)`, solved by Newton iteration.
    BackwardEuler,
}

/// Settings for [`Simulation::evolve_with`][crate::simulation::Simulation::evolve_with].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolveConfig {
    pub scheme: TimeScheme,
    /// Newton settings for implicit schemes.
    pub newton: NewtonConfig,
    /// Refinement pass to run after the step, if any.
    pub refinement: Option<RefineConfig>,
}

impl EvolveConfig {
    pub fn new(scheme: TimeScheme) -> Self {
        Self { scheme, ..Self::default() }
    }
}

// residual of the backward Euler update, `f(y) - (y - y_old) / dt`
struct Implicit<'a, N: ?Sized> {
    rhs: &'a mut N,
    y_old: &'a nd::Array1<f64>,
    dt: f64,
}

impl<'a, N> NonlinearSystem for Implicit<'a, N>
where N: NonlinearSystem + ?Sized
{
    fn len(&self) -> usize { self.rhs.len() }

    fn residual(&mut self, y: &nd::Array1<f64>) -> SolveResult<nd::Array1<f64>> {
        let f = self.rhs.residual(y)?;
        Ok(nd::Zip::from(&f).and(y).and(self.y_old)
            .map_collect(|fk, yk, ok| fk - (yk - ok) / self.dt))
    }

    fn jacobian(&mut self, y: &nd::Array1<f64>, cols: Range<usize>)
        -> SolveResult<nd::Array2<f64>>
    {
        let mut jac = self.rhs.jacobian(y, cols.clone())?;
        for (c, k) in cols.enumerate() {
            jac[[k, c]] -= 1.0 / self.dt;
        }
        Ok(jac)
    }
}

/// Advance `y` by one step of size `dt`.
pub fn step<N>(
    rhs: &mut N,
    y: &nd::Array1<f64>,
    dt: f64,
    scheme: TimeScheme,
    newton_config: &NewtonConfig,
) -> SolveResult<nd::Array1<f64>>
where N: NonlinearSystem + ?Sized
{
    ConfigError::check_step(dt)?;
    let y_new = match scheme {
        TimeScheme::ForwardEuler => {
            let k1 = rhs.residual(y)?;
            array_step(y, dt, &k1)
        },
        TimeScheme::Rk4 => {
            let dth = dt / 2.0;
            let k1 = rhs.residual(y)?;
            let k2 = rhs.residual(&array_step(y, dth, &k1))?;
            let k3 = rhs.residual(&array_step(y, dth, &k2))?;
            let k4 = rhs.residual(&array_step(y, dt, &k3))?;
            let mut y_new = y.clone();
            nd::Zip::from(&mut y_new).and(&k1).and(&k2).and(&k3).and(&k4)
                .for_each(|yk, k1k, k2k, k3k, k4k| {
                    *yk += dt / 6.0 * (k1k + 2.0 * (k2k + k3k) + k4k);
                });
            y_new
        },
        TimeScheme::BackwardEuler => {
            let mut implicit = Implicit { rhs, y_old: y, dt };
            let (y_new, _) = newton(&mut implicit, y.clone(), newton_config, None)?;
            y_new
        },
    };
    all_finite(&y_new).then_some(y_new)
        .ok_or(SolveError::NonFinite { stage: "time step" })
}
