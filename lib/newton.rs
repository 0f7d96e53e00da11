//! Damped Newton-Raphson iteration for `f(x) = 0`.
//!
//! Each update solves
//! ```text
//! (I / Δτ - J) δx = f(x),    J = ∂f/∂x
//! ```
//! which reduces to the plain Newton step `J δx = -f(x)` when pseudo-transient
//! continuation is off (`Δτ → ∞`). The step is then scaled by a fixed damping
//! factor, optionally shortened by Armijo backtracking, and kept inside an
//! optional bound box.
//!
//! The iteration works on contiguous blocks of the unknown vector so that the
//! same machinery drives both the full solver ([`newton`]) and the block
//! solver in [`split_newton`][crate::split_newton].
//!
//! ```
//! use ndarray as nd;
//! use splitfdm::newton::{ NewtonConfig, NonlinearSystem, SolveResult, newton };
//!
//! // x² = 2, y = x
//! struct Root;
//!
//! impl NonlinearSystem for Root {
//!     fn len(&self) -> usize { 2 }
//!
//!     fn residual(&mut self, x: &nd::Array1<f64>) -> SolveResult<nd::Array1<f64>> {
//!         Ok(nd::array![2.0 - x[0] * x[0], x[0] - x[1]])
//!     }
//!
//!     fn jacobian(&mut self, x: &nd::Array1<f64>, cols: std::ops::Range<usize>)
//!         -> SolveResult<nd::Array2<f64>>
//!     {
//!         let full = nd::array![[-2.0 * x[0], 0.0], [1.0, -1.0]];
//!         Ok(full.slice(nd::s![.., cols]).to_owned())
//!     }
//! }
//!
//! let (x, conv) = newton(&mut Root, nd::array![1.0, 0.0], &NewtonConfig::default(), None)
//!     .unwrap();
//! assert!((x[0] - 2.0_f64.sqrt()).abs() < 1e-10);
//! assert!(conv.iterations < 10);
//! ```

use std::ops::Range;
use log::{ debug, warn };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    DEF_MAXITERS,
    DEF_TOLERANCE,
    error::{ ConfigError, LengthError, SolveError },
    layout::StateBounds,
    linalg::{ self, solve_dense },
    utils::{ all_finite, norm },
};

pub type SolveResult<T> = Result<T, SolveError>;

/// Maximum number of step halvings in the Armijo line search.
pub const ARMIJO_HALVINGS: usize = 10;

/// Sufficient-decrease constant in the Armijo line search.
pub const ARMIJO_SIGMA: f64 = 1e-4;

/// A square nonlinear system `f(x) = 0`.
pub trait NonlinearSystem {
    /// Number of unknowns.
    fn len(&self) -> usize;

    /// Return `true` if there are no unknowns.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Evaluate `f(x)`.
    fn residual(&mut self, x: &nd::Array1<f64>) -> SolveResult<nd::Array1<f64>>;

    /// Evaluate the columns `cols` of `∂f/∂x` at `x`, for all rows.
    fn jacobian(&mut self, x: &nd::Array1<f64>, cols: Range<usize>)
        -> SolveResult<nd::Array2<f64>>;
}

/// Treatment of updates that leave the bound box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Project the updated state onto the box.
    #[default]
    Clip,
    /// Shorten the step to the largest fraction that stays inside the box.
    Reject,
}

/// Settings for pseudo-transient continuation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PseudoTime {
    /// Initial pseudo-time step.
    pub dt0: f64,
    /// Upper limit on the pseudo-time step.
    pub dtmax: f64,
}

impl Default for PseudoTime {
    fn default() -> Self { Self { dt0: 1e-2, dtmax: 1e6 } }
}

/// Newton iteration settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Convergence threshold on the Euclidean norm of the residual.
    pub tolerance: f64,
    /// Maximum number of updates.
    pub max_iterations: usize,
    /// Fixed fraction of each Newton step to take, in `(0, 1]`.
    pub damping: f64,
    /// Backtrack each step until the residual norm decreases sufficiently.
    pub armijo: bool,
    /// Pseudo-transient continuation; `None` for plain Newton steps.
    pub pseudo_time: Option<PseudoTime>,
    /// Treatment of updates leaving the bound box, if one is given.
    pub bounds_policy: BoundsPolicy,
    /// Number of consecutive updates blocked by the bound box after which the
    /// iteration gives up.
    pub max_bound_stalls: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: DEF_TOLERANCE,
            max_iterations: DEF_MAXITERS,
            damping: 1.0,
            armijo: false,
            pseudo_time: None,
            bounds_policy: BoundsPolicy::Clip,
            max_bound_stalls: 5,
        }
    }
}

impl NewtonConfig {
    /// Check all settings.
    pub fn check(&self) -> Result<(), ConfigError> {
        ConfigError::check_tolerance(self.tolerance)?;
        ConfigError::check_maxiters(self.max_iterations)?;
        (self.damping > 0.0 && self.damping <= 1.0).then_some(())
            .ok_or(ConfigError::BadStep(self.damping))?;
        if let Some(pt) = self.pseudo_time {
            ConfigError::check_step(pt.dt0)?;
            ConfigError::check_step(pt.dtmax)?;
            (pt.dt0 <= pt.dtmax).then_some(())
                .ok_or(ConfigError::BadStep(pt.dt0))?;
        }
        Ok(())
    }
}

/// Outcome of a converged solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Convergence {
    /// Number of Newton updates taken.
    pub iterations: usize,
    /// Euclidean norm of the final residual.
    pub residual_norm: f64,
}

/// Running state of a (block) Newton iteration.
pub(crate) struct Iteration<'a> {
    config: &'a NewtonConfig,
    bounds: Option<&'a StateBounds>,
    x: nd::Array1<f64>,
    r: nd::Array1<f64>,
    updates: usize,
    stalls: usize,
}

impl<'a> Iteration<'a> {
    /// Validate settings, bring `x0` into the bound box, and evaluate the
    /// initial residual.
    pub(crate) fn start<N>(
        system: &mut N,
        x0: nd::Array1<f64>,
        config: &'a NewtonConfig,
        bounds: Option<&'a StateBounds>,
    ) -> SolveResult<Self>
    where N: NonlinearSystem + ?Sized
    {
        config.check()?;
        LengthError::check_len(x0.len(), system.len())?;
        let mut x = x0;
        if let Some(b) = bounds {
            LengthError::check_len(b.len(), x.len())?;
            match config.bounds_policy {
                BoundsPolicy::Clip => { b.clip(&mut x); },
                BoundsPolicy::Reject => {
                    if let Some(err) = b.first_violation(&x) {
                        return Err(err);
                    }
                },
            }
        }
        let r = system.residual(&x)?;
        LengthError::check_len(r.len(), x.len())?;
        Ok(Self { config, bounds, x, r, updates: 0, stalls: 0 })
    }

    pub(crate) fn updates(&self) -> usize { self.updates }

    /// Norm of the full residual.
    pub(crate) fn norm(&self) -> f64 { norm(&self.r) }

    /// Norm of the residual restricted to `block`.
    pub(crate) fn block_norm(&self, block: &Range<usize>) -> f64 {
        norm(&self.r.slice(nd::s![block.clone()]))
    }

    pub(crate) fn failure(&self) -> SolveError {
        SolveError::ConvergenceFailure {
            iterations: self.updates,
            residual_norm: self.norm(),
        }
    }

    /// Initial pseudo-time step, if pseudo-transient continuation is on.
    pub(crate) fn initial_dt(&self) -> Option<f64> {
        self.config.pseudo_time.map(|pt| pt.dt0)
    }

    /// Take up to `max_steps` Newton updates on `block`, holding every other
    /// component fixed, until the residual restricted to `block` drops below
    /// `tol`. Returns the final block residual norm.
    ///
    /// `dt` is the pseudo-time step of `block`; it is updated in place so that
    /// its growth carries over between calls on the same block.
    pub(crate) fn run_block<N>(
        &mut self,
        system: &mut N,
        block: Range<usize>,
        max_steps: usize,
        tol: f64,
        dt: &mut Option<f64>,
        label: &str,
    ) -> SolveResult<f64>
    where N: NonlinearSystem + ?Sized
    {
        let mut bnorm = self.block_norm(&block);
        for _ in 0..max_steps {
            if bnorm < tol { break; }
            if !bnorm.is_finite() { return Err(self.failure()); }
            let alpha = self.step(system, &block, *dt)?;
            let new_bnorm = self.block_norm(&block);
            debug!(
                "{}: update {}: |r| = {:.3e} (block {:.3e}), step fraction {:.3}",
                label, self.updates, self.norm(), new_bnorm, alpha,
            );
            // switched evolution relaxation
            if let (Some(dtk), Some(pt)) = (dt.as_mut(), self.config.pseudo_time) {
                if new_bnorm > 0.0 && new_bnorm.is_finite() {
                    *dtk = (*dtk * bnorm / new_bnorm).min(pt.dtmax);
                }
            }
            bnorm = new_bnorm;
        }
        Ok(bnorm)
    }

    // one update on `block`; returns the step fraction actually taken
    fn step<N>(&mut self, system: &mut N, block: &Range<usize>, dt: Option<f64>)
        -> SolveResult<f64>
    where N: NonlinearSystem + ?Sized
    {
        let nb = block.len();
        let jac = system.jacobian(&self.x, block.clone())?;
        LengthError::check_len(jac.ncols(), nb)?;
        LengthError::check_len(jac.nrows(), self.x.len())?;
        let mut a: nd::Array2<f64> = -linalg::block(&jac, block.clone(), 0..nb);
        if let Some(dtk) = dt {
            a.diag_mut().iter_mut().for_each(|akk| { *akk += 1.0 / dtk; });
        }
        let rb = self.r.slice(nd::s![block.clone()]);
        let dxb = solve_dense(&a, &rb)
            .ok_or(SolveError::NumericalSingularity { iteration: self.updates + 1 })?;
        let mut dx: nd::Array1<f64> = nd::Array1::zeros(self.x.len());
        dx.slice_mut(nd::s![block.clone()]).assign(&dxb);

        let norm0 = self.block_norm(block);
        let mut alpha = self.config.damping;
        if let (Some(b), BoundsPolicy::Reject) = (self.bounds, self.config.bounds_policy) {
            alpha *= b.max_step(&self.x, &(&dx * alpha));
        }
        let (mut x_new, mut r_new) = self.trial(system, &dx, alpha)?;
        if self.config.armijo {
            let mut accepted = false;
            for _ in 0..ARMIJO_HALVINGS {
                let trial_norm = norm(&r_new.slice(nd::s![block.clone()]));
                if trial_norm <= (1.0 - ARMIJO_SIGMA * alpha) * norm0 {
                    accepted = true;
                    break;
                }
                alpha *= 0.5;
                (x_new, r_new) = self.trial(system, &dx, alpha)?;
            }
            if !accepted {
                warn!(
                    "line search failed to reduce the residual after {} halvings; \
                    taking step fraction {:.3e}",
                    ARMIJO_HALVINGS, alpha,
                );
            }
        }

        let moved = x_new.iter().zip(&self.x).any(|(a, b)| a != b);
        if moved {
            self.stalls = 0;
        } else {
            self.stalls += 1;
            if self.stalls > self.config.max_bound_stalls {
                warn!("update blocked by bounds {} times in a row", self.stalls);
                return Err(self.failure());
            }
        }
        self.x = x_new;
        self.r = r_new;
        self.updates += 1;
        all_finite(&self.r).then_some(alpha).ok_or_else(|| self.failure())
    }

    fn trial<N>(&self, system: &mut N, dx: &nd::Array1<f64>, alpha: f64)
        -> SolveResult<(nd::Array1<f64>, nd::Array1<f64>)>
    where N: NonlinearSystem + ?Sized
    {
        let mut x_new = &self.x + &(dx * alpha);
        if let Some(b) = self.bounds {
            // with rejection the step is already inside up to rounding
            b.clip(&mut x_new);
        }
        all_finite(&x_new).then_some(())
            .ok_or(SolveError::NonFinite { stage: "newton update" })?;
        let r_new = system.residual(&x_new)?;
        Ok((x_new, r_new))
    }

    pub(crate) fn finish(self) -> (nd::Array1<f64>, Convergence) {
        let residual_norm = self.norm();
        (self.x, Convergence { iterations: self.updates, residual_norm })
    }
}

/// Solve `f(x) = 0` by Newton iteration on the full system, starting from
/// `x0`.
///
/// With `bounds`, every intermediate and final iterate lies inside the box.
pub fn newton<N>(
    system: &mut N,
    x0: nd::Array1<f64>,
    config: &NewtonConfig,
    bounds: Option<&StateBounds>,
) -> SolveResult<(nd::Array1<f64>, Convergence)>
where N: NonlinearSystem + ?Sized
{
    let mut it = Iteration::start(system, x0, config, bounds)?;
    let n = system.len();
    let mut dt = it.initial_dt();
    let rnorm = it.run_block(
        system, 0..n, config.max_iterations, config.tolerance, &mut dt, "newton")?;
    if rnorm < config.tolerance {
        debug!("newton: converged in {} updates", it.updates());
        Ok(it.finish())
    } else {
        Err(it.failure())
    }
}
