//! Block split-Newton iteration.
//!
//! The unknown vector is cut into a leading *outer* block `[0, cut)` and a
//! trailing *inner* block `[cut, n)`. Each cycle
//! 1. iterates Newton updates on the inner block alone, using only the
//!    inner-inner sub-Jacobian, until the inner residual converges or the inner
//!    cap is hit;
//! 2. takes a fixed number of Newton updates (one by default) on the outer
//!    block alone, using only the outer-outer sub-Jacobian;
//! 3. checks the full residual norm against the tolerance.
//!
//! With pseudo-transient continuation each block keeps its own pseudo-time
//! step for the whole solve, so the step keeps growing from one cycle to the
//! next as the block residual falls.
//!
//! This is block Gauss-Seidel with Newton sub-steps. It reaches the same root
//! as [`newton`][crate::newton::newton] when the blocks are not too strongly
//! coupled, and otherwise terminates with a
//! [`ConvergenceFailure`][SolveError::ConvergenceFailure] once the cycle cap
//! ([`NewtonConfig::max_iterations`]) is exhausted.

use log::{ debug, info };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    error::{ ConfigError, SolveError },
    layout::StateBounds,
    newton::{ Convergence, Iteration, NewtonConfig, NonlinearSystem, SolveResult },
};

/// Split-Newton settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Index of the first variable of the inner block. Variables before it
    /// form the outer block.
    pub split_loc: usize,
    /// Cap on inner-block updates per cycle.
    pub inner_max_iterations: usize,
    /// Number of outer-block updates per cycle.
    pub outer_steps: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { split_loc: 1, inner_max_iterations: 50, outer_steps: 1 }
    }
}

impl SplitConfig {
    pub fn new(split_loc: usize) -> Self {
        Self { split_loc, ..Self::default() }
    }

    /// Check the iteration counts; the split location is checked against the
    /// variable count by the caller.
    pub fn check(&self) -> Result<(), ConfigError> {
        ConfigError::check_maxiters(self.inner_max_iterations)?;
        ConfigError::check_maxiters(self.outer_steps)
    }
}

/// Solve `f(x) = 0` by split-Newton iteration with the outer block `[0, cut)`
/// and inner block `[cut, n)`.
///
/// Both blocks must be non-empty. With `bounds`, every intermediate and final
/// iterate lies inside the box. The reported iteration count is the total
/// number of block updates.
pub fn split_newton<N>(
    system: &mut N,
    x0: nd::Array1<f64>,
    cut: usize,
    split: &SplitConfig,
    config: &NewtonConfig,
    bounds: Option<&StateBounds>,
) -> SolveResult<(nd::Array1<f64>, Convergence)>
where N: NonlinearSystem + ?Sized
{
    let n = system.len();
    (cut > 0 && cut < n).then_some(())
        .ok_or(ConfigError::BadSplit { split_loc: cut, limit: n })?;
    split.check()?;
    let mut it = Iteration::start(system, x0, config, bounds)?;
    // both block norms below this guarantee the full norm is below tolerance
    let block_tol = config.tolerance / 2.0_f64.sqrt();
    let outer = 0..cut;
    let inner = cut..n;
    // each block keeps its own pseudo-time step across cycles
    let mut dt_outer = it.initial_dt();
    let mut dt_inner = it.initial_dt();
    for cycle in 0..config.max_iterations {
        let rnorm = it.norm();
        if rnorm < config.tolerance {
            info!(
                "split-newton: converged in {} cycles ({} updates), |r| = {:.3e}",
                cycle, it.updates(), rnorm,
            );
            return Ok(it.finish());
        }
        if !rnorm.is_finite() { return Err(it.failure()); }
        let inner_norm = it.run_block(
            system,
            inner.clone(),
            split.inner_max_iterations,
            block_tol,
            &mut dt_inner,
            "split-newton inner",
        )?;
        let outer_norm = it.run_block(
            system,
            outer.clone(),
            split.outer_steps,
            block_tol,
            &mut dt_outer,
            "split-newton outer",
        )?;
        debug!(
            "split-newton: cycle {}: |r_inner| = {:.3e}, |r_outer| = {:.3e}, |r| = {:.3e}",
            cycle + 1, inner_norm, outer_norm, it.norm(),
        );
    }
    if it.norm() < config.tolerance {
        Ok(it.finish())
    } else {
        Err(SolveError::ConvergenceFailure {
            iterations: it.updates(),
            residual_norm: it.norm(),
        })
    }
}
