//! Adaptive mesh refinement.
//!
//! Each pass computes, for every interval between neighboring interior cells,
//! the largest over all variables of
//! - the jump `|u[i + 1] - u[i]|` relative to the variable's range, and
//! - the change in slope at either end, relative to the variable's range of
//!   slopes.
//!
//! Variables (or slopes) with a vanishing range are ignored. Intervals whose
//! indicator exceeds the refine threshold receive a new cell at their
//! midpoint; interior cells whose neighborhood lies entirely below the coarsen
//! threshold are removed, never two in a row. Values on the new mesh are
//! interpolated from the old one, and the ghost layer keeps its width.
//!
//! Boundary conditions must be re-applied after a pass that changed the mesh.

use log::{ info, warn };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    domain::Domain,
    error::{ ConfigError, MeshError },
    interp::{ Interpolation, resample },
    utils::array_diff,
};

/// Refinement settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Intervals with an indicator above this value are split.
    pub refine_threshold: f64,
    /// Cells whose neighborhood indicators are all below this value may be
    /// removed.
    pub coarsen_threshold: f64,
    /// Minimum number of interior cells; passes that would leave fewer fail.
    pub min_cells: usize,
    /// Maximum number of interior cells; insertions beyond it are dropped.
    pub max_cells: usize,
    /// Intervals shorter than twice this are never split.
    pub min_spacing: f64,
    /// Cells are not removed if the merged interval would exceed this.
    pub max_spacing: Option<f64>,
    /// Interpolation used for the values at new cells.
    pub interpolation: Interpolation,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            refine_threshold: 0.5,
            coarsen_threshold: 0.05,
            min_cells: 4,
            max_cells: 4096,
            min_spacing: 1e-6,
            max_spacing: None,
            interpolation: Interpolation::Linear,
        }
    }
}

impl RefineConfig {
    /// Check the settings for consistency.
    pub fn check(&self) -> Result<(), ConfigError> {
        (self.coarsen_threshold >= 0.0
            && self.refine_threshold > self.coarsen_threshold)
            .then_some(())
            .ok_or(ConfigError::BadRefinement(
                "thresholds must satisfy 0 <= coarsen_threshold < refine_threshold"))?;
        (self.min_cells >= 1 && self.min_cells <= self.max_cells)
            .then_some(())
            .ok_or(ConfigError::BadRefinement(
                "cell limits must satisfy 1 <= min_cells <= max_cells"))?;
        (self.min_spacing >= 0.0 && self.min_spacing.is_finite())
            .then_some(())
            .ok_or(ConfigError::BadRefinement(
                "min_spacing must be non-negative and finite"))?;
        self.max_spacing
            .map_or(true, |hmax| hmax > self.min_spacing)
            .then_some(())
            .ok_or(ConfigError::BadRefinement(
                "max_spacing must exceed min_spacing"))
    }
}

/// Summary of a single refinement pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RefineReport {
    /// Number of cells added.
    pub inserted: usize,
    /// Number of cells removed.
    pub removed: usize,
    /// Number of interior cells after the pass.
    pub cells: usize,
}

impl RefineReport {
    /// Return `true` if the pass left the mesh as it was.
    pub fn is_unchanged(&self) -> bool { self.inserted == 0 && self.removed == 0 }
}

// indicator on each of the `nx - 1` intervals between interior cells
fn interval_indicators(domain: &Domain) -> nd::Array1<f64> {
    let nx = domain.nx();
    let mut ind: nd::Array1<f64> = nd::Array1::zeros(nx.saturating_sub(1));
    if nx < 2 { return ind; }
    let x = domain.interior_x();
    let h = array_diff(&x);
    for u in domain.interior().columns() {
        let du = array_diff(&u);
        let (umin, umax) = min_max(u.iter());
        let urange = umax - umin;
        if urange <= f64::EPSILON * umax.abs().max(umin.abs()) || urange == 0.0 {
            continue;
        }
        let slope: nd::Array1<f64>
            = du.iter().zip(&h).map(|(d, hk)| d / hk).collect();
        let (smin, smax) = min_max(slope.iter());
        let srange = smax - smin;
        let curv: nd::Array1<f64>
            = (0..nx)
            .map(|i| {
                if i == 0 || i == nx - 1 || srange <= 0.0 {
                    0.0
                } else {
                    (slope[i] - slope[i - 1]).abs() / srange
                }
            })
            .collect();
        for (k, ik) in ind.iter_mut().enumerate() {
            let jump = du[k].abs() / urange;
            *ik = ik.max(jump).max(curv[k]).max(curv[k + 1]);
        }
    }
    ind
}

fn min_max<'a, I>(iter: I) -> (f64, f64)
where I: Iterator<Item = &'a f64>
{
    iter.fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), v| (lo.min(*v), hi.max(*v)),
    )
}

/// Refinement indicator of every interior cell: the larger of the indicators
/// of its two adjacent intervals.
pub fn indicators(domain: &Domain) -> nd::Array1<f64> {
    let nx = domain.nx();
    let ind = interval_indicators(domain);
    (0..nx)
        .map(|i| {
            let left = if i > 0 { ind[i - 1] } else { 0.0 };
            let right = if i + 1 < nx { ind[i] } else { 0.0 };
            left.max(right)
        })
        .collect()
}

/// Perform one refinement pass on `domain`.
///
/// On error the domain is left untouched.
pub fn refine(domain: &mut Domain, config: &RefineConfig)
    -> Result<RefineReport, MeshError>
{
    config.check()?;
    let nx = domain.nx();
    let min_cells = config.min_cells.max(domain.ng());
    let x = domain.interior_x().to_owned();
    let h = array_diff(&x);
    let ind = interval_indicators(domain);
    let cell_ind = indicators(domain);

    // insertions, largest indicator first when capped
    let mut candidates: Vec<usize>
        = (0..nx.saturating_sub(1))
        .filter(|&k| {
            ind[k] > config.refine_threshold && h[k] >= 2.0 * config.min_spacing
        })
        .collect();

    // removals, left to right, never two adjacent cells
    let mut remove = vec![false; nx];
    let below = |i: usize| cell_ind[i] < config.coarsen_threshold;
    for i in 1..nx.saturating_sub(1) {
        let quiet = below(i - 1) && below(i) && below(i + 1);
        let merged_ok = config.max_spacing
            .map_or(true, |hmax| x[i + 1] - x[i - 1] <= hmax);
        if quiet && merged_ok && !remove[i - 1] {
            remove[i] = true;
        }
    }
    // a cell next to a new midpoint stays
    for &k in candidates.iter() {
        remove[k] = false;
        remove[k + 1] = false;
    }
    let removed = remove.iter().filter(|r| **r).count();

    let room = config.max_cells.saturating_sub(nx - removed);
    if candidates.len() > room {
        warn!(
            "refine: {} intervals flagged but only {} cells may be added",
            candidates.len(), room,
        );
        candidates.sort_by(|&a, &b| ind[b].total_cmp(&ind[a]));
        candidates.truncate(room);
        candidates.sort_unstable();
    }
    let inserted = candidates.len();
    let cells = nx - removed + inserted;
    if removed > 0 && cells < min_cells {
        return Err(MeshError::Degenerate { cells, min_cells });
    }
    if inserted == 0 && removed == 0 {
        return Ok(RefineReport { inserted, removed, cells });
    }

    let mut insert = vec![false; nx];
    candidates.iter().for_each(|&k| { insert[k] = true; });
    let mut new_x: Vec<f64> = Vec::with_capacity(cells);
    for i in 0..nx {
        if !remove[i] { new_x.push(x[i]); }
        if insert[i] { new_x.push(0.5 * (x[i] + x[i + 1])); }
    }
    let new_x = nd::Array1::from(new_x);
    let old = domain.interior().to_owned();
    let mut new_values = resample(&x, &old, &new_x, config.interpolation)?;
    // surviving cells keep their values exactly
    let mut row = 0;
    for i in 0..nx {
        if !remove[i] {
            new_values.row_mut(row).assign(&old.row(i));
            row += 1;
        }
        if insert[i] { row += 1; }
    }
    domain.replace_interior(new_x, new_values)?;
    info!(
        "refine: {} -> {} cells (+{} / -{})",
        nx, cells, inserted, removed,
    );
    Ok(RefineReport { inserted, removed, cells })
}
