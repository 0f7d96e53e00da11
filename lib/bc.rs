//! Boundary conditions and ghost-cell filling.
//!
//! Every variable carries one [`BoundaryCondition`] per side, which fills both
//! the value and the coordinate of each of its ghost cells (see [`Domain`]).
//! Counting ghost cells outward from the face with `k = 1..=ng`, the `k`-th
//! left ghost is paired with interior cell `k - 1` and, on a domain of length
//! `L`, placed at
//!
//! | policy      | left ghost coordinate `x_g`  |
//! |-------------|------------------------------|
//! | `Periodic`  | `x[nx - k] - L`              |
//! | otherwise   | `2 xmin - x[k - 1]`          |
//!
//! with value
//!
//! | policy            | left ghost `g_k`                          |
//! |-------------------|-------------------------------------------|
//! | `Periodic`        | `u[nx - k]`                               |
//! | `Dirichlet(a)`    | `2 a - u[k - 1]`                          |
//! | `Neumann(b)`      | `u[k - 1] - b (x[k - 1] - x_g)`           |
//! | `Outflow`         | `u[0]`                                    |
//! | `Extrapolate`     | `u[0] + (u[1] - u[0]) / (x[1] - x[0]) (x_g - x[0])` |
//!
//! and symmetrically on the right. With this convention the face value
//! reconstructed as `(g_1 + u[0]) / 2` equals the Dirichlet value exactly.

use std::{ collections::HashMap, fmt };
use serde::{ Deserialize, Serialize };
use crate::{
    domain::Domain,
    error::ConfigError,
};

/// One end of the domain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Policy used to fill the ghost cells of one variable on one side.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Wrap around to the opposite end of the domain.
    Periodic,
    /// Fixed value at the boundary face.
    Dirichlet(f64),
    /// Fixed gradient at the boundary.
    Neumann(f64),
    /// Zero-gradient copy of the nearest interior cell.
    Outflow,
    /// Linear extrapolation through the two nearest interior cells.
    Extrapolate,
}

impl BoundaryCondition {
    /// Return `true` if `self` is `Periodic`.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic)
    }
}

/// Partially specified boundary conditions for a single variable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sides {
    pub left: Option<BoundaryCondition>,
    pub right: Option<BoundaryCondition>,
}

/// Mapping from variable name to its per-side boundary conditions.
///
/// ```
/// use splitfdm::bc::{ BoundaryCondition as BC, BoundarySpec };
///
/// let bcs = BoundarySpec::new()
///     .both("u", BC::Periodic)
///     .pair("v", BC::Dirichlet(3.0), BC::Dirichlet(4.0))
///     .left("w", BC::Dirichlet(2.0))
///     .right("w", BC::Periodic);
/// assert_eq!(bcs.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundarySpec {
    entries: HashMap<String, Sides>,
}

impl BoundarySpec {
    pub fn new() -> Self { Self::default() }

    /// Set the same condition on both sides of `var`.
    pub fn both(self, var: &str, bc: BoundaryCondition) -> Self {
        self.pair(var, bc, bc)
    }

    /// Set the left and right conditions of `var`.
    pub fn pair(self, var: &str, left: BoundaryCondition, right: BoundaryCondition)
        -> Self
    {
        self.left(var, left).right(var, right)
    }

    /// Set the left condition of `var`.
    pub fn left(mut self, var: &str, bc: BoundaryCondition) -> Self {
        self.entries.entry(var.to_string()).or_default().left = Some(bc);
        self
    }

    /// Set the right condition of `var`.
    pub fn right(mut self, var: &str, bc: BoundaryCondition) -> Self {
        self.entries.entry(var.to_string()).or_default().right = Some(bc);
        self
    }

    /// Number of variables with at least one side specified.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Return `true` if nothing has been specified.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Look up the conditions given for `var`.
    pub fn get(&self, var: &str) -> Option<&Sides> { self.entries.get(var) }

    /// Resolve against a list of variable names, requiring both sides of every
    /// variable and rejecting names that do not exist.
    pub fn resolve(&self, names: &[String]) -> Result<Boundaries, ConfigError> {
        if let Some(unknown) = self.entries.keys().find(|k| !names.contains(k)) {
            return Err(ConfigError::UnknownVariable(unknown.clone()));
        }
        let pairs: Vec<(BoundaryCondition, BoundaryCondition)>
            = names.iter()
            .map(|name| {
                let sides = self.entries.get(name).copied().unwrap_or_default();
                let missing = |side| ConfigError::MissingBoundary {
                    var: name.clone(),
                    side,
                };
                let left = sides.left.ok_or_else(|| missing(Side::Left))?;
                let right = sides.right.ok_or_else(|| missing(Side::Right))?;
                Ok((left, right))
            })
            .collect::<Result<_, ConfigError>>()?;
        Ok(Boundaries { pairs })
    }
}

/// Fully resolved boundary conditions, indexed by variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Boundaries {
    pairs: Vec<(BoundaryCondition, BoundaryCondition)>,
}

impl Boundaries {
    /// Boundary condition for variable `var` on `side`.
    pub fn get(&self, var: usize, side: Side) -> BoundaryCondition {
        match side {
            Side::Left => self.pairs[var].0,
            Side::Right => self.pairs[var].1,
        }
    }

    /// Fill every ghost cell of `domain` from its interior values.
    pub fn apply(&self, domain: &mut Domain) {
        for (var, &(left, right)) in self.pairs.iter().enumerate() {
            apply_side(domain, var, Side::Left, left);
            apply_side(domain, var, Side::Right, right);
        }
    }

    /// Fill the ghost cells of a single variable.
    pub fn apply_variable(&self, domain: &mut Domain, var: usize) {
        let (left, right) = self.pairs[var];
        apply_side(domain, var, Side::Left, left);
        apply_side(domain, var, Side::Right, right);
    }
}

fn apply_side(domain: &mut Domain, var: usize, side: Side, bc: BoundaryCondition) {
    let nx = domain.nx();
    let ng = domain.ng();
    let ilo = domain.ilo();
    let ihi = domain.ihi();
    let (xmin, xmax) = domain.extent();
    let (face, shift) = match side {
        Side::Left => (xmin, xmin - xmax),
        Side::Right => (xmax, xmax - xmin),
    };
    let (mut x, mut u) = domain.columns_mut(var);
    for k in 1..=ng {
        // ghost row, its mirror interior row, the periodic source row, and the
        // nearest interior row
        let (g, m, p, e) = match side {
            Side::Left => (ilo - k, ilo + k - 1, ilo + nx - k, ilo),
            Side::Right => (ihi + k, ihi + 1 - k, ilo + k - 1, ihi),
        };
        x[g] = if bc.is_periodic() { x[p] + shift } else { 2.0 * face - x[m] };
        u[g] = match bc {
            BoundaryCondition::Periodic => u[p],
            BoundaryCondition::Dirichlet(a) => 2.0 * a - u[m],
            BoundaryCondition::Neumann(b) => u[m] + b * (x[g] - x[m]),
            BoundaryCondition::Outflow => u[e],
            BoundaryCondition::Extrapolate => {
                if nx < 2 {
                    u[e]
                } else {
                    // second-nearest interior row
                    let e2 = match side { Side::Left => e + 1, Side::Right => e - 1 };
                    u[e] + (u[e2] - u[e]) / (x[e2] - x[e]) * (x[g] - x[e])
                }
            },
        };
    }
}
