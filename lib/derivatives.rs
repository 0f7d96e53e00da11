//! Finite-difference operators on non-uniform three-point stencils.
//!
//! All operators act on a [`Stencil`], a window of cells centered on the cell
//! being evaluated, and are exact for quadratics (second derivative) or
//! linear functions (one-sided first derivatives) regardless of the local
//! spacing. For neighbor spacings `h₋ = x₀ - x₋` and `h₊ = x₊ - x₀`:
//! ```text
//!                  h₊              h₊ - h₋            h₋
//! ∂u/∂x ≈ - -------------- u₋ + --------- u₀ + -------------- u₊
//!           h₋ (h₋ + h₊)          h₋ h₊        h₊ (h₋ + h₊)
//!
//! ∂²u         2      ⎡ u₊ - u₀   u₀ - u₋ ⎤
//! --- ≈ ---------- · ⎢ ------- - ------- ⎥
//! ∂x²   x₊ - x₋      ⎣   h₊        h₋    ⎦
//! ```

use ndarray as nd;
use serde::{ Deserialize, Serialize };

/// Window of `2 nb + 1` consecutive cells, addressed by signed offset from its
/// center.
///
/// Coordinates are held per variable, since ghost cells of different variables
/// may sit at different positions.
#[derive(Clone, Debug)]
pub struct Stencil<'a> {
    x: nd::ArrayView2<'a, f64>,
    values: nd::ArrayView2<'a, f64>,
    nb: usize,
}

impl<'a> Stencil<'a> {
    /// Wrap windows of coordinates and values, both shaped
    /// `(cells, variables)`.
    ///
    /// *Panics if the window has an even number of cells or the two views
    /// disagree in shape*.
    pub fn new(x: nd::ArrayView2<'a, f64>, values: nd::ArrayView2<'a, f64>)
        -> Self
    {
        assert!(x.nrows() % 2 == 1, "stencil must have odd length");
        assert_eq!(x.dim(), values.dim(), "stencil views disagree in shape");
        let nb = x.nrows() / 2;
        Self { x, values, nb }
    }

    /// Number of variables.
    pub fn nv(&self) -> usize { self.values.ncols() }

    fn row(&self, offset: isize) -> usize {
        let r = self.nb as isize + offset;
        assert!(
            r >= 0 && (r as usize) < self.x.nrows(),
            "stencil offset out of range",
        );
        r as usize
    }

    /// Coordinate of the cell at `offset` as seen by variable `var`.
    pub fn x(&self, offset: isize, var: usize) -> f64 {
        self.x[[self.row(offset), var]]
    }

    /// Value of variable `var` in the cell at `offset`.
    pub fn value(&self, offset: isize, var: usize) -> f64 {
        self.values[[self.row(offset), var]]
    }
}

/// Difference scheme for a first derivative.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Second-order three-point difference.
    #[default]
    Central,
    /// First-order backward (upwind for positive velocity).
    West,
    /// First-order forward (upwind for negative velocity).
    East,
}

impl Scheme {
    /// The upwind one-sided scheme for transport at `velocity`.
    pub fn upwind(velocity: f64) -> Self {
        if velocity >= 0.0 { Self::West } else { Self::East }
    }
}

/// First derivative of variable `var` at the stencil center.
pub fn dx(st: &Stencil, var: usize, scheme: Scheme) -> f64 {
    let (xm, x0, xp) = (st.x(-1, var), st.x(0, var), st.x(1, var));
    let (um, u0, up) = (st.value(-1, var), st.value(0, var), st.value(1, var));
    match scheme {
        Scheme::Central => {
            let hm = x0 - xm;
            let hp = xp - x0;
            -hp / (hm * (hm + hp)) * um
                + (hp - hm) / (hm * hp) * u0
                + hm / (hp * (hm + hp)) * up
        },
        Scheme::West => (u0 - um) / (x0 - xm),
        Scheme::East => (up - u0) / (xp - x0),
    }
}

/// Second derivative of variable `var` at the stencil center.
pub fn d2x(st: &Stencil, var: usize) -> f64 {
    d2x_with(st, var, |_| 1.0)
}

/// Flux-form second derivative `∂/∂x (k(u) ∂u/∂x)`, with `k` evaluated at each
/// face as the mean of its two neighboring cells.
pub fn d2x_with<F>(st: &Stencil, var: usize, k: F) -> f64
where F: Fn(f64) -> f64
{
    let (xm, x0, xp) = (st.x(-1, var), st.x(0, var), st.x(1, var));
    let (um, u0, up) = (st.value(-1, var), st.value(0, var), st.value(1, var));
    let kp = 0.5 * (k(u0) + k(up));
    let km = 0.5 * (k(um) + k(u0));
    2.0 / (xp - xm) * (kp * (up - u0) / (xp - x0) - km * (u0 - um) / (x0 - xm))
}
