//! Built-in [`Equation`] terms.
//!
//! Each term writes its contribution to the time derivative `∂u/∂t` of the
//! variables it acts on, so that a steady state is a zero of the summed
//! residual:
//!
//! | term                 | contribution                    |
//! |----------------------|---------------------------------|
//! | [`Advection`]        | `-c ∂u/∂x`                      |
//! | [`Diffusion`]        | `D ∂²u/∂x²`                     |
//! | [`AdvectionDiffusion`] | `-c ∂u/∂x + D ∂²u/∂x²`        |
//! | [`Burgers`]          | `-u ∂u/∂x + ν ∂²u/∂x²`          |
//! | [`Relaxation`]       | `-k (u - u*)`                   |
//! | [`Exchange`]         | `∓k (a - b)` on `a` and `b`     |
//!
//! First derivatives use the upwind one-sided scheme unless a scheme is set
//! explicitly.

use ndarray as nd;
use crate::{
    derivatives::{ Scheme, Stencil, d2x, dx },
    model::Equation,
};

/// Linear advection at constant velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct Advection {
    pub velocity: f64,
    variables: Vec<usize>,
    scheme: Option<Scheme>,
}

impl Advection {
    pub fn new(velocity: f64, variables: Vec<usize>) -> Self {
        Self { velocity, variables, scheme: None }
    }

    /// Use a fixed first-derivative scheme instead of upwinding.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }
}

impl Equation for Advection {
    fn name(&self) -> &str { "advection" }

    fn variables(&self) -> &[usize] { &self.variables }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        let scheme = self.scheme.unwrap_or(Scheme::upwind(self.velocity));
        for &v in self.variables.iter() {
            out[v] -= self.velocity * dx(st, v, scheme);
        }
    }
}

/// Linear diffusion with constant coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct Diffusion {
    pub coefficient: f64,
    variables: Vec<usize>,
}

impl Diffusion {
    pub fn new(coefficient: f64, variables: Vec<usize>) -> Self {
        Self { coefficient, variables }
    }
}

impl Equation for Diffusion {
    fn name(&self) -> &str { "diffusion" }

    fn variables(&self) -> &[usize] { &self.variables }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        for &v in self.variables.iter() {
            out[v] += self.coefficient * d2x(st, v);
        }
    }
}

/// Combined linear advection and diffusion.
#[derive(Clone, Debug, PartialEq)]
pub struct AdvectionDiffusion {
    advection: Advection,
    diffusion: Diffusion,
}

impl AdvectionDiffusion {
    pub fn new(velocity: f64, coefficient: f64, variables: Vec<usize>) -> Self {
        Self {
            advection: Advection::new(velocity, variables.clone()),
            diffusion: Diffusion::new(coefficient, variables),
        }
    }

    /// Use a fixed first-derivative scheme for the advective part.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.advection = self.advection.with_scheme(scheme);
        self
    }
}

impl Equation for AdvectionDiffusion {
    fn name(&self) -> &str { "advection-diffusion" }

    fn variables(&self) -> &[usize] { &self.diffusion.variables }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        self.advection.residual(st, out);
        self.diffusion.residual(st, out);
    }
}

/// Viscous Burgers equation.
#[derive(Clone, Debug, PartialEq)]
pub struct Burgers {
    pub viscosity: f64,
    variables: Vec<usize>,
}

impl Burgers {
    pub fn new(viscosity: f64, variables: Vec<usize>) -> Self {
        Self { viscosity, variables }
    }
}

impl Equation for Burgers {
    fn name(&self) -> &str { "burgers" }

    fn variables(&self) -> &[usize] { &self.variables }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        for &v in self.variables.iter() {
            let u = st.value(0, v);
            out[v] += -u * dx(st, v, Scheme::upwind(u))
                + self.viscosity * d2x(st, v);
        }
    }
}

/// Linear relaxation toward a fixed target.
#[derive(Clone, Debug, PartialEq)]
pub struct Relaxation {
    pub rate: f64,
    pub target: f64,
    variables: Vec<usize>,
}

impl Relaxation {
    pub fn new(rate: f64, target: f64, variables: Vec<usize>) -> Self {
        Self { rate, target, variables }
    }
}

impl Equation for Relaxation {
    fn name(&self) -> &str { "relaxation" }

    fn variables(&self) -> &[usize] { &self.variables }

    fn stencil_width(&self) -> usize { 0 }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        for &v in self.variables.iter() {
            out[v] -= self.rate * (st.value(0, v) - self.target);
        }
    }
}

/// Local linear exchange between two variables, conserving their sum.
#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    pub rate: f64,
    pair: [usize; 2],
}

impl Exchange {
    pub fn new(rate: f64, a: usize, b: usize) -> Self {
        Self { rate, pair: [a, b] }
    }
}

impl Equation for Exchange {
    fn name(&self) -> &str { "exchange" }

    fn variables(&self) -> &[usize] { &self.pair }

    fn stencil_width(&self) -> usize { 0 }

    fn residual(&self, st: &Stencil, out: &mut nd::ArrayViewMut1<f64>) {
        let [a, b] = self.pair;
        let flow = self.rate * (st.value(0, a) - st.value(0, b));
        out[a] -= flow;
        out[b] += flow;
    }
}
