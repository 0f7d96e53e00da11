use std::{
    ops::Range,
    sync::{ Arc, atomic::{ AtomicUsize, Ordering } },
};
use ndarray as nd;
use splitfdm::{
    derivatives::Stencil,
    domain::Domain,
    model::Model,
    newton::{ NonlinearSystem, SolveResult },
};

/// Pointwise linear kinetics `du/dt = A u + b` in every cell, with an
/// analytic Jacobian. The steady state is `-A⁻¹ b` everywhere.
pub struct LocalLinear {
    pub a: nd::Array2<f64>,
    pub b: nd::Array1<f64>,
    pub jacobian_calls: Arc<AtomicUsize>,
    /// Report a Jacobian of the wrong size.
    pub broken: bool,
}

impl LocalLinear {
    pub fn new(a: nd::Array2<f64>, b: nd::Array1<f64>) -> Self {
        Self { a, b, jacobian_calls: Arc::new(AtomicUsize::new(0)), broken: false }
    }

    /// Shared counter of analytic Jacobian evaluations.
    pub fn counter(&self) -> Arc<AtomicUsize> { Arc::clone(&self.jacobian_calls) }
}

impl Model for LocalLinear {
    fn name(&self) -> &str { "local-linear" }

    fn stencil_width(&self) -> usize { 0 }

    fn cell_residual(&self, st: &Stencil, mut out: nd::ArrayViewMut1<f64>) {
        for (i, oi) in out.iter_mut().enumerate() {
            *oi = self.b[i]
                + (0..st.nv()).map(|j| self.a[[i, j]] * st.value(0, j)).sum::<f64>();
        }
    }

    fn jacobian(&self, domain: &Domain) -> Option<nd::Array2<f64>> {
        self.jacobian_calls.fetch_add(1, Ordering::Relaxed);
        let nx = domain.nx();
        let nv = domain.nv();
        let n = if self.broken { nx * nv - 1 } else { nx * nv };
        let mut jac: nd::Array2<f64> = nd::Array2::zeros((n, n));
        for cell in 0..nx {
            let k = cell * nv;
            if k + nv > n { break; }
            jac.slice_mut(nd::s![k..k + nv, k..k + nv]).assign(&self.a);
        }
        Some(jac)
    }
}

/// Wraps a system and remembers every point its residual is evaluated at.
pub struct Recorder<N> {
    pub inner: N,
    pub visited: Vec<nd::Array1<f64>>,
}

impl<N> Recorder<N> {
    pub fn new(inner: N) -> Self { Self { inner, visited: Vec::new() } }
}

impl<N: NonlinearSystem> NonlinearSystem for Recorder<N> {
    fn len(&self) -> usize { self.inner.len() }

    fn residual(&mut self, x: &nd::Array1<f64>) -> SolveResult<nd::Array1<f64>> {
        self.visited.push(x.clone());
        self.inner.residual(x)
    }

    fn jacobian(&mut self, x: &nd::Array1<f64>, cols: Range<usize>)
        -> SolveResult<nd::Array2<f64>>
    {
        self.inner.jacobian(x, cols)
    }
}
