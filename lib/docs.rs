//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Ghost cells](#ghost-cells)
//! - [Newton iteration](#newton-iteration)
//! - [Split Newton](#split-newton)
//! - [Mesh refinement](#mesh-refinement)
//!
//! # Background
//! The systems handled here are collections of `nv` coupled scalar fields
//! *u*ₘ(*x*, *t*) on an interval [*x*ₗ, *x*ᵣ] obeying
//! ```text
//! ∂uₘ
//! --- = fₘ(u, ∂u/∂x, ∂²u/∂x²),   m = 0, ..., nv - 1
//! ∂t
//! ```
//! with boundary conditions at both ends. The interval is divided into `nx`
//! cells with centers
//! ```text
//! x[i] = xₗ + (i + 1/2) h,   h = (xᵣ - xₗ) / nx
//! ```
//! (non-uniform after refinement), and the right-hand side is replaced by
//! three-point difference formulas that are exact for quadratics on any
//! spacing (see [`derivatives`][crate::derivatives]). The result is a system
//! of `nx nv` ordinary differential equations
//! ```text
//! dy
//! -- = F(y)
//! dt
//! ```
//! in the vector *y* of all interior values. Transient problems integrate this
//! system directly ([`timestep`][crate::timestep]); steady problems solve
//! *F*(*y*) = 0.
//!
//! # Ghost cells
//! Each end of the mesh carries `ng` extra cells whose values are never
//! unknowns. They are refilled from the interior whenever the interior
//! changes, after which every interior cell can be evaluated with the same
//! stencil. Ghost coordinates are reflections of interior cells about the
//! boundary face:
//! ```text
//!   g₂    g₁  |  u₀    u₁    u₂   ...
//! ---+-----+--|--+-----+-----+------
//!             xₗ
//! x[g_k] = 2 xₗ - x[k - 1]
//! ```
//! For a Dirichlet value *a*, odd reflection `g_k = 2 a - u[k - 1]` places the
//! linear interpolant through each mirror pair at exactly *a* on the face,
//! which keeps the scheme second-order at the boundary. A Neumann gradient *b*
//! sets `g_k = u[k - 1] - b (x[k - 1] - x[g_k])`, so that each mirror pair
//! has difference quotient *b*. Periodic ghosts copy the cells at the far
//! end together with their coordinates, shifted by the domain length
//! *L* = xᵣ - xₗ:
//! ```text
//! x[g_k] = x[nx - k] - L,    g_k = u[nx - k]
//! ```
//! so stencils at the ends wrap around exactly on any mesh. Ghost coordinates
//! therefore depend on the variable, and stencils carry one coordinate column
//! per variable.
//!
//! # Newton iteration
//! Writing *J* = ∂*F*/∂*y*, each update solves
//! ```text
//! (I / Δτ - J) δy = F(y)
//! ```
//! and sets *y* ← *y* + α δ*y*. With Δτ → ∞ this is the Newton-Raphson step;
//! finite Δτ is an implicit Euler step in a pseudo-time τ, which trades the
//! quadratic convergence of Newton for a much larger basin of attraction.
//! Δτ grows as the residual falls according to switched evolution
//! relaxation[^1],
//! ```text
//! Δτ ← min(Δτ ‖F(y_old)‖ / ‖F(y_new)‖, Δτ_max)
//! ```
//! so that the iteration recovers plain Newton near the root. The step
//! fraction α is the product of a fixed damping factor, an optional
//! bound-preserving factor, and an optional Armijo backtracking factor that
//! halves α until
//! ```text
//! ‖F(y + α δy)‖ ≤ (1 - σ α) ‖F(y)‖,   σ = 10⁻⁴
//! ```
//!
//! When a model does not supply *J*, its columns are approximated by forward
//! differences with step `h = √ε max(|y_k|, 1)`. Since each residual entry
//! only depends on cells within the stencil half-width, perturbing one cell
//! changes only a band of rows (plus the far end of the mesh when a periodic
//! ghost picks up the perturbation), and only those rows are recomputed.
//!
//! # Split Newton
//! Ordering the unknowns so that variables `0..s` of every cell come first
//! partitions the system as
//! ```text
//! ⎡ F_o(y_o, y_i) ⎤       ⎡ J_oo  J_oi ⎤
//! ⎣ F_i(y_o, y_i) ⎦ ,  J = ⎣ J_io  J_ii ⎦
//! ```
//! Split Newton alternates Newton iteration on *F*ᵢ = 0 in *y*ᵢ alone (using
//! only *J*ᵢᵢ) with a single Newton step on *F*ₒ = 0 in *y*ₒ alone (using only
//! *J*ₒₒ). This is nonlinear block Gauss-Seidel; it converges to the same root
//! as the coupled iteration when the off-diagonal blocks are weak relative to
//! the diagonal ones (for a linear problem, when the spectral radius of
//! *J*ᵢᵢ⁻¹ *J*ᵢₒ *J*ₒₒ⁻¹ *J*ₒᵢ is below one), and each factorization is of a
//! smaller matrix.
//!
//! # Mesh refinement
//! For every interval between neighboring cells and every variable, the
//! refinement indicator takes the larger of
//! ```text
//! |u[i + 1] - u[i]|          |s[i + 1/2] - s[i - 1/2]|
//! -----------------   and    --------------------------
//!   max u - min u                  max s - min s
//! ```
//! where *s* are the difference quotients between neighboring cells[^2].
//! Intervals above the refine threshold are bisected; cells whose
//! neighborhood is below the coarsen threshold are dropped, never two in a
//! row, so a bisected uniform mesh coarsens back to exactly the original one.
//!
//! [^1]: W. Mulder and B. van Leer, "Experiments with implicit upwind methods
//! for the Euler equations." J. Comput. Phys. **59**, 232 (1985).
//!
//! [^2]: R. J. Kee, M. E. Coltrin, and P. Glarborg, *Chemically Reacting Flow:
//! Theory and Practice*, Wiley (2003), ch. 15.
