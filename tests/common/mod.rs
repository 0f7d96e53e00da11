#![allow(dead_code)]

pub mod mock_models;

use splitfdm::{
    bc::{ BoundaryCondition as BC, BoundarySpec },
    domain::Domain,
    equations::{ AdvectionDiffusion, Diffusion, Exchange, Relaxation },
    ic::{ InitialCondition as IC, InitialConditions },
    model::EquationModel,
    simulation::Simulation,
};

/// `u'' = 0` on `[0, 1]` with `u(0) = 1` and `u(1) = 3`, started from `guess`.
pub fn heat(nx: usize, guess: IC) -> Simulation {
    let domain = Domain::new(nx, 1, (0.0, 1.0), &["u"]).unwrap();
    let model = EquationModel::new("heat").with(Diffusion::new(1.0, vec![0]));
    Simulation::new(
        domain,
        model,
        &InitialConditions::new().set("u", guess),
        &BoundarySpec::new().pair("u", BC::Dirichlet(1.0), BC::Dirichlet(3.0)),
    )
    .unwrap()
}

/// Three diffusing species with weak linear exchange between neighbors.
pub fn chain(nx: usize) -> Simulation {
    let domain = Domain::new(nx, 1, (0.0, 1.0), &["a", "b", "c"]).unwrap();
    let model = EquationModel::new("chain")
        .with(Diffusion::new(1.0, vec![0, 1, 2]))
        .with(Exchange::new(0.5, 0, 1))
        .with(Exchange::new(0.5, 1, 2));
    let ics = InitialConditions::new()
        .set("a", IC::Constant(1.0))
        .set("b", IC::gaussian(0.5, 0.2, 1.0))
        .set("c", IC::Sine { amplitude: 0.5, wavelength: 1.0, offset: 0.0 });
    let bcs = BoundarySpec::new()
        .pair("a", BC::Dirichlet(1.0), BC::Neumann(0.0))
        .pair("b", BC::Dirichlet(0.0), BC::Dirichlet(2.0))
        .pair("c", BC::Neumann(1.0), BC::Dirichlet(0.5));
    Simulation::new(domain, model, &ics, &bcs).unwrap()
}

/// The three-variable transport problem: `u` periodic and relaxing to 1,
/// `v` pinned at 3 and 4, `w` pinned at 2 on the left and periodic on the
/// right.
pub fn transport(nx: usize) -> Simulation {
    let domain = Domain::new(nx, 2, (0.0, 1.0), &["u", "v", "w"]).unwrap();
    let model = EquationModel::new("transport")
        .with(AdvectionDiffusion::new(0.5, 0.1, vec![0, 1, 2]))
        .with(Relaxation::new(1.0, 1.0, vec![0]));
    let ics = InitialConditions::new()
        .set("u", IC::gaussian(0.5, 0.1, 1.0))
        .set("v", IC::rarefaction(0.45, 0.55, 3.0, 4.0))
        .set("w", IC::Constant(2.0));
    let bcs = BoundarySpec::new()
        .both("u", BC::Periodic)
        .pair("v", BC::Dirichlet(3.0), BC::Dirichlet(4.0))
        .left("w", BC::Dirichlet(2.0))
        .right("w", BC::Periodic);
    Simulation::new(domain, model, &ics, &bcs).unwrap()
}

/// Largest absolute elementwise difference.
pub fn max_deviation<'a, I>(a: I, b: I) -> f64
where I: IntoIterator<Item = &'a f64>
{
    a.into_iter().zip(b)
        .map(|(ak, bk)| (ak - bk).abs())
        .fold(0.0, f64::max)
}
