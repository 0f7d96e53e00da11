use ndarray as nd;
use splitfdm::{
    bc::{ BoundaryCondition as BC, BoundarySpec },
    domain::Domain,
    equations::{ AdvectionDiffusion, Relaxation },
    ic::{ InitialCondition as IC, InitialConditions },
    layout::VariableBounds,
    model::EquationModel,
    refine::RefineConfig,
    simulation::{ Simulation, SteadyStateConfig },
    split_newton::SplitConfig,
    timestep::{ EvolveConfig, TimeScheme },
};

// transport of three species on [0, 1]: a periodic pulse relaxing toward a
// uniform background, a front held between two fixed values, and a field
// pinned on one side only

fn main() {
    const NX: usize = 20;
    const NG: usize = 2;
    const VELOCITY: f64 = 0.5;
    const DIFFUSIVITY: f64 = 0.1;
    const DT: f64 = 1e-3;
    const STEPS: usize = 200;

    let domain = Domain::new(NX, NG, (0.0, 1.0), &["u", "v", "w"]).unwrap();
    let model = EquationModel::new("transport")
        .with(AdvectionDiffusion::new(VELOCITY, DIFFUSIVITY, vec![0, 1, 2]))
        .with(Relaxation::new(1.0, 1.0, vec![0]));
    let ics = InitialConditions::new()
        .set("u", IC::gaussian(0.5, 0.1, 1.0))
        .set("v", IC::rarefaction(0.45, 0.55, 3.0, 4.0));
    let bcs = BoundarySpec::new()
        .both("u", BC::Periodic)
        .pair("v", BC::Dirichlet(3.0), BC::Dirichlet(4.0))
        .left("w", BC::Dirichlet(2.0))
        .right("w", BC::Periodic);
    let mut sim = Simulation::new(domain, model, &ics, &bcs).unwrap();

    // transient phase
    let evolve = EvolveConfig::new(TimeScheme::Rk4);
    for _ in 0..STEPS {
        sim.evolve_with(DT, &evolve).unwrap();
    }
    println!("t = {:.3}: |r| = {:.3e}", sim.time(), sim.residual_norm());

    // steady state, refining where the profiles are steep
    let config = SteadyStateConfig {
        split: Some(SplitConfig::new(1)),
        bounds: Some(VariableBounds::new(vec![-1.0, -2.0, 0.0], vec![5.0, 4.0, 3.0])),
        refinement: Some(RefineConfig {
            refine_threshold: 0.3,
            coarsen_threshold: 0.0,
            min_spacing: 5e-3,
            ..RefineConfig::default()
        }),
        ..SteadyStateConfig::default()
    };
    let res = sim.steady_state(&config).unwrap();
    println!(
        "steady state: {} updates, {} refinement passes, {} cells, |r| = {:.3e}",
        res.iterations, res.refinement_passes, res.cells, res.residual_norm,
    );

    let x = sim.domain().interior_x();
    let values: nd::ArrayView2<f64> = sim.domain().interior();
    println!("{:>8} {:>10} {:>10} {:>10}", "x", "u", "v", "w");
    for (xk, row) in x.iter().zip(values.outer_iter()) {
        println!("{:>8.4} {:>10.6} {:>10.6} {:>10.6}", xk, row[0], row[1], row[2]);
    }
}
