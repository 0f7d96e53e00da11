mod common;

use std::sync::atomic::Ordering;
use approx::assert_abs_diff_eq;
use ndarray as nd;
use splitfdm::{
    bc::{ BoundaryCondition as BC, BoundarySpec },
    domain::Domain,
    equations::Burgers,
    error::{ FdmError, SolveError },
    ic::{ InitialCondition as IC, InitialConditions },
    layout::{ StateLayout, VariableBounds },
    model::EquationModel,
    newton::{ BoundsPolicy, NewtonConfig, newton },
    simulation::{ Simulation, SteadyStateConfig },
    split_newton::{ SplitConfig, split_newton },
};
use common::{ chain, heat, max_deviation, mock_models::{ LocalLinear, Recorder }, transport };

fn transport_bounds() -> VariableBounds {
    VariableBounds::new(vec![-1.0, -2.0, 0.0], vec![5.0, 4.0, 3.0])
}

#[test]
fn linear_problem_independent_of_guess() {
    let guesses = [
        IC::Constant(0.0),
        IC::Constant(10.0),
        IC::Constant(-5.0),
        IC::Sine { amplitude: 3.0, wavelength: 0.4, offset: 1.0 },
        IC::Step { location: 0.3, left: -2.0, right: 7.0 },
    ];
    for guess in guesses {
        let mut sim = heat(16, guess);
        let res = sim.steady_state(&SteadyStateConfig::default()).unwrap();
        assert!(res.iterations <= 4, "took {} updates", res.iterations);
        assert!(res.residual_norm < 1e-8);
        let x = sim.domain().interior_x().to_owned();
        let exact = x.mapv(|xk| 1.0 + 2.0 * xk);
        let u = sim.domain().interior().column(0).to_owned();
        assert!(max_deviation(u.iter(), exact.iter()) < 1e-7);
    }
}

#[test]
fn split_matches_full_for_every_split_location() {
    let mut full = chain(12);
    full.steady_state(&SteadyStateConfig::default()).unwrap();
    for split_loc in 1..3 {
        let mut split = chain(12);
        let config = SteadyStateConfig {
            split: Some(SplitConfig::new(split_loc)),
            ..SteadyStateConfig::default()
        };
        let res = split.steady_state(&config).unwrap();
        assert!(res.residual_norm < config.newton.tolerance);
        let dev = max_deviation(
            split.domain().interior().iter(),
            full.domain().interior().iter(),
        );
        assert!(dev < 1e-6, "split_loc {}: deviation {:.3e}", split_loc, dev);
    }
}

#[test]
fn analytic_jacobian_is_used() {
    // A = [[-2, 1], [1, -3]] and b = [1, 2] give u = v = 1
    let model = LocalLinear::new(
        nd::array![[-2.0, 1.0], [1.0, -3.0]],
        nd::array![1.0, 2.0],
    );
    let calls = model.counter();
    for layout_split in [None, Some(SplitConfig::new(1))] {
        let domain = Domain::new(5, 1, (0.0, 1.0), &["u", "v"]).unwrap();
        let mut sim = Simulation::new(
            domain,
            LocalLinear::new(model.a.clone(), model.b.clone()),
            &InitialConditions::new().set("u", IC::Constant(4.0)),
            &BoundarySpec::new().both("u", BC::Outflow).both("v", BC::Outflow),
        )
        .unwrap();
        let config = SteadyStateConfig { split: layout_split, ..SteadyStateConfig::default() };
        sim.steady_state(&config).unwrap();
        sim.domain().interior().iter()
            .for_each(|uk| { assert_abs_diff_eq!(*uk, 1.0, epsilon = 1e-10); });
    }

    let domain = Domain::new(5, 1, (0.0, 1.0), &["u", "v"]).unwrap();
    let mut sim = Simulation::new(
        domain,
        model,
        &InitialConditions::new(),
        &BoundarySpec::new().both("u", BC::Outflow).both("v", BC::Outflow),
    )
    .unwrap();
    let res = sim.steady_state(&SteadyStateConfig::default()).unwrap();
    // exact Jacobian of a linear system
    assert_eq!(res.iterations, 1);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn analytic_jacobian_of_wrong_size() {
    let mut model = LocalLinear::new(nd::array![[-1.0]], nd::array![1.0]);
    model.broken = true;
    let domain = Domain::new(4, 1, (0.0, 1.0), &["u"]).unwrap();
    let mut sim = Simulation::new(
        domain,
        model,
        &InitialConditions::new(),
        &BoundarySpec::new().both("u", BC::Outflow),
    )
    .unwrap();
    let err = sim.steady_state(&SteadyStateConfig::default()).unwrap_err();
    assert!(matches!(err, FdmError::Solve(SolveError::Length(_))));
}

#[test]
fn iterates_stay_inside_bounds() {
    let bounds = transport_bounds();
    for policy in [BoundsPolicy::Clip, BoundsPolicy::Reject] {
        let mut sim = transport(20);
        // start inside the box for the rejecting policy
        sim.set_variable("w", &nd::Array1::from_elem(20, 0.5)).unwrap();
        let nx = sim.domain().nx();
        let layout = StateLayout::Split(1);
        let state_bounds = bounds.extend(layout, nx);
        let config = NewtonConfig { bounds_policy: policy, ..NewtonConfig::default() };
        let mut rec = Recorder::new(sim.system(layout));
        let x0 = rec.inner.state();
        let cut = layout.cut(nx).unwrap();
        let (x, conv) = split_newton(
            &mut rec, x0, cut, &SplitConfig::new(1), &config, Some(&state_bounds))
            .unwrap();
        assert!(conv.residual_norm < config.tolerance);
        assert!(state_bounds.contains(&x));
        assert!(!rec.visited.is_empty());
        assert!(rec.visited.iter().all(|xk| state_bounds.contains(xk)));
    }
}

#[test]
fn initial_state_outside_bounds() {
    let bounds = transport_bounds();
    let mut sim = transport(20);
    sim.set_variable("u", &nd::Array1::from_elem(20, 7.0)).unwrap();
    let layout = StateLayout::CellMajor;
    let state_bounds = bounds.extend(layout, 20);

    // clipped into the box before the first evaluation
    let mut rec = Recorder::new(sim.system(layout));
    let x0 = rec.inner.state();
    newton(&mut rec, x0.clone(), &NewtonConfig::default(), Some(&state_bounds)).unwrap();
    assert!(rec.visited.iter().all(|xk| state_bounds.contains(xk)));

    // or refused outright
    let config = NewtonConfig { bounds_policy: BoundsPolicy::Reject, ..NewtonConfig::default() };
    let err = newton(&mut rec, x0, &config, Some(&state_bounds)).unwrap_err();
    assert!(matches!(err, SolveError::BoundsViolation { value, upper, .. } if value == 7.0 && upper == 5.0));
}

#[test]
fn bounds_violation_reports_cell_and_variable() {
    let bounds = transport_bounds();
    let mut sim = transport(20);
    let mut w = nd::Array1::from_elem(20, 2.0);
    w[13] = 9.0;
    sim.set_variable("w", &w).unwrap();
    let config = NewtonConfig { bounds_policy: BoundsPolicy::Reject, ..NewtonConfig::default() };
    for layout in [StateLayout::CellMajor, StateLayout::Split(1), StateLayout::Split(2)] {
        let state_bounds = bounds.extend(layout, 20);
        let mut system = sim.system(layout);
        let x0 = system.state();
        let err = newton(&mut system, x0, &config, Some(&state_bounds)).unwrap_err();
        assert!(
            matches!(err, SolveError::BoundsViolation { cell: 13, var: 2, .. }),
            "{:?}: {}", layout, err,
        );
    }
}

#[test]
fn iteration_cap_is_a_failure() {
    let domain = Domain::new(16, 1, (0.0, 1.0), &["u"]).unwrap();
    let model = EquationModel::new("burgers").with(Burgers::new(0.05, vec![0]));
    let mut sim = Simulation::new(
        domain,
        model,
        &InitialConditions::new(),
        &BoundarySpec::new().pair("u", BC::Dirichlet(1.0), BC::Dirichlet(-1.0)),
    )
    .unwrap();
    let before = sim.domain().interior().to_owned();
    let config = SteadyStateConfig {
        newton: NewtonConfig { max_iterations: 1, ..NewtonConfig::default() },
        ..SteadyStateConfig::default()
    };
    let err = sim.steady_state(&config).unwrap_err();
    match err {
        FdmError::Solve(SolveError::ConvergenceFailure { iterations, residual_norm }) => {
            assert_eq!(iterations, 1);
            assert!(residual_norm > config.newton.tolerance);
        },
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(sim.domain().interior(), before);
}

#[test]
fn pseudo_time_and_line_search_reach_the_same_state() {
    let mut plain = chain(10);
    plain.steady_state(&SteadyStateConfig::default()).unwrap();
    let mut damped = chain(10);
    let config = SteadyStateConfig {
        newton: NewtonConfig {
            armijo: true,
            pseudo_time: Some(Default::default()),
            ..NewtonConfig::default()
        },
        ..SteadyStateConfig::default()
    };
    let res = damped.steady_state(&config).unwrap();
    assert!(res.iterations > 1);
    assert!(
        max_deviation(plain.domain().interior().iter(), damped.domain().interior().iter())
            < 1e-6
    );
}

#[test]
fn split_keeps_pseudo_time_growth_across_cycles() {
    for armijo in [false, true] {
        let newton_config = NewtonConfig {
            armijo,
            pseudo_time: Some(Default::default()),
            ..NewtonConfig::default()
        };
        let mut full = chain(10);
        full.steady_state(
            &SteadyStateConfig { newton: newton_config, ..SteadyStateConfig::default() }
        ).unwrap();
        for split_loc in 1..3 {
            let mut split = chain(10);
            let config = SteadyStateConfig {
                newton: newton_config,
                split: Some(SplitConfig::new(split_loc)),
                ..SteadyStateConfig::default()
            };
            let res = split.steady_state(&config).unwrap();
            assert!(res.residual_norm < config.newton.tolerance);
            let dev = max_deviation(
                split.domain().interior().iter(),
                full.domain().interior().iter(),
            );
            assert!(
                dev < 1e-6,
                "armijo {}, split_loc {}: deviation {:.3e}", armijo, split_loc, dev,
            );
        }
    }
}
