mod common;

use approx::assert_abs_diff_eq;
use splitfdm::{
    layout::VariableBounds,
    model::Model,
    simulation::SteadyStateConfig,
    split_newton::SplitConfig,
    utils::array_diff,
};
use common::transport;

#[test]
fn evolve_then_split_steady_state() {
    let mut sim = transport(20);
    assert_eq!(sim.domain().nx(), 20);
    assert_eq!(sim.domain().ng(), 2);
    let nb = sim.model().stencil_width();

    // one explicit step only moves cells whose residual was nonzero
    let before = sim.domain().interior().to_owned();
    let r = sim.residuals();
    sim.evolve(0.1).unwrap();
    let after = sim.domain().interior().to_owned();
    let active: Vec<Vec<usize>>
        = (0..3)
        .map(|v| (0..20).filter(|&i| r[[i, v]] != 0.0).collect())
        .collect();
    for v in 0..3 {
        for i in 0..20 {
            if after[[i, v]] != before[[i, v]] {
                assert!(
                    active[v].iter().any(|&j| i.abs_diff(j) <= nb),
                    "cell {} of variable {} changed away from any active cell", i, v,
                );
                assert!(r[[i, v]] != 0.0);
            }
        }
    }
    // `w` sits at its boundary value and `v` is flat away from the ramp
    assert!(active[2].is_empty());
    assert_eq!(after.column(2), before.column(2));
    assert!(active[1].iter().all(|&i| (7..=12).contains(&i)));
    assert_eq!(after[[0, 1]], 3.0);
    assert_eq!(after[[19, 1]], 4.0);
    assert!(active[0].len() > 10);

    let bounds = VariableBounds::new(vec![-1.0, -2.0, 0.0], vec![5.0, 4.0, 3.0]);
    let config = SteadyStateConfig {
        split: Some(SplitConfig::new(1)),
        bounds: Some(bounds.clone()),
        ..SteadyStateConfig::default()
    };
    let res = sim.steady_state(&config).unwrap();
    assert!(res.iterations > 0 && res.iterations < 1000);
    assert!(res.residual_norm < config.newton.tolerance);
    assert!(sim.residual_norm() < config.newton.tolerance);

    let state = sim.domain().interior();
    for (v, column) in state.columns().into_iter().enumerate() {
        assert!(column.iter().all(|x| bounds.lower[v] <= *x && *x <= bounds.upper[v]));
    }
    // periodic relaxation settles at its target, `w` at its boundary value,
    // and `v` rises monotonically from 3 to 4
    state.column(0).iter().for_each(|u| { assert_abs_diff_eq!(*u, 1.0, epsilon = 1e-7); });
    state.column(2).iter().for_each(|w| { assert_abs_diff_eq!(*w, 2.0, epsilon = 1e-7); });
    let v = state.column(1).to_owned();
    assert!(array_diff(&v).iter().all(|dv| *dv > 0.0));
    assert!(v.iter().all(|vk| 3.0 < *vk && *vk < 4.0));
}
