use std::f64::consts::PI;
use approx::assert_abs_diff_eq;
use ndarray as nd;
use splitfdm::{
    bc::{ BoundaryCondition as BC, BoundarySpec, Side },
    derivatives::{ Scheme, d2x, dx },
    domain::Domain,
    error::ConfigError,
    ic::{ InitialCondition as IC, InitialConditions },
    model::EquationModel,
    equations::Diffusion,
    simulation::Simulation,
};

fn filled(nx: usize, ng: usize) -> Domain {
    let mut d = Domain::new(nx, ng, (-1.0, 2.0), &["u", "v"]).unwrap();
    let u: nd::Array1<f64> = (0..nx).map(|i| (3 * i * i + 1) as f64).collect();
    let v: nd::Array1<f64> = (0..nx).map(|i| (i as f64 * 0.7).sin()).collect();
    d.set_variable(0, &u).unwrap();
    d.set_variable(1, &v).unwrap();
    d
}

#[test]
fn periodic_ghosts_for_every_ghost_depth() {
    for nx in 1..=7 {
        for ng in 1..=nx {
            let mut d = filled(nx, ng);
            BoundarySpec::new()
                .both("u", BC::Periodic)
                .both("v", BC::Periodic)
                .resolve(d.variables())
                .unwrap()
                .apply(&mut d);
            let interior = d.interior().to_owned();
            for var in 0..2 {
                for k in 1..=ng {
                    assert_eq!(d.ghost(Side::Left, k, var), interior[[nx - k, var]]);
                    assert_eq!(d.ghost(Side::Right, k, var), interior[[k - 1, var]]);
                }
            }
        }
    }
}

#[test]
fn too_many_ghosts() {
    let err = Domain::new(3, 4, (0.0, 1.0), &["u"]).unwrap_err();
    assert!(matches!(err, ConfigError::TooManyGhosts { ng: 4, nx: 3 }));
    let err = Domain::new(3, 0, (0.0, 1.0), &["u"]).unwrap_err();
    assert!(matches!(err, ConfigError::NoGhosts));
}

#[test]
fn dirichlet_face_value() {
    for ng in 1..=3 {
        let mut d = filled(9, ng);
        BoundarySpec::new()
            .pair("u", BC::Dirichlet(-2.5), BC::Dirichlet(0.125))
            .pair("v", BC::Dirichlet(1e3), BC::Periodic)
            .resolve(d.variables())
            .unwrap()
            .apply(&mut d);
        let interior = d.interior().to_owned();
        // every mirror pair straddles the face symmetrically
        for k in 1..=ng {
            let left = 0.5 * (d.ghost(Side::Left, k, 0) + interior[[k - 1, 0]]);
            let right = 0.5 * (d.ghost(Side::Right, k, 0) + interior[[9 - k, 0]]);
            assert_abs_diff_eq!(left, -2.5, epsilon = 1e-12);
            assert_abs_diff_eq!(right, 0.125, epsilon = 1e-12);
            let left_v = 0.5 * (d.ghost(Side::Left, k, 1) + interior[[k - 1, 1]]);
            assert_abs_diff_eq!(left_v, 1e3, epsilon = 1e-9);
        }
        // mixed sides keep the periodic wrap on the right
        assert_eq!(d.ghost(Side::Right, 1, 1), interior[[0, 1]]);
    }
}

#[test]
fn periodic_derivatives_on_nonuniform_mesh() {
    let x = nd::array![0.1, 0.3, 0.5, 0.7, 0.85, 0.93, 0.97, 0.99];
    let mut d = Domain::from_coordinates(x, 1, (0.0, 1.0), &["u"]).unwrap();
    let u = d.interior_x().mapv(|xk| (2.0 * PI * xk).sin());
    d.set_variable(0, &u).unwrap();
    BoundarySpec::new()
        .both("u", BC::Periodic)
        .resolve(d.variables())
        .unwrap()
        .apply(&mut d);
    // the wrapped neighbors sit one period away from their sources
    let st = d.stencil(0, 1);
    assert_abs_diff_eq!(st.x(-1, 0), -0.01, epsilon = 1e-15);
    assert_abs_diff_eq!(dx(&st, 0, Scheme::Central), 4.460207, epsilon = 1e-6);
    assert_abs_diff_eq!(d2x(&st, 0), -26.438509, epsilon = 1e-6);
    let exact_dx = 2.0 * PI * (2.0 * PI * 0.1).cos();
    let exact_d2x = -(2.0 * PI).powi(2) * (2.0 * PI * 0.1).sin();
    assert!((dx(&st, 0, Scheme::Central) - exact_dx).abs() < 1.0);
    assert!((d2x(&st, 0) - exact_d2x).abs() < 4.0);

    let st = d.stencil(7, 1);
    assert_abs_diff_eq!(st.x(1, 0), 1.1, epsilon = 1e-15);
    let exact_dx = 2.0 * PI * (2.0 * PI * 0.99).cos();
    assert!((dx(&st, 0, Scheme::Central) - exact_dx).abs() < 0.1);
}

#[test]
fn neumann_on_nonuniform_mesh() {
    let x = nd::array![0.05, 0.1, 0.3, 0.55, 0.9];
    let mut d = Domain::from_coordinates(x, 2, (0.0, 1.0), &["u"]).unwrap();
    d.set_variable(0, &nd::array![4.0, 1.0, 0.0, 2.0, -3.0]).unwrap();
    BoundarySpec::new()
        .pair("u", BC::Neumann(0.75), BC::Neumann(-2.0))
        .resolve(d.variables())
        .unwrap()
        .apply(&mut d);
    let xs = d.x(0).to_owned();
    let us = d.values().column(0).to_owned();
    let (ilo, ihi) = (d.ilo(), d.ihi());
    for k in 1..=2 {
        let (g, m) = (ilo - k, ilo + k - 1);
        assert_abs_diff_eq!((us[m] - us[g]) / (xs[m] - xs[g]), 0.75, epsilon = 1e-12);
        let (g, m) = (ihi + k, ihi + 1 - k);
        assert_abs_diff_eq!((us[g] - us[m]) / (xs[g] - xs[m]), -2.0, epsilon = 1e-12);
    }
    // ghost coordinates mirror the interior about the faces
    assert_abs_diff_eq!(xs[ilo - 1], -0.05, epsilon = 1e-15);
    assert_abs_diff_eq!(xs[ihi + 2], 1.45, epsilon = 1e-15);
}

#[test]
fn missing_and_unknown_boundaries_fail_at_construction() {
    let build = |bcs: BoundarySpec| {
        let domain = Domain::new(6, 1, (0.0, 1.0), &["u", "v"]).unwrap();
        let model = EquationModel::new("heat").with(Diffusion::new(1.0, vec![0, 1]));
        Simulation::new(domain, model, &InitialConditions::new(), &bcs)
    };
    let err = build(BoundarySpec::new().both("u", BC::Outflow).left("v", BC::Outflow))
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingBoundary { ref var, side: Side::Right } if var == "v"));
    let err = build(
        BoundarySpec::new()
            .both("u", BC::Outflow)
            .both("v", BC::Outflow)
            .both("w", BC::Periodic)
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownVariable(ref v) if v == "w"));
}

#[test]
fn ungoverned_and_out_of_range_equations() {
    let bcs = BoundarySpec::new().both("u", BC::Outflow).both("v", BC::Outflow);
    let domain = Domain::new(6, 1, (0.0, 1.0), &["u", "v"]).unwrap();
    let model = EquationModel::new("half").with(Diffusion::new(1.0, vec![0]));
    let err = Simulation::new(domain, model, &InitialConditions::new(), &bcs).unwrap_err();
    assert!(matches!(err, ConfigError::UngovernedVariable(ref v) if v == "v"));

    let domain = Domain::new(6, 1, (0.0, 1.0), &["u", "v"]).unwrap();
    let model = EquationModel::new("over").with(Diffusion::new(1.0, vec![0, 1, 2]));
    let err = Simulation::new(domain, model, &InitialConditions::new(), &bcs).unwrap_err();
    assert!(matches!(err, ConfigError::EquationOutOfRange { index: 2, nv: 2, .. }));
}

#[test]
fn boundary_spec_from_json() {
    let json = r#"{
        "u": { "left": "periodic", "right": "periodic" },
        "v": { "left": { "dirichlet": 3.0 }, "right": { "dirichlet": 4.0 } },
        "w": { "left": { "dirichlet": 2.0 }, "right": "periodic" }
    }"#;
    let spec: BoundarySpec = serde_json::from_str(json).unwrap();
    let expected = BoundarySpec::new()
        .both("u", BC::Periodic)
        .pair("v", BC::Dirichlet(3.0), BC::Dirichlet(4.0))
        .left("w", BC::Dirichlet(2.0))
        .right("w", BC::Periodic);
    assert_eq!(spec, expected);

    let ics: InitialConditions = serde_json::from_str(r#"{
        "u": { "gaussian": { "center": 0.5, "width": 0.1, "amplitude": 1.0 } },
        "v": { "rarefaction": { "start": 0.45, "end": 0.55, "left": 3.0, "right": 4.0 } }
    }"#).unwrap();
    assert_eq!(ics.get("u"), Some(&IC::gaussian(0.5, 0.1, 1.0)));
    assert_eq!(ics.get("v"), Some(&IC::rarefaction(0.45, 0.55, 3.0, 4.0)));

    // an unknown policy name is rejected while parsing
    let bad = r#"{ "u": { "left": "reflecting", "right": "periodic" } }"#;
    assert!(serde_json::from_str::<BoundarySpec>(bad).is_err());
}
