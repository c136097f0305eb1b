//! End-to-end construction scenarios.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use named_trajectory::{NamedTrajectory, Timestep, TrajectoryError, CONTROLS, STATES};
use nalgebra::DMatrix;

fn two_block_builder() -> named_trajectory::TrajectoryBuilder {
    NamedTrajectory::builder()
        .block("x", DMatrix::from_element(3, 5, 1.0))
        .block("u", DMatrix::from_element(2, 5, 0.0))
        .controls(["u"])
        .timestep(0.1)
}

#[test]
fn state_and_control_blocks_resolve_in_order() {
    let traj = two_block_builder().build().unwrap();

    assert_eq!(traj.dim(), 5);
    assert_eq!(traj.dims().len(), 4);
    assert_eq!(traj.dims()["x"], 3);
    assert_eq!(traj.dims()["u"], 2);
    assert_eq!(traj.dims()[STATES], 3);
    assert_eq!(traj.dims()[CONTROLS], 2);

    let components = traj.components();
    assert_eq!(components["x"].as_range(), Some(0..3));
    assert_eq!(components["u"].as_range(), Some(3..5));
    assert_eq!(components[STATES].as_range(), Some(0..3));
    assert_eq!(components[CONTROLS].as_range(), Some(3..5));
}

#[test]
fn symmetric_bound_is_normalized() {
    let traj = two_block_builder()
        .bound("x", [1.0, 2.0, 3.0])
        .build()
        .unwrap();

    assert_eq!(traj.bounds().len(), 1);
    let bounds = &traj.bounds()["x"];
    assert_eq!(bounds.lower().as_slice(), &[-1.0, -2.0, -3.0]);
    assert_eq!(bounds.upper().as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn knot_point_past_the_end_is_an_index_error() {
    let traj = two_block_builder().build().unwrap();

    for t in [5, 6] {
        let err = traj.knot_point(t).unwrap_err();
        assert!(err.is_index());
        assert!(!err.is_configuration());
        assert!(matches!(err, TrajectoryError::KnotPointOutOfRange { len: 5, .. }));
    }
    assert!(traj.knot_point(4).is_ok());
}

#[test]
fn short_initial_value_is_a_configuration_error() {
    let err = two_block_builder()
        .initial("x", [1.0, 2.0])
        .build()
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(
        err,
        TrajectoryError::DimensionMismatch {
            context: "initial",
            expected: 3,
            found: 2,
            ..
        }
    ));
}

#[test]
fn bound_on_undeclared_block_is_a_configuration_error() {
    let err = two_block_builder()
        .bound("z", [1.0])
        .build()
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(matches!(
        err,
        TrajectoryError::UnknownName { context: "bounds", .. }
    ));
}

#[test]
fn interleaved_controls_give_split_aggregates() {
    let traj = NamedTrajectory::builder()
        .block("x", DMatrix::from_element(2, 3, 1.0))
        .block("u", DMatrix::from_element(1, 3, 2.0))
        .block("dx", DMatrix::from_element(2, 3, 3.0))
        .controls(["u"])
        .timestep(0.1)
        .build()
        .unwrap();

    assert_eq!(traj.component(STATES).unwrap().segments(), &[0..2, 3..5]);
    assert!(matches!(
        traj.block(STATES),
        Err(TrajectoryError::NonContiguousComponent(_))
    ));

    let states = traj.component_view(STATES).unwrap();
    assert_eq!(states.shape(), (4, 3));
    assert_eq!(states.to_matrix().row(2)[0], 3.0);
    assert_eq!(traj.block(CONTROLS).unwrap().shape(), (1, 3));
}

#[test]
fn rebuild_from_an_optimizer_vector() {
    let traj = NamedTrajectory::builder()
        .block("x", DMatrix::zeros(2, 4))
        .row("u", [0.0; 4])
        .row("dt", [0.5; 4])
        .controls(["u", "dt"])
        .timestep(Timestep::dynamical("dt"))
        .build()
        .unwrap();

    let step: Vec<f64> = traj
        .as_slice()
        .iter()
        .enumerate()
        .map(|(i, v)| if i % traj.dim() == 3 { *v } else { v + 1.0 })
        .collect();
    let next = traj.rebuild_from_vec(step).unwrap();

    assert!(next.shares_meta_with(&traj));
    assert_eq!(next.block("x").unwrap().sum(), 8.0);
    assert_eq!(next.timesteps().as_slice(), &[0.5; 4]);
    assert_eq!(next.times()[3], 1.5);
    assert_eq!(traj.block("x").unwrap().sum(), 0.0);
}
