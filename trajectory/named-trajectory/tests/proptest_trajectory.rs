//! Property-based tests for trajectory layout, aliasing and rebuilding.
//!
//! Run with: cargo test -p named-trajectory -- proptest

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use named_trajectory::{BoundSpec, NamedTrajectory, CONTROLS, STATES};
use nalgebra::DMatrix;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Block row counts and control flags; at least one block is a control.
fn arb_blocks() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((1usize..5, any::<bool>()), 1..7).prop_map(|mut blocks| {
        if !blocks.iter().any(|(_, control)| *control) {
            if let Some(last) = blocks.last_mut() {
                last.1 = true;
            }
        }
        blocks
    })
}

fn arb_trajectory() -> impl Strategy<Value = NamedTrajectory> {
    (arb_blocks(), 1usize..8).prop_map(|(blocks, timesteps)| build(&blocks, timesteps))
}

fn build(blocks: &[(usize, bool)], timesteps: usize) -> NamedTrajectory {
    let mut builder = NamedTrajectory::builder().timestep(0.1);
    let mut offset = 0;
    for (i, (rows, control)) in blocks.iter().enumerate() {
        let name = format!("b{i}");
        let base = offset;
        builder = builder.block(
            name.clone(),
            DMatrix::from_fn(*rows, timesteps, |r, t| ((base + r) * 100 + t) as f64),
        );
        if *control {
            builder = builder.control(name);
        }
        offset += rows;
    }
    builder.build().unwrap()
}

// =============================================================================
// Property Tests: Layout
// =============================================================================

proptest! {
    /// Declared blocks tile 0..dim exactly once, in declaration order.
    #[test]
    fn declared_blocks_partition_rows(traj in arb_trajectory()) {
        let mut rows = Vec::new();
        for name in traj.names() {
            let component = traj.component(name).unwrap();
            prop_assert!(component.is_contiguous());
            prop_assert_eq!(component.len(), traj.dim_of(name).unwrap());
            rows.extend(component.indices());
        }
        let expected: Vec<usize> = (0..traj.dim()).collect();
        prop_assert_eq!(rows, expected);
    }

    /// States and controls are disjoint and cover every row.
    #[test]
    fn aggregates_partition_rows(traj in arb_trajectory()) {
        let states = traj.component(STATES).unwrap();
        let controls = traj.component(CONTROLS).unwrap();

        prop_assert_eq!(
            traj.dim_of(STATES).unwrap() + traj.dim_of(CONTROLS).unwrap(),
            traj.dim()
        );
        prop_assert!(!controls.is_empty());
        for row in 0..traj.dim() {
            prop_assert!(states.contains(row) != controls.contains(row));
        }

        let control_rows: usize = traj
            .control_names()
            .iter()
            .map(|name| traj.dim_of(name).unwrap())
            .sum();
        prop_assert_eq!(control_rows, controls.len());
    }

    /// Blocks are stacked in declaration order.
    #[test]
    fn blocks_hold_their_input(traj in arb_trajectory()) {
        for (row, col) in (0..traj.dim()).flat_map(|r| (0..traj.len()).map(move |c| (r, c))) {
            prop_assert_eq!(traj.data()[(row, col)], (row * 100 + col) as f64);
        }
    }
}

// =============================================================================
// Property Tests: Aliasing
// =============================================================================

proptest! {
    /// Writes through the matrix show up in block views, knot points and
    /// component views, and writes through a block show up in the matrix.
    #[test]
    fn views_alias_the_matrix(traj in arb_trajectory(), seed in any::<u32>()) {
        let mut traj = traj;
        let row = seed as usize % traj.dim();
        let col = (seed as usize / 7) % traj.len();
        let value = -1.0 - f64::from(seed % 1000);

        traj.data_mut()[(row, col)] = value;

        let (name, rows) = traj
            .layout()
            .blocks()
            .find(|(_, rows)| rows.contains(&row))
            .map(|(name, rows)| (name.to_string(), rows))
            .unwrap();
        prop_assert_eq!(traj.block(&name).unwrap()[(row - rows.start, col)], value);
        prop_assert_eq!(traj.knot_point(col).unwrap().get(&name).unwrap()[row - rows.start], value);

        let aggregate = if traj.is_control(&name) { CONTROLS } else { STATES };
        let view = traj.component_view(aggregate).unwrap();
        let position = view.component().indices().position(|r| r == row).unwrap();
        prop_assert_eq!(view.get(position, col), Some(value));

        traj.block_mut(&name).unwrap()[(row - rows.start, col)] = 0.5;
        prop_assert_eq!(traj.as_slice()[col * traj.dim() + row], 0.5);
    }
}

// =============================================================================
// Property Tests: Bounds and Rebuilding
// =============================================================================

proptest! {
    /// A symmetric bound `v` normalizes to `(-v, v)` and recovers `v`.
    #[test]
    fn symmetric_bounds_round_trip(radius in prop::collection::vec(0.0..100.0f64, 1..6)) {
        let rows = radius.len();
        let traj = NamedTrajectory::builder()
            .block("x", DMatrix::zeros(rows, 2))
            .block("u", DMatrix::zeros(1, 2))
            .control("u")
            .timestep(0.1)
            .bound("x", radius.clone())
            .build()
            .unwrap();

        let bounds = traj.bound("x").unwrap();
        let negated: Vec<f64> = radius.iter().map(|v| -v).collect();
        prop_assert_eq!(bounds.upper().as_slice(), radius.as_slice());
        prop_assert_eq!(bounds.lower().as_slice(), negated.as_slice());
        prop_assert_eq!(bounds.symmetric_radius().unwrap().as_slice(), radius.as_slice());
        prop_assert_eq!(BoundSpec::symmetric(radius.clone()).normalize(), bounds.clone());
    }

    /// Rebuilding from a copy of the buffer changes nothing.
    #[test]
    fn rebuild_from_copy_is_identical(traj in arb_trajectory()) {
        let rebuilt = traj.rebuild_from_vec(traj.to_vec()).unwrap();

        prop_assert!(rebuilt.shares_meta_with(&traj));
        prop_assert_eq!(rebuilt.dims(), traj.dims());
        prop_assert_eq!(rebuilt.components(), traj.components());
        prop_assert_eq!(rebuilt.names(), traj.names());
        prop_assert_eq!(rebuilt.bounds(), traj.bounds());
        prop_assert_eq!(rebuilt.data(), traj.data());
    }

    /// Any other buffer length is rejected.
    #[test]
    fn rebuild_rejects_other_lengths(traj in arb_trajectory(), delta in 1usize..4) {
        let len = traj.dim() * traj.len();
        prop_assert!(traj.rebuild_from_vec(vec![0.0; len + delta]).is_err());
        if delta <= len {
            let err = traj.rebuild_from_vec(vec![0.0; len - delta]).unwrap_err();
            prop_assert!(err.is_configuration());
        }
    }
}
