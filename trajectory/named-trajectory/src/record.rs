//! Flat, serializable form of a trajectory.

use std::ops::Range;

use hashbrown::HashMap;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::builder::TrajectoryBuilder;
use crate::error::{Result, TrajectoryError};
use crate::metadata::{sorted, MetadataSpec};
use crate::timestep::Timestep;
use crate::trajectory::NamedTrajectory;

/// Every field of a [`NamedTrajectory`] in plain serde-friendly types.
///
/// Converting a record back into a trajectory runs the flat-buffer builder,
/// so a record that violates any layout or metadata invariant is rejected.
/// Tables are written in a stable order (declaration order for blocks,
/// sorted by name for metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Row count of the matrix.
    pub nrows: usize,
    /// Column count of the matrix.
    pub ncols: usize,
    /// Column-major matrix data.
    pub data: Vec<f64>,
    /// Timestep policy.
    pub timestep: Timestep,
    /// Row range of every declared block, in declaration order.
    pub components: Vec<(String, Range<usize>)>,
    /// Control block names.
    pub controls: Vec<String>,
    /// `(name, lower, upper)` bounds.
    pub bounds: Vec<(String, Vec<f64>, Vec<f64>)>,
    /// Initial values.
    pub initial: Vec<(String, Vec<f64>)>,
    /// Final values.
    pub final_values: Vec<(String, Vec<f64>)>,
    /// Goal values.
    pub goal: Vec<(String, Vec<f64>)>,
}

fn table(entries: &HashMap<String, DVector<f64>>) -> Vec<(String, Vec<f64>)> {
    sorted(entries)
        .into_iter()
        .map(|(name, values)| (name.clone(), values.as_slice().to_vec()))
        .collect()
}

impl From<&NamedTrajectory> for TrajectoryRecord {
    fn from(traj: &NamedTrajectory) -> Self {
        Self {
            nrows: traj.dim(),
            ncols: traj.len(),
            data: traj.to_vec(),
            timestep: traj.timestep().clone(),
            components: traj
                .layout()
                .blocks()
                .map(|(name, rows)| (name.to_string(), rows))
                .collect(),
            controls: traj.control_names().to_vec(),
            bounds: sorted(traj.bounds())
                .into_iter()
                .map(|(name, bounds)| {
                    (
                        name.clone(),
                        bounds.lower().as_slice().to_vec(),
                        bounds.upper().as_slice().to_vec(),
                    )
                })
                .collect(),
            initial: table(traj.initial()),
            final_values: table(traj.final_values()),
            goal: table(traj.goal()),
        }
    }
}

impl From<NamedTrajectory> for TrajectoryRecord {
    fn from(traj: NamedTrajectory) -> Self {
        Self::from(&traj)
    }
}

/// Checks that the ranges tile `0..nrows` before any of them is expanded.
fn check_rows(components: &[(String, Range<usize>)], nrows: usize) -> Result<()> {
    let mut next = 0;
    for (name, rows) in components {
        if rows.start != next || rows.end < rows.start || rows.end > nrows {
            return Err(TrajectoryError::invalid_components(format!(
                "block {name:?} has rows {rows:?}, expected a range starting at {next} within 0..{nrows}"
            )));
        }
        next = rows.end;
    }
    Ok(())
}

impl TryFrom<TrajectoryRecord> for NamedTrajectory {
    type Error = TrajectoryError;

    fn try_from(record: TrajectoryRecord) -> Result<Self> {
        let expected = record.nrows.checked_mul(record.ncols).ok_or_else(|| {
            TrajectoryError::invalid_components(format!(
                "{} x {} matrix is too large",
                record.nrows, record.ncols
            ))
        })?;
        if record.data.len() != expected {
            return Err(TrajectoryError::BufferLengthMismatch {
                expected,
                found: record.data.len(),
            });
        }
        check_rows(&record.components, record.nrows)?;

        let mut metadata = MetadataSpec::new();
        for (name, lower, upper) in record.bounds {
            metadata.insert_bound(name, (lower, upper));
        }
        for (name, values) in record.initial {
            metadata.insert_initial(name, DVector::from_vec(values));
        }
        for (name, values) in record.final_values {
            metadata.insert_final(name, DVector::from_vec(values));
        }
        for (name, values) in record.goal {
            metadata.insert_goal(name, DVector::from_vec(values));
        }

        let data = DMatrix::from_vec(record.nrows, record.ncols, record.data);
        let mut builder = TrajectoryBuilder::from_matrix(data)
            .controls(record.controls)
            .timestep(record.timestep)
            .metadata(metadata);
        for (name, rows) in record.components {
            builder = builder.component(name, rows);
        }
        builder.build()
    }
}
