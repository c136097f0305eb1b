//! Staged construction of [`NamedTrajectory`].
//!
//! A builder starts from one of two sources:
//!
//! - [`Blocks`]: named matrices that are stacked row-wise in declaration
//!   order (see [`NamedTrajectory::builder`]).
//! - [`Flat`]: an existing buffer plus an explicit row partition, wrapped
//!   without copying (see [`NamedTrajectory::from_matrix`] and
//!   [`NamedTrajectory::from_flat`]).
//!
//! Control names, the timestep policy and per-block metadata are set the
//! same way for both. Nothing is validated until `build`.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{Result, TrajectoryError};
use crate::layout::BlockLayout;
use crate::metadata::{BoundSpec, MetadataSpec};
use crate::timestep::Timestep;
use crate::trajectory::{NamedTrajectory, TrajectoryMeta};

/// Source made of named blocks, each `rows x T`.
#[derive(Debug, Clone, Default)]
pub struct Blocks {
    blocks: Vec<(String, DMatrix<f64>)>,
}

/// Source made of a `dim x T` buffer and the rows of every block.
#[derive(Debug, Clone)]
pub struct Flat {
    data: FlatData,
    components: Vec<(String, Vec<usize>)>,
}

#[derive(Debug, Clone)]
enum FlatData {
    Matrix(DMatrix<f64>),
    Vec { values: Vec<f64>, timesteps: usize },
}

/// Builder for [`NamedTrajectory`].
///
/// # Example
///
/// ```
/// use named_trajectory::{BoundSpec, NamedTrajectory, Timestep};
/// use nalgebra::DMatrix;
///
/// let traj = NamedTrajectory::builder()
///     .block("x", DMatrix::zeros(2, 10))
///     .block("u", DMatrix::zeros(1, 10))
///     .row("dt", [0.1; 10])
///     .controls(["u", "dt"])
///     .timestep(Timestep::dynamical("dt"))
///     .bound("u", BoundSpec::scalar(-1.0, 1.0))
///     .initial("x", [0.0, 0.0])
///     .goal("x", [1.0, 0.0])
///     .build()
///     .unwrap();
///
/// assert_eq!(traj.dim(), 4);
/// assert_eq!(traj.control_names(), &["u", "dt"]);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TrajectoryBuilder<S = Blocks> {
    source: S,
    controls: Vec<String>,
    timestep: Option<Timestep>,
    metadata: MetadataSpec,
}

impl<S> TrajectoryBuilder<S> {
    fn with_source(source: S) -> Self {
        Self {
            source,
            controls: Vec::new(),
            timestep: None,
            metadata: MetadataSpec::new(),
        }
    }

    /// Marks one block as a control.
    pub fn control(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.controls.contains(&name) {
            self.controls.push(name);
        }
        self
    }

    /// Marks several blocks as controls.
    pub fn controls<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for name in names {
            self = self.control(name);
        }
        self
    }

    /// Sets the timestep policy; a plain `f64` gives a fixed timestep.
    pub fn timestep(mut self, timestep: impl Into<Timestep>) -> Self {
        self.timestep = Some(timestep.into());
        self
    }

    /// Sets the bounds of a block.
    pub fn bound(mut self, name: impl Into<String>, bound: impl Into<BoundSpec>) -> Self {
        self.metadata.insert_bound(name, bound);
        self
    }

    /// Sets the initial value of a block.
    pub fn initial(mut self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        self.metadata.insert_initial(name, collect(values));
        self
    }

    /// Sets the final value of a block.
    pub fn final_value(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        self.metadata.insert_final(name, collect(values));
        self
    }

    /// Sets the goal value of a block.
    pub fn goal(mut self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        self.metadata.insert_goal(name, collect(values));
        self
    }

    /// Replaces every metadata table at once.
    pub fn metadata(mut self, metadata: MetadataSpec) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validates metadata and timestep against `layout` and wraps `data`.
    fn finish(
        layout: BlockLayout,
        metadata: &MetadataSpec,
        timestep: Option<Timestep>,
        data: DMatrix<f64>,
    ) -> Result<NamedTrajectory> {
        let metadata = metadata.normalize(&layout)?;
        let timestep = timestep.ok_or(TrajectoryError::MissingTimestep)?;
        timestep.validate(&layout)?;
        let meta = TrajectoryMeta::new(layout, metadata, timestep);
        Ok(NamedTrajectory::from_parts(data, Arc::new(meta)))
    }
}

fn collect(values: impl IntoIterator<Item = f64>) -> DVector<f64> {
    DVector::from_vec(values.into_iter().collect())
}

impl TrajectoryBuilder<Blocks> {
    /// An empty builder.
    pub fn new() -> Self {
        Self::with_source(Blocks::default())
    }

    /// Appends a `rows x T` block.
    pub fn block(mut self, name: impl Into<String>, values: DMatrix<f64>) -> Self {
        self.source.blocks.push((name.into(), values));
        self
    }

    /// Appends a single-row block, one value per timestep.
    pub fn row(self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values.into_iter().collect();
        let block = DMatrix::from_row_slice(1, values.len(), &values);
        self.block(name, block)
    }

    /// Resolves the layout, validates metadata and stacks the blocks.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::NoBlocks`] if no block was added
    /// - [`TrajectoryError::ColumnMismatch`] if blocks disagree on `T`
    /// - [`TrajectoryError::EmptyTrajectory`] if `T == 0`
    /// - any layout error from [`BlockLayout::resolve`]
    /// - any metadata error from [`MetadataSpec::normalize`]
    /// - [`TrajectoryError::MissingTimestep`] / [`TrajectoryError::InvalidTimestep`]
    pub fn build(self) -> Result<NamedTrajectory> {
        let blocks = self.source.blocks;
        let timesteps = blocks
            .first()
            .map(|(_, values)| values.ncols())
            .ok_or(TrajectoryError::NoBlocks)?;
        for (name, values) in &blocks {
            if values.ncols() != timesteps {
                return Err(TrajectoryError::ColumnMismatch {
                    name: name.clone(),
                    expected: timesteps,
                    found: values.ncols(),
                });
            }
        }
        if timesteps == 0 {
            return Err(TrajectoryError::EmptyTrajectory);
        }

        let sizes: Vec<(&str, usize)> = blocks
            .iter()
            .map(|(name, values)| (name.as_str(), values.nrows()))
            .collect();
        let layout = BlockLayout::resolve(&sizes, &self.controls)?;

        let mut data = DMatrix::zeros(layout.dim(), timesteps);
        let mut offset = 0;
        for (_, values) in &blocks {
            data.rows_mut(offset, values.nrows()).copy_from(values);
            offset += values.nrows();
        }
        debug!(dim = layout.dim(), timesteps, "stacked trajectory blocks");

        Self::finish(layout, &self.metadata, self.timestep, data)
    }
}

impl Default for TrajectoryBuilder<Blocks> {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryBuilder<Flat> {
    /// Wraps an existing `dim x T` matrix.
    pub fn from_matrix(data: DMatrix<f64>) -> Self {
        Self::with_source(Flat {
            data: FlatData::Matrix(data),
            components: Vec::new(),
        })
    }

    /// Wraps a column-major buffer of `T` columns.
    ///
    /// The row count is the total number of rows assigned by
    /// [`component`](Self::component).
    pub fn from_vec(values: Vec<f64>, timesteps: usize) -> Self {
        Self::with_source(Flat {
            data: FlatData::Vec { values, timesteps },
            components: Vec::new(),
        })
    }

    /// Assigns rows to a block; blocks must tile `0..dim` in call order.
    pub fn component(mut self, name: impl Into<String>, rows: impl IntoIterator<Item = usize>) -> Self {
        self.source
            .components
            .push((name.into(), rows.into_iter().collect()));
        self
    }

    /// Validates the partition and metadata and wraps the buffer.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::EmptyTrajectory`] if `T == 0`
    /// - [`TrajectoryError::BufferLengthMismatch`] if a flat buffer does not
    ///   hold `dim * T` values
    /// - any error from [`BlockLayout::from_components`]
    /// - the metadata and timestep errors of the block builder
    pub fn build(self) -> Result<NamedTrajectory> {
        let Flat { data, components } = self.source;
        let data = match data {
            FlatData::Matrix(matrix) => matrix,
            FlatData::Vec { values, timesteps } => {
                if timesteps == 0 {
                    return Err(TrajectoryError::EmptyTrajectory);
                }
                let expected = components
                    .iter()
                    .try_fold(0usize, |dim, (_, rows)| dim.checked_add(rows.len()))
                    .and_then(|dim| dim.checked_mul(timesteps).map(|len| (dim, len)));
                let Some((dim, expected)) = expected else {
                    return Err(TrajectoryError::invalid_components(format!(
                        "{} blocks over {timesteps} timesteps do not fit in memory",
                        components.len()
                    )));
                };
                if values.len() != expected {
                    return Err(TrajectoryError::BufferLengthMismatch {
                        expected,
                        found: values.len(),
                    });
                }
                DMatrix::from_vec(dim, timesteps, values)
            }
        };
        if data.ncols() == 0 {
            return Err(TrajectoryError::EmptyTrajectory);
        }

        let layout = BlockLayout::from_components(&components, data.nrows(), &self.controls)?;
        debug!(dim = layout.dim(), timesteps = data.ncols(), "wrapped flat trajectory buffer");

        Self::finish(layout, &self.metadata, self.timestep, data)
    }
}

impl NamedTrajectory {
    /// Starts building a trajectory around an existing `dim x T` matrix.
    pub fn from_matrix(data: DMatrix<f64>) -> TrajectoryBuilder<Flat> {
        TrajectoryBuilder::<Flat>::from_matrix(data)
    }

    /// Starts building a trajectory around a column-major buffer.
    pub fn from_flat(values: Vec<f64>, timesteps: usize) -> TrajectoryBuilder<Flat> {
        TrajectoryBuilder::<Flat>::from_vec(values, timesteps)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{CONTROLS, STATES};

    fn blocks() -> TrajectoryBuilder {
        NamedTrajectory::builder()
            .block("x", DMatrix::from_element(3, 5, 1.0))
            .block("u", DMatrix::from_element(2, 5, 2.0))
            .controls(["u"])
            .timestep(0.1)
    }

    #[test]
    fn test_build_from_blocks() {
        let traj = blocks().build().unwrap();
        assert_eq!(traj.shape(), (5, 5));
        assert_eq!(traj.block("x").unwrap().sum(), 15.0);
        assert_eq!(traj.block("u").unwrap().sum(), 20.0);
    }

    #[test]
    fn test_missing_timestep() {
        let err = NamedTrajectory::builder()
            .block("u", DMatrix::zeros(1, 2))
            .control("u")
            .build()
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::MissingTimestep));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_no_blocks_and_no_controls() {
        let err = NamedTrajectory::builder().timestep(0.1).build().unwrap_err();
        assert!(matches!(err, TrajectoryError::NoBlocks));

        let err = NamedTrajectory::builder()
            .block("x", DMatrix::zeros(1, 2))
            .timestep(0.1)
            .build()
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::NoControls));
    }

    #[test]
    fn test_column_mismatch() {
        let err = blocks()
            .block("v", DMatrix::zeros(1, 4))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::ColumnMismatch { expected: 5, found: 4, .. }
        ));
    }

    #[test]
    fn test_zero_columns() {
        let err = NamedTrajectory::builder()
            .block("u", DMatrix::zeros(1, 0))
            .control("u")
            .timestep(0.1)
            .build()
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::EmptyTrajectory));
    }

    #[test]
    fn test_metadata_errors() {
        let err = blocks().initial("x", [1.0, 2.0]).build().unwrap_err();
        assert!(matches!(err, TrajectoryError::DimensionMismatch { .. }));
        assert!(err.is_configuration());

        let err = blocks().bound("z", [1.0]).build().unwrap_err();
        assert!(matches!(err, TrajectoryError::UnknownName { .. }));

        let err = blocks().goal(STATES, [0.0; 3]).build().unwrap_err();
        assert!(matches!(err, TrajectoryError::UnknownName { .. }));
    }

    #[test]
    fn test_later_metadata_replaces_earlier() {
        let traj = blocks()
            .final_value("x", [0.0; 3])
            .final_value("x", [1.0, 2.0, 3.0])
            .build()
            .unwrap();
        assert_eq!(traj.final_values()["x"].as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_control_is_deduplicated() {
        let traj = blocks().control("u").build().unwrap();
        assert_eq!(traj.control_names(), &["u"]);
    }

    #[test]
    fn test_from_flat_wraps_buffer() {
        let values: Vec<f64> = (0..15).map(f64::from).collect();
        let traj = NamedTrajectory::from_flat(values, 5)
            .component("x", 0..2)
            .component("u", [2])
            .control("u")
            .timestep(0.5)
            .build()
            .unwrap();

        assert_eq!(traj.shape(), (3, 5));
        assert_eq!(traj.block("u").unwrap()[(0, 1)], 5.0);
        assert_eq!(traj.dim_of(CONTROLS), Some(1));
        assert_eq!(traj.as_slice()[14], 14.0);
    }

    #[test]
    fn test_from_flat_rejects_bad_length() {
        let err = NamedTrajectory::from_flat(vec![0.0; 14], 5)
            .component("x", 0..2)
            .component("u", [2])
            .control("u")
            .timestep(0.5)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::BufferLengthMismatch { expected: 15, found: 14 }
        ));
    }

    #[test]
    fn test_from_flat_oversized_shape() {
        let err = NamedTrajectory::from_flat(Vec::new(), usize::MAX)
            .component("x", 0..2)
            .component("u", [2])
            .control("u")
            .timestep(0.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::InvalidComponents(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_from_matrix_validates_partition() {
        let matrix = DMatrix::zeros(4, 3);

        let ok = NamedTrajectory::from_matrix(matrix.clone())
            .component("x", 0..3)
            .component("u", [3])
            .control("u")
            .timestep(0.1)
            .build();
        assert!(ok.is_ok());

        let gap = NamedTrajectory::from_matrix(matrix.clone())
            .component("x", 0..2)
            .component("u", [3])
            .control("u")
            .timestep(0.1)
            .build()
            .unwrap_err();
        assert!(matches!(gap, TrajectoryError::InvalidComponents(_)));

        let short = NamedTrajectory::from_matrix(matrix)
            .component("x", 0..2)
            .component("u", [2])
            .control("u")
            .timestep(0.1)
            .build()
            .unwrap_err();
        assert!(matches!(short, TrajectoryError::InvalidComponents(_)));
    }

    #[test]
    fn test_from_matrix_zero_columns() {
        let err = NamedTrajectory::from_matrix(DMatrix::zeros(1, 0))
            .component("u", [0])
            .control("u")
            .timestep(0.1)
            .build()
            .unwrap_err();
        assert!(matches!(err, TrajectoryError::EmptyTrajectory));
    }
}
