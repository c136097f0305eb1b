//! The named trajectory container.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector};
use tracing::debug;

use crate::builder::{Blocks, TrajectoryBuilder};
use crate::error::{Result, TrajectoryError};
use crate::knot_point::{timestep_at, KnotPoint, KnotPointMut};
use crate::layout::{BlockLayout, Component};
use crate::metadata::{Bounds, Metadata};
use crate::timestep::Timestep;
use crate::view::ComponentView;

/// Everything about a trajectory except its numeric data.
///
/// Shared by reference between a trajectory, the trajectories rebuilt from
/// it, and every knot point borrowed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryMeta {
    layout: BlockLayout,
    metadata: Metadata,
    timestep: Timestep,
}

impl TrajectoryMeta {
    pub(crate) const fn new(layout: BlockLayout, metadata: Metadata, timestep: Timestep) -> Self {
        Self {
            layout,
            metadata,
            timestep,
        }
    }

    /// Row layout.
    #[must_use]
    pub const fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    /// Bounds and initial, final and goal values.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Timestep policy.
    #[must_use]
    pub const fn timestep(&self) -> &Timestep {
        &self.timestep
    }
}

/// A `dim x T` matrix of trajectory data partitioned into named row blocks.
///
/// Column `t` holds the full state of timestep `t`. The matrix owns the only
/// copy of the data (column-major, so [`as_slice`](Self::as_slice) is the
/// flat vector an optimizer works with); block views, component views and
/// knot points all borrow it.
///
/// # Example
///
/// ```
/// use named_trajectory::{NamedTrajectory, CONTROLS, STATES};
/// use nalgebra::DMatrix;
///
/// let traj = NamedTrajectory::builder()
///     .block("x", DMatrix::zeros(3, 5))
///     .block("u", DMatrix::zeros(2, 5))
///     .controls(["u"])
///     .timestep(0.1)
///     .bound("x", [1.0, 2.0, 3.0])
///     .build()
///     .unwrap();
///
/// assert_eq!(traj.dim(), 5);
/// assert_eq!(traj.len(), 5);
/// assert_eq!(traj.dim_of(STATES), Some(3));
/// assert_eq!(traj.dim_of(CONTROLS), Some(2));
/// assert_eq!(traj.block("u").unwrap().shape(), (2, 5));
/// assert_eq!(traj.bound("x").unwrap().lower().as_slice(), &[-1.0, -2.0, -3.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        try_from = "crate::record::TrajectoryRecord",
        into = "crate::record::TrajectoryRecord"
    )
)]
pub struct NamedTrajectory {
    data: DMatrix<f64>,
    meta: Arc<TrajectoryMeta>,
}

impl NamedTrajectory {
    /// Starts building a trajectory from named blocks.
    #[must_use]
    pub fn builder() -> TrajectoryBuilder<Blocks> {
        TrajectoryBuilder::new()
    }

    /// Assembles a trajectory; `data` must already match `meta`.
    pub(crate) fn from_parts(data: DMatrix<f64>, meta: Arc<TrajectoryMeta>) -> Self {
        debug!(
            dim = data.nrows(),
            timesteps = data.ncols(),
            blocks = meta.layout.names().len(),
            "assembled trajectory"
        );
        Self { data, meta }
    }

    // ----------------------------------------------------------------------
    // Shape
    // ----------------------------------------------------------------------

    /// Total number of rows.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.nrows()
    }

    /// Number of timesteps `T`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    /// Always `false` for a constructed trajectory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.ncols() == 0
    }

    /// `(dim, T)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    // ----------------------------------------------------------------------
    // Metadata
    // ----------------------------------------------------------------------

    /// Shared metadata.
    #[must_use]
    pub fn meta(&self) -> &TrajectoryMeta {
        &self.meta
    }

    /// Returns `true` if both trajectories share the same metadata instance.
    #[must_use]
    pub fn shares_meta_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.meta, &other.meta)
    }

    /// Row layout.
    #[must_use]
    pub fn layout(&self) -> &BlockLayout {
        &self.meta.layout
    }

    /// Declared block names, in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        self.meta.layout.names()
    }

    /// Control block names, in declaration order.
    #[must_use]
    pub fn control_names(&self) -> &[String] {
        self.meta.layout.control_names()
    }

    /// Non-control block names, in declaration order.
    #[must_use]
    pub fn state_names(&self) -> Vec<&str> {
        self.names()
            .iter()
            .filter(|name| !self.meta.layout.is_control(name))
            .map(String::as_str)
            .collect()
    }

    /// Returns `true` if `name` is a control block.
    #[must_use]
    pub fn is_control(&self, name: &str) -> bool {
        self.meta.layout.is_control(name)
    }

    /// Returns `true` if `name` is a declared block or an aggregate.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.meta.layout.component(name).is_some()
    }

    /// Row counts of every block and both aggregates.
    #[must_use]
    pub fn dims(&self) -> &HashMap<String, usize> {
        self.meta.layout.dims()
    }

    /// Row count of a block or aggregate.
    #[must_use]
    pub fn dim_of(&self, name: &str) -> Option<usize> {
        self.meta.layout.dim_of(name)
    }

    /// Components of every block and both aggregates.
    #[must_use]
    pub fn components(&self) -> &HashMap<String, Component> {
        self.meta.layout.components()
    }

    /// Component of a block or aggregate.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name.
    pub fn component(&self, name: &str) -> Result<&Component> {
        self.meta
            .layout
            .component(name)
            .ok_or_else(|| TrajectoryError::NotFound(name.to_string()))
    }

    /// Normalized bounds, keyed by block name.
    #[must_use]
    pub fn bounds(&self) -> &HashMap<String, Bounds> {
        self.meta.metadata.bounds()
    }

    /// Bounds of one block, if set.
    #[must_use]
    pub fn bound(&self, name: &str) -> Option<&Bounds> {
        self.meta.metadata.bounds().get(name)
    }

    /// Initial values, keyed by block name.
    #[must_use]
    pub fn initial(&self) -> &HashMap<String, DVector<f64>> {
        self.meta.metadata.initial()
    }

    /// Final values, keyed by block name.
    #[must_use]
    pub fn final_values(&self) -> &HashMap<String, DVector<f64>> {
        self.meta.metadata.final_values()
    }

    /// Goal values, keyed by block name.
    #[must_use]
    pub fn goal(&self) -> &HashMap<String, DVector<f64>> {
        self.meta.metadata.goal()
    }

    /// Initial value of one block, if set.
    #[must_use]
    pub fn initial_of(&self, name: &str) -> Option<&DVector<f64>> {
        self.meta.metadata.initial().get(name)
    }

    /// Final value of one block, if set.
    #[must_use]
    pub fn final_value_of(&self, name: &str) -> Option<&DVector<f64>> {
        self.meta.metadata.final_values().get(name)
    }

    /// Goal value of one block, if set.
    #[must_use]
    pub fn goal_of(&self, name: &str) -> Option<&DVector<f64>> {
        self.meta.metadata.goal().get(name)
    }

    // ----------------------------------------------------------------------
    // Time
    // ----------------------------------------------------------------------

    /// Timestep policy.
    #[must_use]
    pub fn timestep(&self) -> &Timestep {
        &self.meta.timestep
    }

    /// Returns `true` if timesteps are read from a block.
    #[must_use]
    pub fn is_dynamical(&self) -> bool {
        self.meta.timestep.is_dynamical()
    }

    /// Time increment of every column.
    #[must_use]
    pub fn timesteps(&self) -> DVector<f64> {
        DVector::from_fn(self.len(), |t, _| timestep_at(&self.meta, &self.data, t))
    }

    /// Start time of every column, beginning at zero.
    #[must_use]
    pub fn times(&self) -> DVector<f64> {
        let timesteps = self.timesteps();
        let mut times = DVector::zeros(self.len());
        for t in 1..self.len() {
            times[t] = times[t - 1] + timesteps[t - 1];
        }
        times
    }

    /// Start time of the last column.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.times().iter().last().copied().unwrap_or(0.0)
    }

    // ----------------------------------------------------------------------
    // Data access
    // ----------------------------------------------------------------------

    /// The full `dim x T` matrix.
    #[must_use]
    pub const fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Mutable view of the full matrix.
    ///
    /// The view can change values but not the shape.
    pub fn data_mut(&mut self) -> DMatrixViewMut<'_, f64> {
        let timesteps = self.data.ncols();
        self.data.columns_mut(0, timesteps)
    }

    /// The flat column-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice()
    }

    /// Mutable flat column-major buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_mut_slice()
    }

    /// Copies the flat buffer.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.data.as_slice().to_vec()
    }

    /// Consumes the trajectory and returns its matrix.
    #[must_use]
    pub fn into_data(self) -> DMatrix<f64> {
        self.data
    }

    /// View of a block, or of an aggregate occupying one contiguous run.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name and
    /// [`TrajectoryError::NonContiguousComponent`] for a split aggregate
    /// (use [`component_view`](Self::component_view) instead).
    pub fn block(&self, name: &str) -> Result<DMatrixView<'_, f64>> {
        let rows = self.meta.layout.contiguous_rows(name)?;
        Ok(self.data.rows(rows.start, rows.len()))
    }

    /// Mutable view of a block; writes land in the trajectory's buffer.
    ///
    /// # Errors
    ///
    /// Same as [`block`](Self::block).
    pub fn block_mut(&mut self, name: &str) -> Result<DMatrixViewMut<'_, f64>> {
        let rows = self.meta.layout.contiguous_rows(name)?;
        Ok(self.data.rows_mut(rows.start, rows.len()))
    }

    /// View of any block or aggregate, contiguous or not.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name.
    pub fn component_view(&self, name: &str) -> Result<ComponentView<'_>> {
        let component = self.component(name)?;
        Ok(ComponentView::new(&self.data, component))
    }

    /// View of every non-control row.
    #[must_use]
    pub fn states(&self) -> ComponentView<'_> {
        ComponentView::new(&self.data, self.meta.layout.states())
    }

    /// View of every control row.
    #[must_use]
    pub fn controls(&self) -> ComponentView<'_> {
        ComponentView::new(&self.data, self.meta.layout.controls())
    }

    /// Overwrites a block or aggregate across all timesteps.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name and
    /// [`TrajectoryError::ShapeMismatch`] unless `values` is `dims[name] x T`.
    pub fn update(&mut self, name: &str, values: &DMatrix<f64>) -> Result<()> {
        let component = self
            .meta
            .layout
            .component(name)
            .ok_or_else(|| TrajectoryError::NotFound(name.to_string()))?;
        let expected = (component.len(), self.len());
        if values.shape() != expected {
            return Err(TrajectoryError::shape_mismatch(name, expected, values.shape()));
        }
        let mut offset = 0;
        for segment in component.segments() {
            self.data
                .rows_mut(segment.start, segment.len())
                .copy_from(&values.rows(offset, segment.len()));
            offset += segment.len();
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Knot points
    // ----------------------------------------------------------------------

    /// Borrows column `t`.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::KnotPointOutOfRange`] unless `t < T`.
    pub fn knot_point(&self, t: usize) -> Result<KnotPoint<'_>> {
        KnotPoint::new(t, &self.data, &self.meta)
    }

    /// Mutably borrows column `t`.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::KnotPointOutOfRange`] unless `t < T`.
    pub fn knot_point_mut(&mut self, t: usize) -> Result<KnotPointMut<'_>> {
        KnotPointMut::new(t, &mut self.data, &self.meta)
    }

    /// Iterates over every knot point in time order.
    pub fn knot_points(&self) -> impl Iterator<Item = KnotPoint<'_>> + '_ {
        (0..self.len()).filter_map(move |t| KnotPoint::new(t, &self.data, &self.meta).ok())
    }

    // ----------------------------------------------------------------------
    // Rebuilding
    // ----------------------------------------------------------------------

    /// A new trajectory over `data` sharing this trajectory's metadata.
    ///
    /// `data` is taken as the column-major flat buffer and is not copied.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::BufferLengthMismatch`] unless `data.len() == dim * T`.
    pub fn rebuild_from_vec(&self, data: Vec<f64>) -> Result<Self> {
        let expected = self.dim() * self.len();
        if data.len() != expected {
            return Err(TrajectoryError::BufferLengthMismatch {
                expected,
                found: data.len(),
            });
        }
        let matrix = DMatrix::from_vec(self.dim(), self.len(), data);
        debug!(len = expected, "rebuilt trajectory from flat buffer");
        Ok(Self::from_parts(matrix, Arc::clone(&self.meta)))
    }

    /// A new trajectory over `data` sharing this trajectory's metadata.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::ShapeMismatch`] unless `data` is `dim x T`.
    pub fn rebuild_from_matrix(&self, data: DMatrix<f64>) -> Result<Self> {
        if data.shape() != self.shape() {
            return Err(TrajectoryError::shape_mismatch("data", self.shape(), data.shape()));
        }
        Ok(Self::from_parts(data, Arc::clone(&self.meta)))
    }

    /// A new trajectory with an extra block appended after the existing ones.
    ///
    /// Bounds, initial, final and goal values and the timestep policy carry
    /// over; the layout is resolved again. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Any construction error, e.g. [`TrajectoryError::DuplicateName`] or
    /// [`TrajectoryError::ColumnMismatch`].
    pub fn with_block(
        &self,
        name: impl Into<String>,
        values: DMatrix<f64>,
        is_control: bool,
    ) -> Result<Self> {
        let name = name.into();
        let mut builder = TrajectoryBuilder::new()
            .timestep(self.meta.timestep.clone())
            .metadata(self.meta.metadata.to_spec());
        for (block, rows) in self.meta.layout.blocks() {
            builder = builder.block(block, self.data.rows(rows.start, rows.len()).into_owned());
        }
        let mut controls: Vec<String> = self.control_names().to_vec();
        if is_control {
            controls.push(name.clone());
        }
        builder.block(name, values).controls(controls).build()
    }
}

impl fmt::Display for NamedTrajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedTrajectory(dim={}, T={}", self.dim(), self.len())?;
        match self.timestep() {
            Timestep::Fixed(dt) => write!(f, ", dt={dt}")?,
            Timestep::Dynamical(name) => write!(f, ", dt={name:?}")?,
        }
        f.write_str(", blocks=[")?;
        for (i, name) in self.names().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let marker = if self.is_control(name) { "*" } else { "" };
            write!(f, "{name}{marker}:{}", self.dim_of(name).unwrap_or(0))?;
        }
        f.write_str("])")
    }
}
