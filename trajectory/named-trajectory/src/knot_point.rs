//! Single-timestep views of a trajectory.

use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};

use crate::error::{Result, TrajectoryError};
use crate::layout::BlockLayout;
use crate::timestep::Timestep;
use crate::trajectory::TrajectoryMeta;

/// A read-only view of column `t` of a trajectory.
///
/// The knot point borrows the trajectory's buffer and metadata, so it cannot
/// outlive the trajectory and holds no storage of its own.
///
/// # Example
///
/// ```
/// use named_trajectory::NamedTrajectory;
/// use nalgebra::DMatrix;
///
/// let traj = NamedTrajectory::builder()
///     .block("x", DMatrix::from_fn(2, 4, |i, j| (i + 10 * j) as f64))
///     .row("u", [0.0, 1.0, 2.0, 3.0])
///     .controls(["u"])
///     .timestep(0.1)
///     .build()
///     .unwrap();
///
/// let knot = traj.knot_point(2).unwrap();
/// assert_eq!(knot.get("x").unwrap().as_slice(), &[20.0, 21.0]);
/// assert_eq!(knot.get("u").unwrap()[0], 2.0);
/// assert!(traj.knot_point(4).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct KnotPoint<'a> {
    t: usize,
    data: &'a DMatrix<f64>,
    meta: &'a TrajectoryMeta,
}

impl<'a> KnotPoint<'a> {
    pub(crate) fn new(t: usize, data: &'a DMatrix<f64>, meta: &'a TrajectoryMeta) -> Result<Self> {
        check_index(t, data.ncols())?;
        Ok(Self { t, data, meta })
    }

    /// Timestep index of this knot point.
    #[must_use]
    pub const fn t(&self) -> usize {
        self.t
    }

    /// The full state vector of this timestep.
    #[must_use]
    pub fn data(&self) -> DVectorView<'a, f64> {
        let data: &'a DMatrix<f64> = self.data;
        data.column(self.t)
    }

    /// Layout shared with the originating trajectory.
    #[must_use]
    pub fn layout(&self) -> &'a BlockLayout {
        self.meta.layout()
    }

    /// Declared block names.
    #[must_use]
    pub fn names(&self) -> &'a [String] {
        self.meta.layout().names()
    }

    /// Control block names.
    #[must_use]
    pub fn control_names(&self) -> &'a [String] {
        self.meta.layout().control_names()
    }

    /// Values of a contiguous block or aggregate at this timestep.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name,
    /// [`TrajectoryError::NonContiguousComponent`] for a split aggregate
    /// (use [`values`](Self::values) instead).
    pub fn get(&self, name: &str) -> Result<DVectorView<'a, f64>> {
        let rows = self.meta.layout().contiguous_rows(name)?;
        let data: &'a DMatrix<f64> = self.data;
        Ok(data.view_range(rows, self.t))
    }

    /// Copies the values of any block or aggregate at this timestep.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name.
    pub fn values(&self, name: &str) -> Result<DVector<f64>> {
        let component = self
            .meta
            .layout()
            .component(name)
            .ok_or_else(|| TrajectoryError::NotFound(name.to_string()))?;
        Ok(DVector::from_iterator(
            component.len(),
            component.indices().map(|row| self.data[(row, self.t)]),
        ))
    }

    /// Copies the state values at this timestep.
    #[must_use]
    pub fn states(&self) -> DVector<f64> {
        let states = self.meta.layout().states();
        DVector::from_iterator(
            states.len(),
            states.indices().map(|row| self.data[(row, self.t)]),
        )
    }

    /// Copies the control values at this timestep.
    #[must_use]
    pub fn controls(&self) -> DVector<f64> {
        let controls = self.meta.layout().controls();
        DVector::from_iterator(
            controls.len(),
            controls.indices().map(|row| self.data[(row, self.t)]),
        )
    }

    /// Time increment from this knot point to the next.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        timestep_at(self.meta, self.data, self.t)
    }
}

/// A mutable view of column `t` of a trajectory.
///
/// Writes go straight into the trajectory's buffer.
#[derive(Debug)]
pub struct KnotPointMut<'a> {
    t: usize,
    data: &'a mut DMatrix<f64>,
    meta: &'a TrajectoryMeta,
}

impl<'a> KnotPointMut<'a> {
    pub(crate) fn new(
        t: usize,
        data: &'a mut DMatrix<f64>,
        meta: &'a TrajectoryMeta,
    ) -> Result<Self> {
        check_index(t, data.ncols())?;
        Ok(Self { t, data, meta })
    }

    /// Timestep index of this knot point.
    #[must_use]
    pub const fn t(&self) -> usize {
        self.t
    }

    /// The full state vector of this timestep.
    #[must_use]
    pub fn data(&self) -> DVectorView<'_, f64> {
        self.data.column(self.t)
    }

    /// Mutable full state vector of this timestep.
    pub fn data_mut(&mut self) -> DVectorViewMut<'_, f64> {
        self.data.column_mut(self.t)
    }

    /// Values of a contiguous block or aggregate at this timestep.
    ///
    /// # Errors
    ///
    /// Same as [`KnotPoint::get`].
    pub fn get(&self, name: &str) -> Result<DVectorView<'_, f64>> {
        let rows = self.meta.layout().contiguous_rows(name)?;
        Ok(self.data.view_range(rows, self.t))
    }

    /// Mutable values of a contiguous block or aggregate at this timestep.
    ///
    /// # Errors
    ///
    /// Same as [`KnotPoint::get`].
    pub fn get_mut(&mut self, name: &str) -> Result<DVectorViewMut<'_, f64>> {
        let rows = self.meta.layout().contiguous_rows(name)?;
        Ok(self.data.view_range_mut(rows, self.t))
    }

    /// Overwrites a block or aggregate at this timestep.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name and
    /// [`TrajectoryError::DimensionMismatch`] if `values` has the wrong length.
    pub fn set(&mut self, name: &str, values: &[f64]) -> Result<()> {
        let component = self
            .meta
            .layout()
            .component(name)
            .ok_or_else(|| TrajectoryError::NotFound(name.to_string()))?;
        if values.len() != component.len() {
            return Err(TrajectoryError::dimension_mismatch(
                "knot point",
                name,
                component.len(),
                values.len(),
            ));
        }
        for (row, value) in component.indices().zip(values) {
            self.data[(row, self.t)] = *value;
        }
        Ok(())
    }

    /// Time increment from this knot point to the next.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        timestep_at(self.meta, self.data, self.t)
    }
}

fn check_index(t: usize, len: usize) -> Result<()> {
    if t < len {
        Ok(())
    } else {
        Err(TrajectoryError::KnotPointOutOfRange { t, len })
    }
}

/// Time increment of column `t` under the trajectory's timestep policy.
pub(crate) fn timestep_at(meta: &TrajectoryMeta, data: &DMatrix<f64>, t: usize) -> f64 {
    match meta.timestep() {
        Timestep::Fixed(dt) => *dt,
        Timestep::Dynamical(name) => meta
            .layout()
            .block_rows(name)
            .map_or(f64::NAN, |rows| data[(rows.start, t)]),
    }
}
