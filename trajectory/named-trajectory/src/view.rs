//! Read-only views over components that may span several row segments.

use nalgebra::{DMatrix, DMatrixView, DVector};

use crate::layout::Component;

/// A borrowed view of one component across every timestep.
///
/// Unlike a [`DMatrixView`], the rows need not be contiguous, so the
/// aggregate `states` and `controls` components can be viewed even when
/// control and state blocks are interleaved. Nothing is copied until
/// [`to_matrix`](Self::to_matrix) or [`column`](Self::column) is called.
///
/// # Example
///
/// ```
/// use named_trajectory::NamedTrajectory;
/// use nalgebra::DMatrix;
///
/// let traj = NamedTrajectory::builder()
///     .block("x", DMatrix::from_element(1, 3, 1.0))
///     .block("u", DMatrix::from_element(1, 3, 2.0))
///     .block("v", DMatrix::from_element(1, 3, 3.0))
///     .controls(["u"])
///     .timestep(0.5)
///     .build()
///     .unwrap();
///
/// let states = traj.states();
/// assert_eq!(states.shape(), (2, 3));
/// assert_eq!(states.get(1, 0), Some(3.0));
/// assert_eq!(states.segments().count(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ComponentView<'a> {
    data: &'a DMatrix<f64>,
    component: &'a Component,
}

impl<'a> ComponentView<'a> {
    pub(crate) const fn new(data: &'a DMatrix<f64>, component: &'a Component) -> Self {
        Self { data, component }
    }

    /// The viewed component.
    #[must_use]
    pub const fn component(&self) -> &'a Component {
        self.component
    }

    /// Number of rows in the component.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.component.len()
    }

    /// Number of timesteps.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// `(rows, timesteps)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    /// Element at `row` (relative to the component) and column `col`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let row = self.component.row(row)?;
        self.data.get((row, col)).copied()
    }

    /// Contiguous matrix views, one per row segment.
    pub fn segments(&self) -> impl Iterator<Item = DMatrixView<'a, f64>> + 'a {
        let data: &'a DMatrix<f64> = self.data;
        self.component
            .segments()
            .iter()
            .map(move |segment| data.rows(segment.start, segment.len()))
    }

    /// Copies one column of the component.
    #[must_use]
    pub fn column(&self, col: usize) -> Option<DVector<f64>> {
        if col >= self.ncols() {
            return None;
        }
        Some(DVector::from_iterator(
            self.nrows(),
            self.component.indices().map(|row| self.data[(row, col)]),
        ))
    }

    /// Copies the component into an owned matrix.
    #[must_use]
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let rows: Vec<usize> = self.component.indices().collect();
        self.data.select_rows(rows.iter())
    }
}
