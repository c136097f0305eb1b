//! Backward differences and cumulative sums along the time axis.
//!
//! `dt[t]` is the increment from column `t` to column `t + 1`, the same
//! convention as [`NamedTrajectory::timesteps`].

use nalgebra::{DMatrix, Dyn, Matrix, Storage};
use named_trajectory::NamedTrajectory;
use tracing::debug;

use crate::error::{CalculusError, Result};

fn check_timesteps(columns: usize, dt: &[f64]) -> Result<()> {
    if dt.len() != columns {
        return Err(CalculusError::TimestepCount {
            expected: columns,
            found: dt.len(),
        });
    }
    if let Some((index, value)) = dt
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !(value.is_finite() && *value > 0.0))
    {
        return Err(CalculusError::InvalidTimestep { index, value });
    }
    Ok(())
}

/// Backward difference of every row.
///
/// Column 0 of the result is zero; column `t >= 1` is
/// `(x[:, t] - x[:, t - 1]) / dt[t - 1]`.
///
/// # Errors
///
/// [`CalculusError::TimestepCount`] unless `dt` has one entry per column and
/// [`CalculusError::InvalidTimestep`] for a non-positive or non-finite entry.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use trajectory_calculus::derivative;
///
/// let x = DMatrix::from_row_slice(1, 3, &[0.0, 1.0, 3.0]);
/// let dx = derivative(&x, &[0.5, 0.5, 0.5]).unwrap();
/// assert_eq!(dx.as_slice(), &[0.0, 2.0, 4.0]);
/// ```
pub fn derivative<S>(x: &Matrix<f64, Dyn, Dyn, S>, dt: &[f64]) -> Result<DMatrix<f64>>
where
    S: Storage<f64, Dyn, Dyn>,
{
    check_timesteps(x.ncols(), dt)?;
    let mut dx = DMatrix::zeros(x.nrows(), x.ncols());
    for t in 1..x.ncols() {
        let slope = (x.column(t) - x.column(t - 1)) / dt[t - 1];
        dx.set_column(t, &slope);
    }
    Ok(dx)
}

/// Cumulative sum of every row, starting from zero.
///
/// Column 0 of the result is zero; column `t >= 1` is
/// `x[:, t - 1] + dx[:, t] * dt[t - 1]`, which undoes [`derivative`] up to
/// the first column.
///
/// # Errors
///
/// Same as [`derivative`].
pub fn integral<S>(dx: &Matrix<f64, Dyn, Dyn, S>, dt: &[f64]) -> Result<DMatrix<f64>>
where
    S: Storage<f64, Dyn, Dyn>,
{
    check_timesteps(dx.ncols(), dt)?;
    let mut x = DMatrix::zeros(dx.nrows(), dx.ncols());
    for t in 1..dx.ncols() {
        let next = x.column(t - 1) + dx.column(t) * dt[t - 1];
        x.set_column(t, &next);
    }
    Ok(x)
}

/// [`derivative`] of a block or aggregate using the trajectory's timesteps.
///
/// # Errors
///
/// [`CalculusError::Trajectory`] for an unknown name, otherwise the
/// timestep errors of [`derivative`].
pub fn block_derivative(traj: &NamedTrajectory, name: &str) -> Result<DMatrix<f64>> {
    let values = traj.component_view(name)?.to_matrix();
    debug!(block = name, rows = values.nrows(), "differentiating block");
    derivative(&values, traj.timesteps().as_slice())
}

/// [`integral`] of a block or aggregate using the trajectory's timesteps.
///
/// # Errors
///
/// Same as [`block_derivative`].
pub fn block_integral(traj: &NamedTrajectory, name: &str) -> Result<DMatrix<f64>> {
    let values = traj.component_view(name)?.to_matrix();
    debug!(block = name, rows = values.nrows(), "integrating block");
    integral(&values, traj.timesteps().as_slice())
}
