//! Error types for finite-difference helpers.

use named_trajectory::TrajectoryError;
use thiserror::Error;

/// Errors from differentiating or integrating trajectory data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CalculusError {
    /// The timestep vector does not have one entry per column.
    #[error("expected {expected} timesteps (one per column), got {found}")]
    TimestepCount {
        /// Column count of the data.
        expected: usize,
        /// Length of the timestep vector.
        found: usize,
    },

    /// A timestep is zero, negative or not finite.
    #[error("timestep {index} must be finite and positive, got {value}")]
    InvalidTimestep {
        /// Column of the offending timestep.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Looking up the block failed.
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

/// Result type for finite-difference helpers.
pub type Result<T> = std::result::Result<T, CalculusError>;
