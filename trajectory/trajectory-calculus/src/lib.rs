//! Finite differences over trajectory matrices.
//!
//! Rows are signals and columns are timesteps, as in a
//! [`NamedTrajectory`](named_trajectory::NamedTrajectory):
//!
//! - [`derivative`] - backward difference per column
//! - [`integral`] - cumulative sum per column, the inverse of [`derivative`]
//! - [`block_derivative`] / [`block_integral`] - the same on a named block,
//!   using the trajectory's own timesteps
//!
//! # Example
//!
//! ```
//! use named_trajectory::NamedTrajectory;
//! use trajectory_calculus::block_derivative;
//!
//! let traj = NamedTrajectory::builder()
//!     .row("x", [0.0, 0.1, 0.4])
//!     .row("u", [0.0, 0.0, 0.0])
//!     .controls(["u"])
//!     .timestep(0.1)
//!     .build()
//!     .unwrap();
//!
//! let dx = block_derivative(&traj, "x").unwrap();
//! assert!((dx[(0, 2)] - 3.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod difference;
mod error;

pub use difference::{block_derivative, block_integral, derivative, integral};
pub use error::{CalculusError, Result};
