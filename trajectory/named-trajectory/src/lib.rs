//! Named trajectories for trajectory optimization.
//!
//! A [`NamedTrajectory`] is a `dim x T` matrix whose columns are timesteps
//! (knot points) and whose rows are split into named blocks such as `x`
//! (state) or `u` (control). The crate provides:
//!
//! - [`BlockLayout`] - resolves block names to contiguous row ranges and
//!   derives the [`STATES`] and [`CONTROLS`] aggregates
//! - [`MetadataSpec`] / [`Metadata`] - per-block bounds and initial, final
//!   and goal values, checked against the layout
//! - [`TrajectoryBuilder`] - construction from named blocks or from an
//!   existing flat buffer
//! - [`KnotPoint`] / [`KnotPointMut`] - borrowed single-column views
//! - `archive` (feature `archive`) - binary `.ntj` persistence
//!
//! # Storage
//!
//! The matrix is the only owner of trajectory data. Block views, component
//! views and knot points all borrow it; rebuilding from a new buffer shares
//! metadata through an [`Arc`](std::sync::Arc) instead of copying it.
//!
//! # Indexing
//!
//! Rows and timesteps are 0-based: declared blocks tile `0..dim` and knot
//! points are `0..T`.
//!
//! # Example
//!
//! ```
//! use named_trajectory::{BoundSpec, NamedTrajectory, STATES};
//! use nalgebra::DMatrix;
//!
//! let mut traj = NamedTrajectory::builder()
//!     .block("x", DMatrix::zeros(3, 5))
//!     .block("u", DMatrix::zeros(2, 5))
//!     .controls(["u"])
//!     .timestep(0.1)
//!     .bound("x", [1.0, 2.0, 3.0])
//!     .bound("u", BoundSpec::explicit([-1.0, 0.0], [1.0, 2.0]))
//!     .build()
//!     .unwrap();
//!
//! traj.block_mut("u").unwrap().fill(0.5);
//! assert_eq!(traj.data()[(3, 4)], 0.5);
//! assert_eq!(traj.component(STATES).unwrap().as_range(), Some(0..3));
//!
//! let knot = traj.knot_point(2).unwrap();
//! assert_eq!(knot.get("u").unwrap().as_slice(), &[0.5, 0.5]);
//!
//! let rebuilt = traj.rebuild_from_vec(traj.to_vec()).unwrap();
//! assert!(rebuilt.shares_meta_with(&traj));
//! ```
//!
//! # Features
//!
//! - `serde` - `Serialize`/`Deserialize` for the public value types;
//!   a deserialized trajectory is validated like a built one
//! - `archive` (default) - `.ntj` file persistence via `bincode`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod builder;
mod error;
mod knot_point;
mod layout;
mod metadata;
mod timestep;
mod trajectory;
mod view;

#[cfg(feature = "serde")]
mod record;

#[cfg(feature = "archive")]
pub mod archive;

pub use builder::{Blocks, Flat, TrajectoryBuilder};
pub use error::{Result, TrajectoryError};
pub use knot_point::{KnotPoint, KnotPointMut};
pub use layout::{BlockLayout, Component, CONTROLS, STATES};
pub use metadata::{BoundSpec, Bounds, Metadata, MetadataSpec};
pub use timestep::Timestep;
pub use trajectory::{NamedTrajectory, TrajectoryMeta};
pub use view::ComponentView;

#[cfg(feature = "serde")]
pub use record::TrajectoryRecord;

// Re-export nalgebra types for convenience
pub use nalgebra::{DMatrix, DVector};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        BoundSpec, Bounds, ComponentView, KnotPoint, KnotPointMut, NamedTrajectory, Timestep,
        TrajectoryBuilder, TrajectoryError, CONTROLS, STATES,
    };
}
