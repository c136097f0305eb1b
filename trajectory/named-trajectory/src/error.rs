//! Error types for trajectory construction, access, and persistence.
//!
//! Every failure is reported eagerly: a builder either returns a fully
//! consistent [`NamedTrajectory`](crate::NamedTrajectory) or one of the
//! variants below, never a partially valid container.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, accessing, or persisting a trajectory.
///
/// Variants fall into two kinds. Configuration errors
/// ([`is_configuration`](Self::is_configuration)) mean the inputs were
/// malformed or inconsistent and must be fixed by the caller. Index errors
/// ([`is_index`](Self::is_index)) mean a timestep outside `0..T` was requested.
/// Archive I/O and codec failures belong to neither kind.
///
/// # Example
///
/// ```
/// use named_trajectory::TrajectoryError;
///
/// let error = TrajectoryError::unknown_name("bounds", "z");
/// assert!(error.is_configuration());
/// assert!(error.to_string().contains("z"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrajectoryError {
    /// No data blocks or components were supplied.
    #[error("trajectory has no blocks")]
    NoBlocks,

    /// No block was designated as a control input.
    #[error("at least one control block must be designated")]
    NoControls,

    /// A control name does not refer to a declared block.
    #[error("control {0:?} is not a declared block")]
    UnknownControl(String),

    /// A declared block has zero rows.
    #[error("block {0:?} has no rows")]
    EmptyBlock(String),

    /// The same block name was declared twice.
    #[error("block {0:?} is declared more than once")]
    DuplicateName(String),

    /// A block used one of the aggregate names `states` or `controls`.
    #[error("block name {0:?} is reserved for the aggregate view")]
    ReservedName(String),

    /// The trajectory would have zero timesteps.
    #[error("trajectory must have at least one timestep")]
    EmptyTrajectory,

    /// Blocks disagree on the number of timesteps.
    #[error("block {name:?} has {found} columns, expected {expected}")]
    ColumnMismatch {
        /// The offending block.
        name: String,
        /// Column count of the first block.
        expected: usize,
        /// Column count of this block.
        found: usize,
    },

    /// A metadata table references a name that is not a declared block.
    #[error("{context} references unknown block {name:?}")]
    UnknownName {
        /// Which table held the reference (`bounds`, `initial`, ...).
        context: &'static str,
        /// The unknown name.
        name: String,
    },

    /// A metadata vector does not match its block's row count.
    #[error("{context} for block {name:?} has length {found}, expected {expected}")]
    DimensionMismatch {
        /// Which table held the vector (`bounds.lower`, `initial`, ...).
        context: &'static str,
        /// The block name.
        name: String,
        /// Row count of the block.
        expected: usize,
        /// Length of the supplied vector.
        found: usize,
    },

    /// Supplied component ranges do not partition `0..dim` in order.
    #[error("invalid components: {0}")]
    InvalidComponents(String),

    /// A contiguous view was requested for a component made of several segments.
    #[error("component {0:?} is not contiguous")]
    NonContiguousComponent(String),

    /// No timestep policy was supplied.
    #[error("timestep must be set")]
    MissingTimestep,

    /// The timestep policy is unusable.
    #[error("invalid timestep: {0}")]
    InvalidTimestep(String),

    /// A replacement buffer has the wrong length.
    #[error("buffer has length {found}, expected {expected}")]
    BufferLengthMismatch {
        /// `dim * T` of the trajectory.
        expected: usize,
        /// Length of the supplied buffer.
        found: usize,
    },

    /// A replacement matrix has the wrong shape.
    #[error("{name:?} expects shape {expected:?}, got {found:?}")]
    ShapeMismatch {
        /// The target (block name or `data`).
        name: String,
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Supplied `(rows, cols)`.
        found: (usize, usize),
    },

    /// An archive path does not carry the archive extension.
    #[error("{path:?} does not have the .{expected} extension")]
    InvalidExtension {
        /// The rejected path.
        path: PathBuf,
        /// The required extension.
        expected: &'static str,
    },

    /// Knot point index outside `0..T`.
    #[error("knot point {t} out of range for trajectory with {len} timesteps")]
    KnotPointOutOfRange {
        /// Requested index.
        t: usize,
        /// Number of timesteps.
        len: usize,
    },

    /// A name lookup failed outside of construction.
    #[error("no block or aggregate named {0:?}")]
    NotFound(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive does not start with the expected magic bytes.
    #[error("invalid archive: expected magic bytes 'NTJ1', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Archive was written by an unsupported format version.
    #[error("unsupported archive version: {0} (supported: 1)")]
    UnsupportedVersion(u32),

    /// Archive header sets flag bits this version does not understand.
    #[error("unsupported archive flags: {0:#x}")]
    UnsupportedFlags(u32),

    /// Archive encoding failed.
    #[error("archive serialization error: {0}")]
    Serialize(String),

    /// Archive decoding failed.
    #[error("archive deserialization error: {0}")]
    Deserialize(String),
}

impl TrajectoryError {
    /// Creates an unknown-name error for the given metadata table.
    #[must_use]
    pub fn unknown_name(context: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownName {
            context,
            name: name.into(),
        }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(
        context: &'static str,
        name: impl Into<String>,
        expected: usize,
        found: usize,
    ) -> Self {
        Self::DimensionMismatch {
            context,
            name: name.into(),
            expected,
            found,
        }
    }

    /// Creates an invalid components error.
    #[must_use]
    pub fn invalid_components(reason: impl Into<String>) -> Self {
        Self::InvalidComponents(reason.into())
    }

    /// Creates an invalid timestep error.
    #[must_use]
    pub fn invalid_timestep(reason: impl Into<String>) -> Self {
        Self::InvalidTimestep(reason.into())
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(
        name: impl Into<String>,
        expected: (usize, usize),
        found: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }

    /// Returns `true` if the error stems from malformed construction input.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoBlocks
                | Self::NoControls
                | Self::UnknownControl(_)
                | Self::EmptyBlock(_)
                | Self::DuplicateName(_)
                | Self::ReservedName(_)
                | Self::EmptyTrajectory
                | Self::ColumnMismatch { .. }
                | Self::UnknownName { .. }
                | Self::DimensionMismatch { .. }
                | Self::InvalidComponents(_)
                | Self::NonContiguousComponent(_)
                | Self::MissingTimestep
                | Self::InvalidTimestep(_)
                | Self::BufferLengthMismatch { .. }
                | Self::ShapeMismatch { .. }
                | Self::InvalidExtension { .. }
                | Self::NotFound(_)
        )
    }

    /// Returns `true` if a timestep index was out of range.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::KnotPointOutOfRange { .. })
    }
}

/// Result type for trajectory operations.
pub type Result<T> = std::result::Result<T, TrajectoryError>;
