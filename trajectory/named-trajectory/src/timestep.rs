//! Timestep policy.

use crate::error::{Result, TrajectoryError};
use crate::layout::BlockLayout;

/// How the time increment between consecutive knot points is defined.
///
/// # Example
///
/// ```
/// use named_trajectory::Timestep;
///
/// let fixed: Timestep = 0.1.into();
/// assert!(!fixed.is_dynamical());
///
/// let dynamical = Timestep::dynamical("dt");
/// assert_eq!(dynamical.block_name(), Some("dt"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timestep {
    /// The same positive increment for every column.
    Fixed(f64),
    /// Each column's increment is stored in the named single-row block.
    Dynamical(String),
}

impl Timestep {
    /// Per-column timesteps read from the named block.
    #[must_use]
    pub fn dynamical(name: impl Into<String>) -> Self {
        Self::Dynamical(name.into())
    }

    /// Returns `true` for per-column timesteps.
    #[must_use]
    pub const fn is_dynamical(&self) -> bool {
        matches!(self, Self::Dynamical(_))
    }

    /// The fixed increment, if any.
    #[must_use]
    pub const fn fixed_value(&self) -> Option<f64> {
        match self {
            Self::Fixed(dt) => Some(*dt),
            Self::Dynamical(_) => None,
        }
    }

    /// The block holding per-column increments, if any.
    #[must_use]
    pub fn block_name(&self) -> Option<&str> {
        match self {
            Self::Fixed(_) => None,
            Self::Dynamical(name) => Some(name),
        }
    }

    /// Checks the policy against a resolved layout.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::InvalidTimestep`] if a fixed increment is not a
    /// finite positive number, or if the dynamical block is not a declared
    /// single-row block.
    pub fn validate(&self, layout: &BlockLayout) -> Result<()> {
        match self {
            Self::Fixed(dt) if dt.is_finite() && *dt > 0.0 => Ok(()),
            Self::Fixed(dt) => Err(TrajectoryError::invalid_timestep(format!(
                "fixed timestep must be finite and positive, got {dt}"
            ))),
            Self::Dynamical(name) => {
                if !layout.is_declared(name) {
                    return Err(TrajectoryError::invalid_timestep(format!(
                        "timestep block {name:?} is not declared"
                    )));
                }
                match layout.dim_of(name) {
                    Some(1) => Ok(()),
                    Some(rows) => Err(TrajectoryError::invalid_timestep(format!(
                        "timestep block {name:?} must have one row, has {rows}"
                    ))),
                    None => Err(TrajectoryError::invalid_timestep(format!(
                        "timestep block {name:?} is not declared"
                    ))),
                }
            }
        }
    }
}

impl From<f64> for Timestep {
    fn from(dt: f64) -> Self {
        Self::Fixed(dt)
    }
}
