//! Per-block metadata: bounds and initial, final and goal values.
//!
//! Raw inputs are collected in a [`MetadataSpec`] and checked against a
//! resolved [`BlockLayout`] by [`MetadataSpec::normalize`]. Every vector must
//! match its block's row count exactly; nothing is padded, truncated or
//! clamped.

use hashbrown::HashMap;
use nalgebra::DVector;

use crate::error::{Result, TrajectoryError};
use crate::layout::BlockLayout;

/// Bounds as supplied by the caller, before normalization.
///
/// # Example
///
/// ```
/// use named_trajectory::BoundSpec;
///
/// let bounds = BoundSpec::symmetric([1.0, 2.0, 3.0]).normalize();
/// assert_eq!(bounds.lower().as_slice(), &[-1.0, -2.0, -3.0]);
/// assert_eq!(bounds.upper().as_slice(), &[1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BoundSpec {
    /// `v` normalizes to `(-v, v)`.
    Symmetric(DVector<f64>),
    /// `(lo, hi)` normalizes to `([lo], [hi])`; only valid for 1-row blocks.
    Scalar(f64, f64),
    /// Explicit `(lower, upper)` vectors, passed through unchanged.
    Explicit(DVector<f64>, DVector<f64>),
}

impl BoundSpec {
    /// Symmetric bounds around zero.
    #[must_use]
    pub fn symmetric(values: impl IntoIterator<Item = f64>) -> Self {
        Self::Symmetric(DVector::from_vec(values.into_iter().collect()))
    }

    /// Scalar lower and upper bounds for a single-row block.
    #[must_use]
    pub const fn scalar(lower: f64, upper: f64) -> Self {
        Self::Scalar(lower, upper)
    }

    /// Explicit lower and upper vectors.
    #[must_use]
    pub fn explicit(
        lower: impl IntoIterator<Item = f64>,
        upper: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self::Explicit(
            DVector::from_vec(lower.into_iter().collect()),
            DVector::from_vec(upper.into_iter().collect()),
        )
    }

    /// Converts to canonical `(lower, upper)` form without length checks.
    #[must_use]
    pub fn normalize(&self) -> Bounds {
        match self {
            Self::Symmetric(v) => Bounds::new(-v, v.clone()),
            Self::Scalar(lo, hi) => {
                Bounds::new(DVector::from_element(1, *lo), DVector::from_element(1, *hi))
            }
            Self::Explicit(lower, upper) => Bounds::new(lower.clone(), upper.clone()),
        }
    }
}

impl From<(f64, f64)> for BoundSpec {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self::Scalar(lower, upper)
    }
}

impl From<Vec<f64>> for BoundSpec {
    fn from(values: Vec<f64>) -> Self {
        Self::Symmetric(DVector::from_vec(values))
    }
}

impl<const N: usize> From<[f64; N]> for BoundSpec {
    fn from(values: [f64; N]) -> Self {
        Self::symmetric(values)
    }
}

impl From<DVector<f64>> for BoundSpec {
    fn from(values: DVector<f64>) -> Self {
        Self::Symmetric(values)
    }
}

impl From<(Vec<f64>, Vec<f64>)> for BoundSpec {
    fn from((lower, upper): (Vec<f64>, Vec<f64>)) -> Self {
        Self::Explicit(DVector::from_vec(lower), DVector::from_vec(upper))
    }
}

impl From<Bounds> for BoundSpec {
    fn from(bounds: Bounds) -> Self {
        Self::Explicit(bounds.lower, bounds.upper)
    }
}

/// Canonical per-row bounds of one block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    lower: DVector<f64>,
    upper: DVector<f64>,
}

impl Bounds {
    /// Creates bounds from lower and upper vectors.
    #[must_use]
    pub const fn new(lower: DVector<f64>, upper: DVector<f64>) -> Self {
        Self { lower, upper }
    }

    /// Lower bound per row.
    #[must_use]
    pub const fn lower(&self) -> &DVector<f64> {
        &self.lower
    }

    /// Upper bound per row.
    #[must_use]
    pub const fn upper(&self) -> &DVector<f64> {
        &self.upper
    }

    /// Returns `v` if these bounds are `(-v, v)`.
    #[must_use]
    pub fn symmetric_radius(&self) -> Option<&DVector<f64>> {
        let symmetric = self.lower.len() == self.upper.len()
            && self
                .lower
                .iter()
                .zip(self.upper.iter())
                .all(|(lo, hi)| *lo == -*hi);
        symmetric.then_some(&self.upper)
    }

    /// Returns `true` if every entry of `values` lies within the bounds.
    #[must_use]
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.lower.len()
            && values
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}

/// Raw metadata tables in insertion order.
///
/// Inserting a name twice replaces the earlier entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSpec {
    bounds: Vec<(String, BoundSpec)>,
    initial: Vec<(String, DVector<f64>)>,
    final_values: Vec<(String, DVector<f64>)>,
    goal: Vec<(String, DVector<f64>)>,
}

fn upsert<V>(entries: &mut Vec<(String, V)>, name: String, value: V) {
    if let Some(entry) = entries.iter_mut().find(|(n, _)| *n == name) {
        entry.1 = value;
    } else {
        entries.push((name, value));
    }
}

impl MetadataSpec {
    /// Creates empty metadata tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bounds of a block.
    pub fn insert_bound(&mut self, name: impl Into<String>, bound: impl Into<BoundSpec>) {
        upsert(&mut self.bounds, name.into(), bound.into());
    }

    /// Sets the initial value of a block.
    pub fn insert_initial(&mut self, name: impl Into<String>, values: DVector<f64>) {
        upsert(&mut self.initial, name.into(), values);
    }

    /// Sets the final value of a block.
    pub fn insert_final(&mut self, name: impl Into<String>, values: DVector<f64>) {
        upsert(&mut self.final_values, name.into(), values);
    }

    /// Sets the goal value of a block.
    pub fn insert_goal(&mut self, name: impl Into<String>, values: DVector<f64>) {
        upsert(&mut self.goal, name.into(), values);
    }

    /// Validates every table against `layout` and canonicalizes bounds.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::UnknownName`] if a key is not a declared block
    /// - [`TrajectoryError::DimensionMismatch`] if a vector (or either side of
    ///   a normalized bound) does not have `dims[name]` entries
    pub fn normalize(&self, layout: &BlockLayout) -> Result<Metadata> {
        let mut bounds = HashMap::with_capacity(self.bounds.len());
        for (name, spec) in &self.bounds {
            let expected = declared_dim(layout, "bounds", name)?;
            let normalized = spec.normalize();
            if normalized.lower.len() != expected {
                return Err(TrajectoryError::dimension_mismatch(
                    "bounds.lower",
                    name,
                    expected,
                    normalized.lower.len(),
                ));
            }
            if normalized.upper.len() != expected {
                return Err(TrajectoryError::dimension_mismatch(
                    "bounds.upper",
                    name,
                    expected,
                    normalized.upper.len(),
                ));
            }
            bounds.insert(name.clone(), normalized);
        }

        Ok(Metadata {
            bounds,
            initial: check_values(layout, "initial", &self.initial)?,
            final_values: check_values(layout, "final", &self.final_values)?,
            goal: check_values(layout, "goal", &self.goal)?,
        })
    }
}

fn declared_dim(layout: &BlockLayout, context: &'static str, name: &str) -> Result<usize> {
    if !layout.is_declared(name) {
        return Err(TrajectoryError::unknown_name(context, name));
    }
    layout
        .dim_of(name)
        .ok_or_else(|| TrajectoryError::unknown_name(context, name))
}

fn check_values(
    layout: &BlockLayout,
    context: &'static str,
    entries: &[(String, DVector<f64>)],
) -> Result<HashMap<String, DVector<f64>>> {
    let mut table = HashMap::with_capacity(entries.len());
    for (name, values) in entries {
        let expected = declared_dim(layout, context, name)?;
        if values.len() != expected {
            return Err(TrajectoryError::dimension_mismatch(
                context,
                name,
                expected,
                values.len(),
            ));
        }
        table.insert(name.clone(), values.clone());
    }
    Ok(table)
}

/// Validated metadata tables, keyed by declared block name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    bounds: HashMap<String, Bounds>,
    initial: HashMap<String, DVector<f64>>,
    final_values: HashMap<String, DVector<f64>>,
    goal: HashMap<String, DVector<f64>>,
}

impl Metadata {
    /// Normalized bounds.
    #[must_use]
    pub const fn bounds(&self) -> &HashMap<String, Bounds> {
        &self.bounds
    }

    /// Initial values.
    #[must_use]
    pub const fn initial(&self) -> &HashMap<String, DVector<f64>> {
        &self.initial
    }

    /// Final values.
    #[must_use]
    pub const fn final_values(&self) -> &HashMap<String, DVector<f64>> {
        &self.final_values
    }

    /// Goal values.
    #[must_use]
    pub const fn goal(&self) -> &HashMap<String, DVector<f64>> {
        &self.goal
    }

    /// Converts back into raw tables, bounds in explicit form.
    #[must_use]
    pub fn to_spec(&self) -> MetadataSpec {
        let mut spec = MetadataSpec::new();
        for (name, bounds) in sorted(&self.bounds) {
            spec.insert_bound(name.clone(), bounds.clone());
        }
        for (name, values) in sorted(&self.initial) {
            spec.insert_initial(name.clone(), values.clone());
        }
        for (name, values) in sorted(&self.final_values) {
            spec.insert_final(name.clone(), values.clone());
        }
        for (name, values) in sorted(&self.goal) {
            spec.insert_goal(name.clone(), values.clone());
        }
        spec
    }
}

/// Entries of a table ordered by name.
pub(crate) fn sorted<V>(table: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = table.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn layout() -> BlockLayout {
        BlockLayout::resolve(&[("x", 3), ("a", 1), ("u", 2)], &["u"]).unwrap()
    }

    #[test]
    fn test_symmetric_bounds() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("x", BoundSpec::symmetric([1.0, 2.0, 3.0]));
        let metadata = spec.normalize(&layout()).unwrap();

        let bounds = &metadata.bounds()["x"];
        assert_eq!(bounds.lower().as_slice(), &[-1.0, -2.0, -3.0]);
        assert_eq!(bounds.upper().as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(bounds.symmetric_radius().unwrap().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_scalar_bounds_on_single_row() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("a", (-0.5, 2.0));
        let metadata = spec.normalize(&layout()).unwrap();

        let bounds = &metadata.bounds()["a"];
        assert_eq!(bounds.lower().as_slice(), &[-0.5]);
        assert_eq!(bounds.upper().as_slice(), &[2.0]);
        assert!(bounds.symmetric_radius().is_none());
    }

    #[test]
    fn test_scalar_bounds_on_vector_block_fail() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("u", (-1.0, 1.0));
        let err = spec.normalize(&layout()).unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::DimensionMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_explicit_bounds_pass_through() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("u", (vec![0.0, -2.0], vec![1.0, 5.0]));
        let metadata = spec.normalize(&layout()).unwrap();
        let bounds = &metadata.bounds()["u"];
        assert_eq!(bounds.lower().as_slice(), &[0.0, -2.0]);
        assert_eq!(bounds.upper().as_slice(), &[1.0, 5.0]);
    }

    #[test]
    fn test_explicit_bounds_length_mismatch() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("u", (vec![0.0, -2.0], vec![1.0]));
        let err = spec.normalize(&layout()).unwrap_err();
        assert!(err.to_string().contains("bounds.upper"));
    }

    #[test]
    fn test_unknown_name() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("z", vec![1.0]);
        let err = spec.normalize(&layout()).unwrap_err();
        assert!(matches!(
            err,
            TrajectoryError::UnknownName { context: "bounds", ref name } if name == "z"
        ));
    }

    #[test]
    fn test_aggregate_names_are_not_declared() {
        let mut spec = MetadataSpec::new();
        spec.insert_goal("states", DVector::zeros(4));
        assert!(matches!(
            spec.normalize(&layout()),
            Err(TrajectoryError::UnknownName { context: "goal", .. })
        ));
    }

    #[test]
    fn test_initial_length_mismatch() {
        let mut spec = MetadataSpec::new();
        spec.insert_initial("x", DVector::from_vec(vec![1.0, 2.0]));
        let err = spec.normalize(&layout()).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            TrajectoryError::DimensionMismatch { context: "initial", expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_final_and_goal_checked() {
        let mut spec = MetadataSpec::new();
        spec.insert_final("u", DVector::zeros(2));
        spec.insert_goal("x", DVector::zeros(4));
        let err = spec.normalize(&layout()).unwrap_err();
        assert!(matches!(err, TrajectoryError::DimensionMismatch { context: "goal", .. }));
    }

    #[test]
    fn test_insert_replaces() {
        let mut spec = MetadataSpec::new();
        spec.insert_initial("x", DVector::zeros(2));
        spec.insert_initial("x", DVector::zeros(3));
        assert!(spec.normalize(&layout()).is_ok());
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = BoundSpec::symmetric([1.0, 2.0]).normalize();
        assert!(bounds.contains(&[0.5, -2.0]));
        assert!(!bounds.contains(&[1.5, 0.0]));
        assert!(!bounds.contains(&[0.0]));
    }

    #[test]
    fn test_to_spec_round_trip() {
        let mut spec = MetadataSpec::new();
        spec.insert_bound("x", [1.0, 2.0, 3.0]);
        spec.insert_initial("a", DVector::from_element(1, 4.0));
        let metadata = spec.normalize(&layout()).unwrap();
        let again = metadata.to_spec().normalize(&layout()).unwrap();
        assert_eq!(metadata, again);
    }
}
