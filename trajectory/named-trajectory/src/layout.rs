//! Block layout resolution.
//!
//! A [`BlockLayout`] assigns every declared block a contiguous run of rows in
//! the trajectory matrix, in declaration order, and derives the two aggregate
//! components [`STATES`] and [`CONTROLS`]. Row indices are 0-based; the
//! declared blocks tile `0..dim` exactly once.
//!
//! # Example
//!
//! ```
//! use named_trajectory::{BlockLayout, CONTROLS, STATES};
//!
//! let layout = BlockLayout::resolve(&[("x", 3), ("u", 2)], &["u"]).unwrap();
//!
//! assert_eq!(layout.dim(), 5);
//! assert_eq!(layout.component("x").unwrap().as_range(), Some(0..3));
//! assert_eq!(layout.component("u").unwrap().as_range(), Some(3..5));
//! assert_eq!(layout.dim_of(STATES), Some(3));
//! assert_eq!(layout.dim_of(CONTROLS), Some(2));
//! ```

use std::ops::Range;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Result, TrajectoryError};

/// Name of the aggregate component covering every non-control block.
pub const STATES: &str = "states";

/// Name of the aggregate component covering every control block.
pub const CONTROLS: &str = "controls";

/// An ordered set of row indices, stored as disjoint ascending segments.
///
/// Declared blocks always have exactly one segment. Aggregates may have
/// several when control and state blocks are interleaved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    segments: Vec<Range<usize>>,
}

impl Component {
    /// Creates a single-segment component.
    #[must_use]
    pub fn contiguous(rows: Range<usize>) -> Self {
        Self::from_segments([rows])
    }

    /// Creates a component from segments listed in ascending order.
    ///
    /// Empty segments are dropped and touching segments are merged, so
    /// `[0..2, 2..3]` becomes `[0..3]`.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = Range<usize>>) -> Self {
        let mut merged: Vec<Range<usize>> = Vec::new();
        for segment in segments.into_iter().filter(|s| !s.is_empty()) {
            match merged.last_mut() {
                Some(last) if last.end == segment.start => last.end = segment.end,
                _ => merged.push(segment),
            }
        }
        Self { segments: merged }
    }

    /// Number of rows in the component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.iter().map(ExactSizeIterator::len).sum()
    }

    /// Returns `true` if the component holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The disjoint row segments, in ascending order.
    #[must_use]
    pub fn segments(&self) -> &[Range<usize>] {
        &self.segments
    }

    /// Returns the single row range if the component is contiguous.
    ///
    /// An empty component is reported as the empty range `0..0`.
    #[must_use]
    pub fn as_range(&self) -> Option<Range<usize>> {
        match self.segments.as_slice() {
            [] => Some(0..0),
            [only] => Some(only.clone()),
            _ => None,
        }
    }

    /// Returns `true` if the component is a single run of rows.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.segments.len() <= 1
    }

    /// Iterates over every row index, in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().flat_map(Clone::clone)
    }

    /// Returns `true` if `row` belongs to the component.
    #[must_use]
    pub fn contains(&self, row: usize) -> bool {
        self.segments.iter().any(|s| s.contains(&row))
    }

    /// Maps a position within the component to its row in the full matrix.
    #[must_use]
    pub fn row(&self, position: usize) -> Option<usize> {
        let mut remaining = position;
        for segment in &self.segments {
            if remaining < segment.len() {
                return Some(segment.start + remaining);
            }
            remaining -= segment.len();
        }
        None
    }
}

/// Resolved partition of the trajectory rows into named blocks.
///
/// Built either by [`resolve`](Self::resolve) from block row counts, or by
/// [`from_components`](Self::from_components), which validates an explicitly
/// supplied partition against a known row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    names: Vec<String>,
    control_names: Vec<String>,
    dim: usize,
    dims: HashMap<String, usize>,
    components: HashMap<String, Component>,
    states: Component,
    controls: Component,
}

impl BlockLayout {
    /// Resolves a layout from `(name, rows)` pairs in declaration order.
    ///
    /// The first block gets rows `0..k1`, the second `k1..k1+k2`, and so on.
    ///
    /// # Errors
    ///
    /// - [`TrajectoryError::NoBlocks`] if `blocks` is empty
    /// - [`TrajectoryError::NoControls`] if `controls` is empty
    /// - [`TrajectoryError::UnknownControl`] if a control is not a block
    /// - [`TrajectoryError::EmptyBlock`] for a block with zero rows
    /// - [`TrajectoryError::DuplicateName`] / [`TrajectoryError::ReservedName`]
    ///   for a repeated name or one of the aggregate names
    pub fn resolve<N, C>(blocks: &[(N, usize)], controls: &[C]) -> Result<Self>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        if blocks.is_empty() {
            return Err(TrajectoryError::NoBlocks);
        }

        let mut names = Vec::with_capacity(blocks.len());
        let mut seen = HashSet::with_capacity(blocks.len());
        for (name, rows) in blocks {
            let name = name.as_ref();
            if name == STATES || name == CONTROLS {
                return Err(TrajectoryError::ReservedName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(TrajectoryError::DuplicateName(name.to_string()));
            }
            if *rows == 0 {
                return Err(TrajectoryError::EmptyBlock(name.to_string()));
            }
            names.push(name.to_string());
        }

        let control_set = Self::check_controls(&seen, controls)?;

        let mut dims = HashMap::with_capacity(blocks.len() + 2);
        let mut components = HashMap::with_capacity(blocks.len() + 2);
        let mut state_segments = Vec::new();
        let mut control_segments = Vec::new();
        let mut offset = 0;

        for (name, rows) in blocks {
            let name = name.as_ref();
            let rows_range = offset..offset + rows;
            if control_set.contains(name) {
                control_segments.push(rows_range.clone());
            } else {
                state_segments.push(rows_range.clone());
            }
            dims.insert(name.to_string(), *rows);
            components.insert(name.to_string(), Component::contiguous(rows_range));
            offset += rows;
        }

        let states = Component::from_segments(state_segments);
        let controls_component = Component::from_segments(control_segments);
        dims.insert(STATES.to_string(), states.len());
        dims.insert(CONTROLS.to_string(), controls_component.len());
        components.insert(STATES.to_string(), states.clone());
        components.insert(CONTROLS.to_string(), controls_component.clone());

        let control_names = names
            .iter()
            .filter(|n| control_set.contains(n.as_str()))
            .cloned()
            .collect();

        debug!(dim = offset, blocks = names.len(), "resolved block layout");

        Ok(Self {
            names,
            control_names,
            dim: offset,
            dims,
            components,
            states,
            controls: controls_component,
        })
    }

    /// Validates an explicit partition of `0..dim` and builds its layout.
    ///
    /// Each entry lists the rows of one block. Concatenated in the given
    /// order, the rows must be exactly `0, 1, ..., dim - 1`, which makes the
    /// blocks contiguous, pairwise disjoint and exhaustive.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::InvalidComponents`] if the rows overlap, leave a
    /// gap, run past `dim`, or stop short of it. Name and control checks
    /// are the same as for [`resolve`](Self::resolve).
    pub fn from_components<N, C>(
        components: &[(N, Vec<usize>)],
        dim: usize,
        controls: &[C],
    ) -> Result<Self>
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        if components.is_empty() {
            return Err(TrajectoryError::NoBlocks);
        }

        let mut expected = 0;
        let mut blocks = Vec::with_capacity(components.len());
        for (name, rows) in components {
            let name = name.as_ref();
            if rows.is_empty() {
                return Err(TrajectoryError::EmptyBlock(name.to_string()));
            }
            for &row in rows {
                if row >= dim {
                    return Err(TrajectoryError::invalid_components(format!(
                        "block {name:?} references row {row}, but dim is {dim}"
                    )));
                }
                if row < expected {
                    return Err(TrajectoryError::invalid_components(format!(
                        "block {name:?} row {row} overlaps an earlier block"
                    )));
                }
                if row > expected {
                    return Err(TrajectoryError::invalid_components(format!(
                        "block {name:?} skips rows {expected}..{row}"
                    )));
                }
                expected += 1;
            }
            blocks.push((name, rows.len()));
        }
        if expected != dim {
            return Err(TrajectoryError::invalid_components(format!(
                "rows {expected}..{dim} are not assigned to any block"
            )));
        }

        debug!(dim, blocks = blocks.len(), "validated explicit components");
        Self::resolve(&blocks, controls)
    }

    fn check_controls<'a, C: AsRef<str>>(
        declared: &HashSet<&str>,
        controls: &'a [C],
    ) -> Result<HashSet<&'a str>> {
        if controls.is_empty() {
            return Err(TrajectoryError::NoControls);
        }
        let mut set = HashSet::with_capacity(controls.len());
        for control in controls {
            let control = control.as_ref();
            if !declared.contains(control) {
                return Err(TrajectoryError::UnknownControl(control.to_string()));
            }
            set.insert(control);
        }
        Ok(set)
    }

    /// Total number of rows.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Declared block names, in declaration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Control block names, in declaration order.
    #[must_use]
    pub fn control_names(&self) -> &[String] {
        &self.control_names
    }

    /// Returns `true` if `name` is a declared control block.
    #[must_use]
    pub fn is_control(&self, name: &str) -> bool {
        self.control_names.iter().any(|c| c == name)
    }

    /// Returns `true` if `name` is a declared block (aggregates excluded).
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        name != STATES && name != CONTROLS && self.components.contains_key(name)
    }

    /// Row counts of every block and both aggregates.
    #[must_use]
    pub const fn dims(&self) -> &HashMap<String, usize> {
        &self.dims
    }

    /// Row count of a block or aggregate.
    #[must_use]
    pub fn dim_of(&self, name: &str) -> Option<usize> {
        self.dims.get(name).copied()
    }

    /// Components of every block and both aggregates.
    #[must_use]
    pub const fn components(&self) -> &HashMap<String, Component> {
        &self.components
    }

    /// Component of a block or aggregate.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Component covering every non-control block.
    #[must_use]
    pub const fn states(&self) -> &Component {
        &self.states
    }

    /// Component covering every control block.
    #[must_use]
    pub const fn controls(&self) -> &Component {
        &self.controls
    }

    /// Row range of a block or aggregate that occupies one contiguous run.
    ///
    /// # Errors
    ///
    /// [`TrajectoryError::NotFound`] for an unknown name and
    /// [`TrajectoryError::NonContiguousComponent`] for an aggregate split
    /// across several segments.
    pub fn contiguous_rows(&self, name: &str) -> Result<Range<usize>> {
        self.component(name)
            .ok_or_else(|| TrajectoryError::NotFound(name.to_string()))?
            .as_range()
            .ok_or_else(|| TrajectoryError::NonContiguousComponent(name.to_string()))
    }

    /// Row range of a declared block.
    #[must_use]
    pub fn block_rows(&self, name: &str) -> Option<Range<usize>> {
        if !self.is_declared(name) {
            return None;
        }
        self.components.get(name).and_then(Component::as_range)
    }

    /// Iterates over `(name, rows)` for every declared block, in order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, Range<usize>)> + '_ {
        self.names
            .iter()
            .filter_map(|name| self.block_rows(name).map(|rows| (name.as_str(), rows)))
    }
}
