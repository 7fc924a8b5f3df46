// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::Rect;

/// The change an entity requests to the clip state of the pass it is drawn into.
///
/// Coverage rectangles are in global (root pass) coordinates. `None` coverage
/// means the clip has no bounded rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipCoverage {
    /// The entity leaves clipping untouched.
    NoChange,
    /// The entity introduces a new clip layer with the given coverage.
    Append(Option<Rect>),
    /// The entity returns the clip state to what it was when the given clip
    /// height was current.
    Restore(usize),
}

impl ClipCoverage {
    /// The kind of this request, without its payload.
    pub fn kind(&self) -> ClipCoverageKind {
        match self {
            Self::NoChange => ClipCoverageKind::NoChange,
            Self::Append(_) => ClipCoverageKind::Append,
            Self::Restore(_) => ClipCoverageKind::Restore,
        }
    }
}

/// The kind of a [`ClipCoverage`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipCoverageKind {
    /// See [`ClipCoverage::NoChange`].
    NoChange,
    /// See [`ClipCoverage::Append`].
    Append,
    /// See [`ClipCoverage::Restore`].
    Restore,
}

/// Whether two rectangles share a region of non-zero area.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    !a.intersect(b).is_zero_area()
}
