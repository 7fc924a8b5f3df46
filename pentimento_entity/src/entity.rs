// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::kurbo::{Affine, Rect, Vec2};

use crate::{overlaps, ClipCoverage, Contents};

/// A single drawing operation in a render pass.
///
/// Entities are cheap to clone; the clip stack keeps owned clones of the
/// clip entities it may need to replay.
#[derive(Clone, Debug)]
pub struct Entity {
    pub transform: Affine,
    pub contents: Contents,
}

impl Entity {
    pub fn new(transform: Affine, contents: impl Into<Contents>) -> Self {
        Self {
            transform,
            contents: contents.into(),
        }
    }

    /// The bounding box of the pixels this entity draws.
    pub fn coverage(&self) -> Option<Rect> {
        self.contents.coverage(self.transform)
    }

    /// The clip change this entity requests while `current_clip_coverage` is in effect.
    pub fn clip_coverage(&self, current_clip_coverage: Option<Rect>) -> ClipCoverage {
        self.contents
            .clip_coverage(self.transform, current_clip_coverage)
    }

    /// Whether drawing this entity can have any effect under `clip_coverage`.
    ///
    /// Clip entities always do: they maintain the clip buffer even when they
    /// produce no pixels.
    pub fn should_render(&self, clip_coverage: Option<Rect>) -> bool {
        if self.contents.is_clip() {
            return true;
        }
        let Some(clip_coverage) = clip_coverage else {
            return true;
        };
        self.coverage()
            .is_some_and(|coverage| overlaps(coverage, clip_coverage))
    }

    /// Returns a copy of this entity moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            transform: Affine::translate(offset) * self.transform,
            ..*self
        }
    }
}
