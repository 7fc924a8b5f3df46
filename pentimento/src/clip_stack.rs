// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip coverage tracking across nested render passes.

use pentimento_entity::{ClipCoverage, ClipCoverageKind, Entity};
use peniko::kurbo::{Point, Rect};
use smallvec::{smallvec, SmallVec};

/// One entry in a clip frame's history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipCoverageLayer {
    /// The area drawing is restricted to, in global coordinates.
    ///
    /// `None` means the layer has no bounded rectangle.
    pub coverage: Option<Rect>,
    /// The logical height of this layer, used as a restore target.
    pub clip_height: usize,
}

/// A clip entity kept so that it can be redrawn into a fresh clip buffer.
#[derive(Clone, Debug)]
pub struct ReplayResult {
    pub entity: Entity,
    /// The clip coverage that was in effect when the entity was recorded.
    pub clip_coverage: Option<Rect>,
}

/// The outcome of [`ClipCoverageStack::apply_clip_state`].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ClipStateResult {
    /// Whether the entity must be drawn.
    pub should_render: bool,
    /// Whether the current clip coverage changed.
    pub clip_did_change: bool,
    /// For a restore that took effect, the pass-local area uncovered by it.
    pub restore_coverage: Option<Rect>,
}

#[derive(Debug)]
struct SubpassState {
    clip_coverage: SmallVec<[ClipCoverageLayer; 4]>,
    rendered_clip_entities: Vec<ReplayResult>,
}

impl SubpassState {
    fn new(coverage: Option<Rect>, clip_height: usize) -> Self {
        Self {
            clip_coverage: smallvec![ClipCoverageLayer {
                coverage,
                clip_height,
            }],
            rendered_clip_entities: Vec::new(),
        }
    }
}

/// Tracks clip coverage for a render pass and the subpasses nested in it.
///
/// Each subpass gets its own clip frame, seeded from the subpass coverage.
/// Only the innermost frame is visible; outer frames are untouched until the
/// subpass is popped.
#[derive(Debug)]
pub struct ClipCoverageStack {
    subpass_state: Vec<SubpassState>,
}
static_assertions::assert_impl_all!(ClipCoverageStack: Send, Sync);

impl ClipCoverageStack {
    /// Creates a stack for a render target whose drawable area is `initial_coverage_rect`.
    pub fn new(initial_coverage_rect: Rect) -> Self {
        Self {
            subpass_state: vec![SubpassState::new(Some(initial_coverage_rect), 0)],
        }
    }

    /// The coverage of the innermost clip layer.
    ///
    /// `None` means there is no bounded clip, and drawing is unrestricted.
    pub fn current_clip_coverage(&self) -> Option<Rect> {
        self.current_subpass_state()
            .clip_coverage
            .last()
            .and_then(|layer| layer.coverage)
    }

    /// Whether the current frame has any clip layers.
    pub fn has_coverage(&self) -> bool {
        !self.current_subpass_state().clip_coverage.is_empty()
    }

    /// Enters a subpass with its own clip frame.
    pub fn push_subpass(&mut self, subpass_coverage: Option<Rect>, clip_height: usize) {
        log::trace!(
            "push subpass {} at clip height {clip_height}",
            self.subpass_state.len()
        );
        self.subpass_state
            .push(SubpassState::new(subpass_coverage, clip_height));
    }

    /// Leaves the current subpass, discarding its clip frame.
    ///
    /// # Panics
    ///
    /// If called without a matching [`push_subpass`](Self::push_subpass).
    pub fn pop_subpass(&mut self) {
        assert!(
            self.subpass_state.len() > 1,
            "clip stack underflowed: pop_subpass without matching push_subpass"
        );
        self.subpass_state.pop();
        log::trace!("pop subpass {}", self.subpass_state.len());
    }

    /// The clip layers of the current frame, oldest first.
    pub fn clip_coverage_layers(&self) -> &[ClipCoverageLayer] {
        &self.current_subpass_state().clip_coverage
    }

    /// Applies the clip change requested by `entity` and decides whether it
    /// needs to be drawn.
    ///
    /// `global_pass_position` is the global origin of the pass being rendered.
    ///
    /// # Panics
    ///
    /// If the clip heights of the current frame are no longer contiguous, or if
    /// a restore targets a height below the bottom of the current frame.
    pub fn apply_clip_state(
        &mut self,
        global_clip_coverage: ClipCoverage,
        entity: &Entity,
        clip_height_floor: usize,
        global_pass_position: Point,
    ) -> ClipStateResult {
        let mut result = ClipStateResult::default();

        let subpass_state = self.current_subpass_state_mut();
        match global_clip_coverage {
            ClipCoverage::NoChange => {}
            ClipCoverage::Append(coverage) => {
                let op = subpass_state
                    .clip_coverage
                    .last()
                    .and_then(|layer| layer.coverage);

                let previous_clip_height = subpass_state
                    .clip_coverage
                    .last()
                    .map_or(clip_height_floor, |layer| layer.clip_height);

                subpass_state.clip_coverage.push(ClipCoverageLayer {
                    coverage,
                    clip_height: previous_clip_height + 1,
                });
                result.clip_did_change = true;

                let layers = &subpass_state.clip_coverage;
                assert_eq!(
                    layers[layers.len() - 1].clip_height,
                    layers[0].clip_height + layers.len() - 1,
                    "clip heights are not contiguous"
                );

                if op.is_none() {
                    // Running this append op won't impact the clip buffer
                    // because the whole screen is already being clipped.
                    return result;
                }
            }
            ClipCoverage::Restore(restore_height) => {
                let (Some(bottom), Some(top)) = (
                    subpass_state.clip_coverage.first(),
                    subpass_state.clip_coverage.last(),
                ) else {
                    return result;
                };
                if top.clip_height <= restore_height {
                    // Nothing to undo.
                    return result;
                }

                let restoration_index = restore_height
                    .checked_sub(bottom.clip_height)
                    .filter(|&index| index < subpass_state.clip_coverage.len());
                let Some(restoration_index) = restoration_index else {
                    panic!(
                        "restore height {restore_height} is below the clip frame floor {}",
                        bottom.clip_height
                    );
                };

                // Only the area covered by the layer above the target height
                // needs restoring.
                result.restore_coverage = subpass_state
                    .clip_coverage
                    .get(restoration_index + 1)
                    .and_then(|layer| layer.coverage)
                    .map(|coverage| coverage - global_pass_position.to_vec2());

                subpass_state.clip_coverage.truncate(restoration_index + 1);
                result.clip_did_change = true;

                let restored_is_bounded = subpass_state
                    .clip_coverage
                    .last()
                    .is_some_and(|layer| layer.coverage.is_some());
                if restored_is_bounded {
                    self.record_entity(entity, ClipCoverageKind::Restore, Some(Rect::ZERO));
                }
                return result;
            }
        }

        let coverage = self.current_clip_coverage();
        self.record_entity(entity, global_clip_coverage.kind(), coverage);

        result.should_render = true;
        result
    }

    /// Updates the replay log of the current frame for an entity of the given kind.
    ///
    /// Appends keep a clone of `entity`; restores drop the most recent record.
    pub fn record_entity(
        &mut self,
        entity: &Entity,
        kind: ClipCoverageKind,
        clip_coverage: Option<Rect>,
    ) {
        let subpass_state = self.current_subpass_state_mut();
        match kind {
            ClipCoverageKind::NoChange => {}
            ClipCoverageKind::Append => {
                subpass_state.rendered_clip_entities.push(ReplayResult {
                    entity: entity.clone(),
                    clip_coverage,
                });
            }
            ClipCoverageKind::Restore => {
                subpass_state.rendered_clip_entities.pop();
            }
        }
    }

    /// The clip entities needed to rebuild the current frame's clip buffer, in draw order.
    pub fn replay_entities(&self) -> &[ReplayResult] {
        &self.current_subpass_state().rendered_clip_entities
    }

    /// Number of open frames, including the root frame.
    pub fn depth(&self) -> usize {
        self.subpass_state.len()
    }

    fn current_subpass_state(&self) -> &SubpassState {
        // The root frame is never popped.
        &self.subpass_state[self.subpass_state.len() - 1]
    }

    fn current_subpass_state_mut(&mut self) -> &mut SubpassState {
        let last = self.subpass_state.len() - 1;
        &mut self.subpass_state[last]
    }
}
