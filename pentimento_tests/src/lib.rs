// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pentimento tests.

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![allow(
    missing_debug_implementations,
    unreachable_pub,
    missing_docs,
    clippy::missing_assert_message,
    reason = "Test helpers"
)]

use anyhow::{bail, Result};
use pentimento::kurbo::{Affine, Rect};
use pentimento::peniko::Color;
use pentimento::{
    ClipContents, ClipCoverage, ClipCoverageStack, ClipOperation, ClipRestoreContents, Command,
    Entity, EntityPass, Picture, Recording, RenderOptions, SolidColorContents, TargetId,
};

pub struct TestParams {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub options: RenderOptions,
}

impl TestParams {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            options: RenderOptions::default(),
        }
    }

    pub fn viewport(&self) -> Rect {
        Rect::new(0., 0., f64::from(self.width), f64::from(self.height))
    }
}

/// Renders `picture` into a fresh [`Recording`].
pub fn render(picture: &Picture, params: &TestParams) -> Result<Recording> {
    render_pass(&picture.pass, params)
}

pub fn render_pass(pass: &EntityPass, params: &TestParams) -> Result<Recording> {
    let mut recording = Recording::new();
    if let Err(e) = pass.render(&mut recording, params.viewport(), &params.options) {
        bail!("{} failed to render: {e}", params.name);
    }
    Ok(recording)
}

/// A draw as seen by the backend.
#[derive(Clone, Debug)]
pub struct Draw {
    pub target: TargetId,
    pub scissor: Option<Rect>,
    pub entity: Entity,
}

/// Walks the commands of `recording`, pairing each draw with its target and
/// the scissor in effect for it.
pub fn draws(recording: &Recording) -> Vec<Draw> {
    let mut targets = vec![recording.root()];
    let mut scissor = None;
    let mut draws = Vec::new();
    for cmd in &recording.commands {
        match cmd {
            Command::BeginTarget { id, .. } => targets.push(*id),
            Command::EndTarget(_) => {
                targets.pop();
            }
            Command::SetScissor(rect) => scissor = *rect,
            Command::Restart(_) => {}
            Command::Draw(entity) => draws.push(Draw {
                target: targets[targets.len() - 1],
                scissor,
                entity: entity.clone(),
            }),
        }
    }
    draws
}

/// The clip region obtained by drawing the replay log of `stack` into a
/// clip buffer initialised with the coverage of the frame's first layer.
///
/// Assumes the replayed entities were recorded at pass position zero.
pub fn replay_clip_region(stack: &ClipCoverageStack) -> Option<Rect> {
    let mut region = stack.clip_coverage_layers().first()?.coverage;
    for replay in stack.replay_entities() {
        match replay.entity.clip_coverage(region) {
            ClipCoverage::Append(coverage) => region = coverage,
            ClipCoverage::NoChange | ClipCoverage::Restore(_) => {}
        }
    }
    region
}

pub fn solid(rect: Rect, color: Color) -> Entity {
    Entity::new(Affine::IDENTITY, SolidColorContents { rect, color })
}

pub fn clip(rect: Rect) -> Entity {
    Entity::new(
        Affine::IDENTITY,
        ClipContents {
            rect,
            op: ClipOperation::Intersect,
        },
    )
}

pub fn clip_restore(restore_height: usize) -> Entity {
    Entity::new(Affine::IDENTITY, ClipRestoreContents { restore_height })
}

/// A small deterministic generator for property-style tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    /// A value in `0..bound`.
    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }
}
