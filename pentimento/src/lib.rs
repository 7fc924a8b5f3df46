// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pentimento renders trees of entities in passes, tracking clip state as it goes.
//!
//! A [`Canvas`] records drawing commands, clips and layers into an
//! [`EntityPass`] tree. Rendering a pass walks the tree in order and feeds
//! every entity through a [`ClipCoverageStack`], which decides whether the
//! entity needs drawing at all and keeps a log of the clip entities that
//! make up the current clip. Nested layers render into their own offscreen
//! targets, each with an independent clip frame.
//!
//! When a backend has to restart a render pass, for example so that a layer
//! can read what has been drawn so far, its clip buffer is lost. The clip log
//! is then replayed so that subsequent drawing is clipped exactly as before.
//!
//! ```
//! use pentimento::kurbo::Rect;
//! use pentimento::peniko::color::palette::css::RED;
//! use pentimento::{Canvas, ClipOperation, Recording, RenderOptions};
//!
//! let mut canvas = Canvas::new(None);
//! canvas.save();
//! canvas.clip_rect(Rect::new(10., 10., 50., 50.), ClipOperation::Intersect);
//! canvas.draw_rect(Rect::new(0., 0., 100., 100.), RED);
//! canvas.restore();
//! let picture = canvas.end_recording();
//!
//! let mut recording = Recording::new();
//! picture
//!     .render(&mut recording, Rect::new(0., 0., 100., 100.), &RenderOptions::default())
//!     .expect("render failed");
//! assert_eq!(recording.draws().count(), 2);
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// See https://linebender.org/wiki/canonical-lints/
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]

mod canvas;
mod clip_stack;
mod pass;
mod recording;

/// Styling and composition primitives.
pub use peniko;
/// 2D geometry, with a focus on curves.
pub use peniko::kurbo;

pub use canvas::{Canvas, Picture};
pub use clip_stack::{ClipCoverageLayer, ClipCoverageStack, ClipStateResult, ReplayResult};
pub use pass::{Element, EntityPass};
pub use pentimento_entity::{
    ClipContents, ClipCoverage, ClipCoverageKind, ClipOperation, ClipRestoreContents, Contents,
    Entity, LayerContents, SolidColorContents, TargetId,
};
pub use recording::{Command, PassTarget, Recording};

use thiserror::Error;

/// Errors that can occur while rendering an [`EntityPass`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A subpass needs an offscreen target larger than allowed.
    #[error("Offscreen target of {width}x{height} exceeds the maximum size of {max}")]
    TargetTooLarge { width: u32, height: u32, max: u32 },
    /// A target was ended without a matching begin.
    #[error("Ended a target that was never begun")]
    UnbalancedTarget,
    /// The render options are unusable.
    #[error("Invalid render options: {0}")]
    InvalidOptions(&'static str),
}

/// Result type used by [`PassTarget`] implementations and rendering.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Options which are set at render time.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// The largest width or height, in pixels, of an offscreen target.
    pub max_target_size: u32,
    /// Skip entities whose coverage lies entirely outside the current clip.
    pub cull_clipped_entities: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_target_size: 8192,
            cull_clipped_entities: true,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_target_size == 0 {
            return Err(Error::InvalidOptions("max_target_size must be non-zero"));
        }
        Ok(())
    }
}
