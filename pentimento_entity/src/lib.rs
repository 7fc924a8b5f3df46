// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entities and the contents they draw.
//!
//! An [`Entity`] is one unit of drawing in a render pass. Its [`Contents`]
//! report what area they cover and how, if at all, they change the clip
//! state of the pass they are drawn into (see [`ClipCoverage`]).

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
#![allow(missing_docs, reason = "Contents fields are self-describing.")]

mod contents;
mod coverage;
mod entity;

pub use contents::{
    ClipContents, ClipOperation, ClipRestoreContents, Contents, LayerContents, SolidColorContents,
    TargetId,
};
pub use coverage::{overlaps, ClipCoverage, ClipCoverageKind};
pub use entity::Entity;

/// Styling and composition primitives.
pub use peniko;
/// 2D geometry, with a focus on curves.
pub use peniko::kurbo;
