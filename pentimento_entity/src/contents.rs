// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use peniko::kurbo::{Affine, Point, Rect, Size};
use peniko::Color;

use crate::ClipCoverage;

/// Handle to a render target allocated by a pass backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetId(pub NonZeroU64);

impl TargetId {
    /// Allocates a fresh, process-unique id.
    pub fn next() -> Self {
        // We initialize with 1 so that the conversion below succeeds
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

/// How a clip shape combines with the clip already in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ClipOperation {
    /// Keep only the area inside the shape.
    #[default]
    Intersect,
    /// Remove the area inside the shape.
    Difference,
}

/// A rectangle filled with a solid color.
#[derive(Clone, Copy, Debug)]
pub struct SolidColorContents {
    pub rect: Rect,
    pub color: Color,
}

/// A clip shape. Drawing it narrows the clip buffer; it produces no color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipContents {
    pub rect: Rect,
    pub op: ClipOperation,
}

/// Returns the clip buffer to the state it had at `restore_height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ClipRestoreContents {
    pub restore_height: usize,
}

/// A finished offscreen target composited into its parent pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerContents {
    pub target: TargetId,
    /// Size of the target, in pixels. The layer is drawn with its origin at
    /// the entity transform's origin.
    pub size: Size,
    pub alpha: f32,
}

/// What an [`Entity`](crate::Entity) draws.
#[derive(Clone, Copy, Debug)]
pub enum Contents {
    Solid(SolidColorContents),
    Clip(ClipContents),
    ClipRestore(ClipRestoreContents),
    Layer(LayerContents),
}

impl Contents {
    /// The bounding box of the pixels this draws, after `transform`.
    ///
    /// Clip and restore contents never produce visible pixels and return `None`.
    pub fn coverage(&self, transform: Affine) -> Option<Rect> {
        match self {
            Self::Solid(solid) => Some(transform.transform_rect_bbox(solid.rect)),
            Self::Layer(layer) => Some(
                transform.transform_rect_bbox(Rect::from_origin_size(Point::ORIGIN, layer.size)),
            ),
            Self::Clip(_) | Self::ClipRestore(_) => None,
        }
    }

    /// The clip change requested when drawn with `transform` while
    /// `current_clip_coverage` is in effect.
    pub fn clip_coverage(
        &self,
        transform: Affine,
        current_clip_coverage: Option<Rect>,
    ) -> ClipCoverage {
        match self {
            Self::Solid(_) | Self::Layer(_) => ClipCoverage::NoChange,
            Self::Clip(clip) => match clip.op {
                // Subtracting a rectangle can leave an L-shaped region, so the
                // bounds don't shrink.
                ClipOperation::Difference => ClipCoverage::Append(current_clip_coverage),
                ClipOperation::Intersect => {
                    let bounds = transform.transform_rect_bbox(clip.rect);
                    let coverage = match current_clip_coverage {
                        Some(current) => current.intersect(bounds),
                        None => bounds,
                    };
                    ClipCoverage::Append(Some(coverage))
                }
            },
            Self::ClipRestore(restore) => ClipCoverage::Restore(restore.restore_height),
        }
    }

    /// Whether these contents only affect the clip buffer.
    pub fn is_clip(&self) -> bool {
        matches!(self, Self::Clip(_) | Self::ClipRestore(_))
    }
}

impl From<SolidColorContents> for Contents {
    fn from(contents: SolidColorContents) -> Self {
        Self::Solid(contents)
    }
}

impl From<ClipContents> for Contents {
    fn from(contents: ClipContents) -> Self {
        Self::Clip(contents)
    }
}

impl From<ClipRestoreContents> for Contents {
    fn from(contents: ClipRestoreContents) -> Self {
        Self::ClipRestore(contents)
    }
}

impl From<LayerContents> for Contents {
    fn from(contents: LayerContents) -> Self {
        Self::Layer(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peniko::kurbo::Vec2;

    fn clip(x0: f64, y0: f64, x1: f64, y1: f64, op: ClipOperation) -> Contents {
        Contents::Clip(ClipContents {
            rect: Rect::new(x0, y0, x1, y1),
            op,
        })
    }

    #[test]
    fn intersect_clip_narrows_current_coverage() {
        let contents = clip(10., 10., 50., 50., ClipOperation::Intersect);
        let coverage =
            contents.clip_coverage(Affine::IDENTITY, Some(Rect::new(0., 0., 30., 100.)));
        assert_eq!(
            coverage,
            ClipCoverage::Append(Some(Rect::new(10., 10., 30., 50.)))
        );
    }

    #[test]
    fn intersect_clip_applies_transform() {
        let contents = clip(0., 0., 10., 10., ClipOperation::Intersect);
        let transform = Affine::translate(Vec2::new(5., 5.));
        assert_eq!(
            contents.clip_coverage(transform, None),
            ClipCoverage::Append(Some(Rect::new(5., 5., 15., 15.)))
        );
    }

    #[test]
    fn disjoint_intersect_clip_stays_bounded() {
        let contents = clip(200., 200., 300., 300., ClipOperation::Intersect);
        let ClipCoverage::Append(Some(coverage)) =
            contents.clip_coverage(Affine::IDENTITY, Some(Rect::new(0., 0., 100., 100.)))
        else {
            panic!("expected bounded append");
        };
        assert!(coverage.is_zero_area());
    }

    #[test]
    fn difference_clip_keeps_current_coverage() {
        let current = Some(Rect::new(0., 0., 100., 100.));
        let contents = clip(10., 10., 20., 20., ClipOperation::Difference);
        assert_eq!(
            contents.clip_coverage(Affine::IDENTITY, current),
            ClipCoverage::Append(current)
        );
    }

    #[test]
    fn restore_carries_its_height() {
        let contents = Contents::ClipRestore(ClipRestoreContents { restore_height: 4 });
        assert_eq!(
            contents.clip_coverage(Affine::IDENTITY, None),
            ClipCoverage::Restore(4)
        );
        assert_eq!(contents.coverage(Affine::IDENTITY), None);
        assert!(contents.is_clip());
    }

    #[test]
    fn layer_coverage_starts_at_transform_origin() {
        let contents = Contents::Layer(LayerContents {
            target: TargetId::next(),
            size: Size::new(20., 10.),
            alpha: 1.0,
        });
        assert_eq!(
            contents.coverage(Affine::translate(Vec2::new(3., 4.))),
            Some(Rect::new(3., 4., 23., 14.))
        );
        assert_eq!(
            contents.clip_coverage(Affine::IDENTITY, None),
            ClipCoverage::NoChange
        );
    }

    #[test]
    fn target_ids_are_unique() {
        assert_ne!(TargetId::next(), TargetId::next());
    }
}
