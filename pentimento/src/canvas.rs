// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A save/restore drawing API that records into an [`EntityPass`] tree.

use pentimento_entity::{
    ClipContents, ClipOperation, ClipRestoreContents, Contents, Entity, SolidColorContents,
};
use peniko::kurbo::{Affine, Rect, Vec2};
use peniko::Color;

use crate::{EntityPass, PassTarget, RenderOptions, Result};

#[derive(Clone, Copy, Debug)]
struct CanvasStackEntry {
    transform: Affine,
    cull_rect: Option<Rect>,
    clip_height: usize,
    num_clips: usize,
    is_subpass: bool,
}

/// Records drawing commands into an [`EntityPass`] tree.
///
/// Clips are scoped by [`save`](Self::save)/[`restore`](Self::restore) pairs.
/// Every clip raises the clip height by one, and restoring past a clip emits
/// an entity that returns the clip state to the height at the matching save.
#[derive(Debug)]
pub struct Canvas {
    transform_stack: Vec<CanvasStackEntry>,
    /// Open passes, innermost last. The first is the root pass.
    pass_stack: Vec<EntityPass>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Canvas {
    /// Creates a canvas. Clips that fully cover `cull_rect` are dropped.
    pub fn new(cull_rect: Option<Rect>) -> Self {
        Self {
            transform_stack: vec![CanvasStackEntry {
                transform: Affine::IDENTITY,
                cull_rect,
                clip_height: 0,
                num_clips: 0,
                is_subpass: false,
            }],
            pass_stack: vec![EntityPass::new()],
        }
    }

    pub fn save(&mut self) {
        let entry = CanvasStackEntry {
            num_clips: 0,
            is_subpass: false,
            ..*self.top()
        };
        self.transform_stack.push(entry);
    }

    /// Saves the canvas state and redirects drawing to a new subpass.
    ///
    /// `bounds` are in the current local coordinate space.
    pub fn save_layer(&mut self, alpha: f32, bounds: Option<Rect>, reads_backdrop: bool) {
        let top = *self.top();
        self.pass_stack.push(EntityPass {
            bounds: bounds.map(|bounds| top.transform.transform_rect_bbox(bounds)),
            clip_height: top.clip_height,
            alpha: alpha.clamp(0.0, 1.0),
            reads_backdrop,
            ..EntityPass::default()
        });
        self.transform_stack.push(CanvasStackEntry {
            num_clips: 0,
            is_subpass: true,
            ..top
        });
    }

    /// Restores the most recent save. Returns `false` if there is nothing to restore.
    pub fn restore(&mut self) -> bool {
        if self.transform_stack.len() == 1 {
            return false;
        }
        let Some(entry) = self.transform_stack.pop() else {
            return false;
        };
        // One restore per clip, so that each undoes exactly one recorded clip.
        let floor = self.top().clip_height;
        for restore_height in (floor..floor + entry.num_clips).rev() {
            self.add_entity(ClipRestoreContents { restore_height }.into());
        }
        if entry.is_subpass {
            if let Some(subpass) = self.pass_stack.pop() {
                self.current_pass().add_subpass(subpass);
            }
        }
        true
    }

    pub fn restore_to_count(&mut self, count: usize) {
        while self.save_count() > count {
            if !self.restore() {
                return;
            }
        }
    }

    pub fn save_count(&self) -> usize {
        self.transform_stack.len()
    }

    pub fn concat(&mut self, transform: Affine) {
        let top = self.top_mut();
        top.transform *= transform;
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.concat(Affine::translate(offset));
    }

    pub fn scale(&mut self, scale: f64) {
        self.concat(Affine::scale(scale));
    }

    pub fn reset_transform(&mut self) {
        self.top_mut().transform = Affine::IDENTITY;
    }

    pub fn current_transform(&self) -> Affine {
        self.top().transform
    }

    /// The cull rect in the current local coordinate space.
    pub fn current_local_culling_bounds(&self) -> Option<Rect> {
        let top = self.top();
        let cull_rect = top.cull_rect?;
        if top.transform.determinant() == 0.0 {
            return None;
        }
        Some(top.transform.inverse().transform_rect_bbox(cull_rect))
    }

    /// The clip height in effect for the next entity.
    pub fn clip_height(&self) -> usize {
        self.top().clip_height
    }

    pub fn clip_rect(&mut self, rect: Rect, op: ClipOperation) {
        let top = *self.top();
        if op == ClipOperation::Intersect
            && top
                .cull_rect
                .is_some_and(|cull_rect| covers_area(top.transform, rect, cull_rect))
        {
            // This clip will do nothing, so skip it.
            return;
        }

        self.add_entity(ClipContents { rect, op }.into());
        let top = self.top_mut();
        top.clip_height += 1;
        top.num_clips += 1;

        match op {
            ClipOperation::Intersect => self.intersect_culling(rect),
            ClipOperation::Difference => self.subtract_culling(rect),
        }
    }

    pub fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.add_entity(SolidColorContents { rect, color }.into());
    }

    /// Closes any open saves and returns the recorded picture.
    pub fn end_recording(mut self) -> Picture {
        self.restore_to_count(1);
        let pass = self.pass_stack.swap_remove(0);
        Picture { pass }
    }

    fn add_entity(&mut self, contents: Contents) {
        let entity = Entity::new(self.current_transform(), contents);
        self.current_pass().add_entity(entity);
    }

    fn intersect_culling(&mut self, clip_rect: Rect) {
        let top = self.top_mut();
        let clip_rect = top.transform.transform_rect_bbox(clip_rect);
        top.cull_rect = Some(match top.cull_rect {
            Some(cull_rect) => cull_rect.intersect(clip_rect),
            None => clip_rect,
        });
    }

    fn subtract_culling(&mut self, clip_rect: Rect) {
        let top = self.top_mut();
        // Without a cull rect, the difference is non-rectangular.
        let Some(cull_rect) = top.cull_rect else {
            return;
        };
        if !preserves_rects(top.transform) {
            return;
        }
        let clip_rect = top.transform.transform_rect_bbox(clip_rect);
        top.cull_rect = Some(cutout(cull_rect, clip_rect));
    }

    fn current_pass(&mut self) -> &mut EntityPass {
        let last = self.pass_stack.len() - 1;
        &mut self.pass_stack[last]
    }

    fn top(&self) -> &CanvasStackEntry {
        &self.transform_stack[self.transform_stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut CanvasStackEntry {
        let last = self.transform_stack.len() - 1;
        &mut self.transform_stack[last]
    }
}

/// A finished recording.
#[derive(Clone, Debug)]
pub struct Picture {
    pub pass: EntityPass,
}

impl Picture {
    pub fn render(
        &self,
        target: &mut impl PassTarget,
        viewport: Rect,
        options: &RenderOptions,
    ) -> Result<()> {
        self.pass.render(target, viewport, options)
    }
}

/// Whether `transform` maps axis-aligned rectangles to axis-aligned rectangles.
fn preserves_rects(transform: Affine) -> bool {
    let [_, b, c, _, _, _] = transform.as_coeffs();
    b == 0.0 && c == 0.0
}

fn covers_area(transform: Affine, rect: Rect, area: Rect) -> bool {
    if !preserves_rects(transform) {
        return false;
    }
    let rect = transform.transform_rect_bbox(rect);
    rect.x0 <= area.x0 && rect.y0 <= area.y0 && rect.x1 >= area.x1 && rect.y1 >= area.y1
}

/// The smallest rectangle containing `rect` minus `sub`.
fn cutout(mut rect: Rect, sub: Rect) -> Rect {
    let covers_x = sub.x0 <= rect.x0 && sub.x1 >= rect.x1;
    let covers_y = sub.y0 <= rect.y0 && sub.y1 >= rect.y1;
    if covers_x && covers_y {
        return Rect::ZERO;
    }
    if covers_x {
        if sub.y0 <= rect.y0 && sub.y1 > rect.y0 {
            rect.y0 = sub.y1;
        } else if sub.y1 >= rect.y1 && sub.y0 < rect.y1 {
            rect.y1 = sub.y0;
        }
    }
    if covers_y {
        if sub.x0 <= rect.x0 && sub.x1 > rect.x0 {
            rect.x0 = sub.x1;
        } else if sub.x1 >= rect.x1 && sub.x0 < rect.x1 {
            rect.x1 = sub.x0;
        }
    }
    rect
}
