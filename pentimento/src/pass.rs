// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use pentimento_entity::{Entity, LayerContents};
use peniko::kurbo::{Affine, Point, Rect, Size};

use crate::{ClipCoverageStack, Error, PassTarget, RenderOptions, Result};

/// An element of an [`EntityPass`], drawn in order.
#[derive(Clone, Debug)]
pub enum Element {
    Entity(Entity),
    Subpass(Box<EntityPass>),
}

/// A tree of entities to render.
///
/// Subpasses render into their own offscreen target, which is then
/// composited into the parent pass.
#[derive(Clone, Debug)]
pub struct EntityPass {
    pub elements: Vec<Element>,
    /// Bounds of the subpass in global coordinates. `None` uses the clip
    /// coverage in effect when the subpass is reached.
    pub bounds: Option<Rect>,
    /// The clip height in effect when this pass was opened.
    pub clip_height: usize,
    /// Opacity used when compositing the subpass into its parent.
    pub alpha: f32,
    /// Whether the subpass samples its parent's contents, which requires the
    /// parent render pass to be restarted first.
    pub reads_backdrop: bool,
}

impl Default for EntityPass {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            bounds: None,
            clip_height: 0,
            alpha: 1.0,
            reads_backdrop: false,
        }
    }
}

impl EntityPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.elements.push(Element::Entity(entity));
    }

    /// Appends `pass` as a subpass and returns a reference to it.
    pub fn add_subpass(&mut self, pass: EntityPass) -> &mut EntityPass {
        self.elements.push(Element::Subpass(Box::new(pass)));
        match self.elements.last_mut() {
            Some(Element::Subpass(pass)) => pass,
            _ => unreachable!(),
        }
    }

    /// Number of direct and nested subpasses.
    pub fn subpass_count(&self) -> usize {
        self.elements
            .iter()
            .map(|element| match element {
                Element::Entity(_) => 0,
                Element::Subpass(pass) => 1 + pass.subpass_count(),
            })
            .sum()
    }

    /// Renders this pass into the current target of `target`, whose drawable
    /// area is `viewport`.
    pub fn render(
        &self,
        target: &mut impl PassTarget,
        viewport: Rect,
        options: &RenderOptions,
    ) -> Result<()> {
        options.validate()?;
        log::debug!(
            "rendering entity pass with {} elements and {} subpasses",
            self.elements.len(),
            self.subpass_count()
        );
        let mut clip_coverage_stack = ClipCoverageStack::new(viewport);
        let mut context = RenderContext {
            target,
            clip_coverage_stack: &mut clip_coverage_stack,
            options,
        };
        context.render_elements(self, Point::ORIGIN, self.clip_height)
    }
}

struct RenderContext<'a, T: PassTarget> {
    target: &'a mut T,
    clip_coverage_stack: &'a mut ClipCoverageStack,
    options: &'a RenderOptions,
}

impl<T: PassTarget> RenderContext<'_, T> {
    fn render_elements(
        &mut self,
        pass: &EntityPass,
        global_pass_position: Point,
        clip_height_floor: usize,
    ) -> Result<()> {
        for element in &pass.elements {
            match element {
                Element::Entity(entity) => {
                    self.render_entity(entity, global_pass_position, clip_height_floor)?;
                }
                Element::Subpass(subpass) => {
                    self.render_subpass(subpass, global_pass_position, clip_height_floor)?;
                }
            }
        }
        Ok(())
    }

    /// `entity` is in global coordinates.
    fn render_entity(
        &mut self,
        entity: &Entity,
        global_pass_position: Point,
        clip_height_floor: usize,
    ) -> Result<()> {
        let clip_coverage =
            entity.clip_coverage(self.clip_coverage_stack.current_clip_coverage());
        let local_entity = entity.translated(-global_pass_position.to_vec2());

        if self.options.cull_clipped_entities {
            let local_clip = self
                .clip_coverage_stack
                .current_clip_coverage()
                .map(|coverage| coverage - global_pass_position.to_vec2());
            if !local_entity.should_render(local_clip) {
                log::trace!("culled entity outside clip coverage");
                return Ok(());
            }
        }

        let result = self.clip_coverage_stack.apply_clip_state(
            clip_coverage,
            &local_entity,
            clip_height_floor,
            global_pass_position,
        );
        if result.clip_did_change {
            self.set_clip_scissor(
                self.clip_coverage_stack.current_clip_coverage(),
                global_pass_position,
            );
        }
        if !result.should_render {
            return Ok(());
        }
        self.target.draw(&local_entity)
    }

    fn render_subpass(
        &mut self,
        subpass: &EntityPass,
        global_pass_position: Point,
        clip_height_floor: usize,
    ) -> Result<()> {
        let current = self.clip_coverage_stack.current_clip_coverage();
        let coverage = match (subpass.bounds, current) {
            (Some(bounds), Some(current)) => bounds.intersect(current),
            (Some(bounds), None) => bounds,
            (None, Some(current)) => current,
            (None, None) => {
                log::warn!("skipping unbounded subpass in an unclipped pass");
                return Ok(());
            }
        };
        if coverage.is_zero_area() {
            log::trace!("skipping subpass with empty coverage");
            return Ok(());
        }

        let coverage = coverage.expand();
        let width = coverage.width() as u32;
        let height = coverage.height() as u32;
        let max = self.options.max_target_size;
        if width > max || height > max {
            return Err(Error::TargetTooLarge { width, height, max });
        }

        if subpass.reads_backdrop {
            self.target.restart()?;
            self.replay_clips(global_pass_position)?;
        }

        let subpass_target = self.target.begin_target(width, height)?;
        log::debug!(
            "entering subpass {:?} ({width}x{height}) at {:?}",
            subpass_target,
            coverage.origin()
        );
        self.clip_coverage_stack
            .push_subpass(Some(coverage), subpass.clip_height);
        let result = self.render_elements(subpass, coverage.origin(), subpass.clip_height);
        self.clip_coverage_stack.pop_subpass();
        let ended = self.target.end_target();
        result?;
        ended?;
        // The parent pass' scissor state was replaced by the subpass.
        self.set_clip_scissor(
            self.clip_coverage_stack.current_clip_coverage(),
            global_pass_position,
        );

        let layer = Entity::new(
            Affine::translate(coverage.origin().to_vec2()),
            LayerContents {
                target: subpass_target,
                size: Size::new(f64::from(width), f64::from(height)),
                alpha: subpass.alpha,
            },
        );
        self.render_entity(&layer, global_pass_position, clip_height_floor)
    }

    /// Redraws the clip entities of the current frame after a restart.
    fn replay_clips(&mut self, global_pass_position: Point) -> Result<()> {
        let replay_entities = self.clip_coverage_stack.replay_entities();
        log::debug!("replaying {} clip entities", replay_entities.len());
        for replay in replay_entities {
            self.target.set_scissor(
                replay
                    .clip_coverage
                    .map(|coverage| coverage - global_pass_position.to_vec2()),
            );
            self.target.draw(&replay.entity)?;
        }
        let current = self.clip_coverage_stack.current_clip_coverage();
        self.set_clip_scissor(current, global_pass_position);
        Ok(())
    }

    fn set_clip_scissor(&mut self, clip_coverage: Option<Rect>, global_pass_position: Point) {
        self.target.set_scissor(
            clip_coverage.map(|coverage| coverage - global_pass_position.to_vec2()),
        );
    }
}
