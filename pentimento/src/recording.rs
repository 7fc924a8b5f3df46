// Copyright 2024 the Pentimento Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use pentimento_entity::{Entity, TargetId};
use peniko::kurbo::Rect;

use crate::{Error, Result};

/// The operations a render pass backend provides to [`EntityPass`](crate::EntityPass).
pub trait PassTarget {
    /// The target currently being drawn into.
    fn current_target(&self) -> TargetId;

    /// Allocates an offscreen target and makes it current.
    fn begin_target(&mut self, width: u32, height: u32) -> Result<TargetId>;

    /// Finishes the current offscreen target, making its parent current again.
    fn end_target(&mut self) -> Result<TargetId>;

    /// Ends the current render pass and starts a new one on the same target.
    ///
    /// The clip buffer does not survive a restart.
    fn restart(&mut self) -> Result<()>;

    /// Restricts drawing to `scissor`, in target-local coordinates.
    fn set_scissor(&mut self, scissor: Option<Rect>);

    fn draw(&mut self, entity: &Entity) -> Result<()>;
}

/// Single command inside a [`Recording`].
#[derive(Clone, Debug)]
pub enum Command {
    BeginTarget {
        id: TargetId,
        width: u32,
        height: u32,
    },
    EndTarget(TargetId),
    Restart(TargetId),
    SetScissor(Option<Rect>),
    Draw(Entity),
}

/// A [`PassTarget`] which records the commands it receives, in order.
#[derive(Debug)]
pub struct Recording {
    pub commands: Vec<Command>,
    root: TargetId,
    targets: Vec<TargetId>,
}

impl Default for Recording {
    fn default() -> Self {
        Self::new()
    }
}

impl Recording {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            root: TargetId::next(),
            targets: Vec::new(),
        }
    }

    /// The id of the onscreen target.
    pub fn root(&self) -> TargetId {
        self.root
    }

    /// Appends a [`Command`] to the back of the [`Recording`].
    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    /// The entities drawn, in order.
    pub fn draws(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::Draw(entity) => Some(entity),
            _ => None,
        })
    }
}

impl PassTarget for Recording {
    fn current_target(&self) -> TargetId {
        self.targets.last().copied().unwrap_or(self.root)
    }

    fn begin_target(&mut self, width: u32, height: u32) -> Result<TargetId> {
        let id = TargetId::next();
        self.targets.push(id);
        self.push(Command::BeginTarget { id, width, height });
        Ok(id)
    }

    fn end_target(&mut self) -> Result<TargetId> {
        let id = self.targets.pop().ok_or(Error::UnbalancedTarget)?;
        self.push(Command::EndTarget(id));
        Ok(id)
    }

    fn restart(&mut self) -> Result<()> {
        let id = self.current_target();
        self.push(Command::Restart(id));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Option<Rect>) {
        self.push(Command::SetScissor(scissor));
    }

    fn draw(&mut self, entity: &Entity) -> Result<()> {
        self.push(Command::Draw(entity.clone()));
        Ok(())
    }
}
