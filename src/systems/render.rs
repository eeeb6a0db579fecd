//! Headless render collaborator.
//!
//! Nothing is drawn: render commands are logged at debug level and kept in a
//! bounded [`RenderJournal`] so hosts and tests can inspect what the
//! behaviors asked for.

use std::collections::VecDeque;

use bevy_ecs::prelude::*;
use log::debug;

use crate::events::render::{RenderCmd, RenderOp};

const DEFAULT_JOURNAL_CAPACITY: usize = 1024;

#[derive(Resource, Debug)]
pub struct RenderJournal {
    capacity: usize,
    commands: VecDeque<RenderCmd>,
}

impl Default for RenderJournal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl RenderJournal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            commands: VecDeque::new(),
        }
    }

    pub fn push(&mut self, cmd: RenderCmd) {
        if self.commands.len() == self.capacity {
            self.commands.pop_front();
        }
        self.commands.push_back(cmd);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderCmd> {
        self.commands.iter()
    }

    /// Commands addressed to `entity`, oldest first.
    pub fn for_entity(&self, entity: Entity) -> impl Iterator<Item = &RenderOp> {
        self.commands
            .iter()
            .filter(move |cmd| cmd.entity == entity)
            .map(|cmd| &cmd.op)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

pub fn log_render_cmds(mut reader: MessageReader<RenderCmd>, mut journal: ResMut<RenderJournal>) {
    for cmd in reader.read() {
        debug!("render {:?}: {:?}", cmd.entity, cmd.op);
        journal.push(cmd.clone());
    }
}

/// Advance the render message queue. Runs once per tick after forwarding.
pub fn update_render_messages(mut messages: ResMut<Messages<RenderCmd>>) {
    messages.update();
}
