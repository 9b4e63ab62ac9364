use std::collections::VecDeque;
use std::time::Duration;

use serde_json::Value;

use super::entity::{EntitySpawn, RestrictionPatch};
use super::geometry::{Direction, Position};
use super::grid::TilePatch;

/// Engine mutation requested from inside an event listener.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    MoveEntity {
        key: String,
        direction: Direction,
    },
    SetTile {
        position: Position,
        patch: TilePatch,
    },
    SetPause(bool),
    SpawnEntity(EntitySpawn),
    RemoveEntity {
        key: String,
    },
    ChangeRefreshRate(Duration),
    SetEntityImage {
        key: String,
        image: Option<String>,
    },
    SetEntityAttribute {
        key: String,
        name: String,
        value: Value,
    },
    SetEntityRestriction {
        key: String,
        enabled: bool,
        patch: RestrictionPatch,
    },
}

/// FIFO of commands, drained by the engine after every publish.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<EngineCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, command: EngineCommand) {
        self.pending.push_back(command);
    }

    pub fn move_entity(&mut self, key: impl Into<String>, direction: Direction) {
        self.push(EngineCommand::MoveEntity {
            key: key.into(),
            direction,
        });
    }

    pub fn set_tile(&mut self, position: Position, patch: TilePatch) {
        self.push(EngineCommand::SetTile { position, patch });
    }

    pub fn set_pause(&mut self, paused: bool) {
        self.push(EngineCommand::SetPause(paused));
    }

    pub fn spawn_entity(&mut self, spawn: EntitySpawn) {
        self.push(EngineCommand::SpawnEntity(spawn));
    }

    pub fn remove_entity(&mut self, key: impl Into<String>) {
        self.push(EngineCommand::RemoveEntity { key: key.into() });
    }

    pub fn change_refresh_rate(&mut self, rate: Duration) {
        self.push(EngineCommand::ChangeRefreshRate(rate));
    }

    pub fn set_entity_image(&mut self, key: impl Into<String>, image: Option<String>) {
        self.push(EngineCommand::SetEntityImage {
            key: key.into(),
            image,
        });
    }

    pub fn set_entity_attribute(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.push(EngineCommand::SetEntityAttribute {
            key: key.into(),
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn set_entity_restriction(
        &mut self,
        key: impl Into<String>,
        enabled: bool,
        patch: RestrictionPatch,
    ) {
        self.push(EngineCommand::SetEntityRestriction {
            key: key.into(),
            enabled,
            patch,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<EngineCommand> {
        self.pending.pop_front()
    }
}
