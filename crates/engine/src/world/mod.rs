mod command;
mod engine;
mod entity;
mod event;
mod geometry;
mod grid;
mod image;
mod input;
mod timer;
mod view;

pub use command::{CommandQueue, EngineCommand};
pub use engine::{Engine, EngineError, PollOutcome};
pub use entity::{
    Attribute, AutonomousMove, Entity, EntitySpawn, MoveAuthorizer, MoveVerdict, ProposedMove,
    RestrictionPatch, DEFAULT_ENTITY_COLOR,
};
pub use event::{EngineEvent, EventBus, EventContext, EventKind, Listener, UnknownEventName};
pub use geometry::{Direction, GridGeometry, ParseDirectionError, Position, RestrictionArea};
pub use grid::{Tile, TileData, TileGrid, TilePatch, DEFAULT_TILE_COLOR};
pub use image::{DisplaySize, ImageAsset, ImageHandle, ImageRequest};
pub use input::{KeyDescriptor, KeyPhase, RawKeyEvent};
pub use view::EngineView;
