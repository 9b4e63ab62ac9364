//! Minimal tile engine: a fixed grid of colored tiles, movable entities with
//! optional collision, a timed update/draw cycle and a typed event bus that
//! every extension hooks into.

pub mod app;
pub mod color;
pub mod config;
pub mod world;

pub use app::{
    run_app, run_app_with_metrics, AppError, DrawCommand, ImageLoadRequest, KeyTranslator,
    LoopConfig, LoopMetricsSnapshot, MetricsHandle, PixelsSurface, RecordingSurface,
    RenderSurface,
};
pub use color::{Color, ColorParseError};
pub use config::{
    EngineConfig, EngineOptions, GridConfig, GridOptions, SurfaceSize, SurfaceSizeOptions,
    DEFAULT_REFRESH_RATE, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH, DEFAULT_TILE_SIZE,
};
pub use world::{
    Attribute, AutonomousMove, CommandQueue, Direction, DisplaySize, Engine, EngineCommand,
    EngineError, EngineEvent, EngineView, Entity, EntitySpawn, EventBus, EventContext, EventKind,
    GridGeometry, ImageAsset, ImageHandle, ImageRequest, KeyDescriptor, KeyPhase, Listener,
    MoveAuthorizer, MoveVerdict, ParseDirectionError, PollOutcome, Position, ProposedMove,
    RawKeyEvent, RestrictionArea, RestrictionPatch, Tile, TileData, TileGrid, TilePatch,
    UnknownEventName, DEFAULT_ENTITY_COLOR, DEFAULT_TILE_COLOR,
};
