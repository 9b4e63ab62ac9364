use std::collections::HashSet;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::RenderSurface;
use crate::config::EngineConfig;

use super::command::{CommandQueue, EngineCommand};
use super::entity::{Entity, EntitySpawn, MoveAuthorizer, MoveVerdict, RestrictionPatch};
use super::event::{EngineEvent, EventBus, EventContext, EventKind};
use super::geometry::{Direction, GridGeometry, Position};
use super::grid::{Tile, TileGrid, TilePatch};
use super::image::{DisplaySize, ImageAsset, ImageHandleAllocator, ImageRequest};
use super::input::{KeyDescriptor, KeyPhase, RawKeyEvent};
use super::timer::{Timer, TimerTask};
use super::view::EngineView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{operation} called before the engine finished initializing")]
    NotInitialized { operation: &'static str },
}

/// What a call to [`Engine::poll`] or [`Engine::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No timer task was due.
    Idle,
    /// Warm-up finished: the grid was built, `init` fired and the first
    /// update cycle ran. A warm-up that lands while paused reports
    /// [`PollOutcome::SkippedPaused`] instead.
    Initialized,
    Updated,
    /// The engine is paused; the cycle was skipped and the timer re-armed.
    SkippedPaused,
}

impl PollOutcome {
    pub fn drew_frame(self) -> bool {
        matches!(self, PollOutcome::Initialized | PollOutcome::Updated)
    }
}

/// State listeners may observe through [`EngineView`].
#[derive(Debug, Default)]
struct World {
    grid: TileGrid,
    entities: Vec<Entity>,
    images: Vec<ImageAsset>,
    paused: bool,
    initialized: bool,
}

impl World {
    fn view(&self) -> EngineView<'_> {
        EngineView::new(
            &self.entities,
            self.grid.tiles(),
            &self.images,
            self.grid.geometry(),
            self.paused,
            self.initialized,
        )
    }

    fn entity_index(&self, key: &str) -> Option<usize> {
        self.entities.iter().position(|entity| entity.key() == key)
    }
}

/// Tile engine driving a timed update/draw cycle over a [`RenderSurface`].
///
/// Time only advances through [`Engine::poll`] and [`Engine::update`]: the
/// engine remembers the latest instant it was given and schedules from it.
/// Construction arms a warm-up timer of one refresh interval; the first poll
/// past it builds the grid, fires `init` and runs the first cycle. Every
/// completed cycle re-arms the timer for the next one.
pub struct Engine<S: RenderSurface> {
    config: EngineConfig,
    surface: S,
    world: World,
    bus: EventBus,
    commands: CommandQueue,
    flushing: bool,
    timer: Timer,
    clock: Instant,
    image_handles: ImageHandleAllocator,
    next_entity_id: u64,
    warned_missing_images: HashSet<String>,
}

impl<S: RenderSurface> Engine<S> {
    pub fn new(config: EngineConfig, surface: S) -> Self {
        Self::starting_at(config, surface, Instant::now())
    }

    pub fn starting_at(config: EngineConfig, mut surface: S, now: Instant) -> Self {
        surface.resize(config.surface_size);
        let geometry = GridGeometry::derive(config.surface_size, &config.grid);
        if geometry.tile_count() == 0 {
            warn!(
                surface_width = config.surface_size.width,
                surface_height = config.surface_size.height,
                tile_width = geometry.tile_width,
                tile_height = geometry.tile_height,
                "grid_geometry_empty"
            );
        }
        info!(
            surface_width = config.surface_size.width,
            surface_height = config.surface_size.height,
            columns = geometry.columns,
            rows = geometry.rows,
            refresh_rate_ms = config.refresh_rate.as_millis() as u64,
            "engine_constructed"
        );

        let mut timer = Timer::default();
        timer.schedule(now, config.refresh_rate, TimerTask::WarmUp);

        Self {
            config,
            surface,
            world: World {
                grid: TileGrid::new(geometry),
                ..World::default()
            },
            bus: EventBus::default(),
            commands: CommandQueue::default(),
            flushing: false,
            timer,
            clock: now,
            image_handles: ImageHandleAllocator::default(),
            next_entity_id: 0,
            warned_missing_images: HashSet::new(),
        }
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&mut EngineEvent<'_>, &mut EventContext<'_>) + 'static,
    {
        self.bus.subscribe(kind, listener);
    }

    /// Runs the pending timer task if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Result<PollOutcome, EngineError> {
        self.advance_clock(now);
        match self.timer.take_due(now) {
            None => Ok(PollOutcome::Idle),
            Some(TimerTask::WarmUp) => {
                self.initialize();
                match self.update(now)? {
                    PollOutcome::Updated => Ok(PollOutcome::Initialized),
                    outcome => Ok(outcome),
                }
            }
            Some(TimerTask::Update) => self.update(now),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// One update cycle: `update-start`, draw, autonomous moves,
    /// `update-end`, then the next cycle is scheduled.
    pub fn update(&mut self, now: Instant) -> Result<PollOutcome, EngineError> {
        self.ensure_initialized("update")?;
        self.advance_clock(now);

        if self.world.paused {
            self.timer.schedule(self.clock, self.config.refresh_rate, TimerTask::Update);
            return Ok(PollOutcome::SkippedPaused);
        }

        self.emit(EngineEvent::UpdateStart);
        self.draw()?;
        self.run_autonomous_moves();
        self.emit(EngineEvent::UpdateEnd);

        self.timer.schedule(self.clock, self.config.refresh_rate, TimerTask::Update);
        Ok(PollOutcome::Updated)
    }

    pub fn draw(&mut self) -> Result<(), EngineError> {
        self.ensure_initialized("draw")?;
        self.emit(EngineEvent::DrawStart);

        let size = self.config.surface_size;
        self.surface.clear_region(
            0,
            0,
            size.width,
            size.height,
            self.config.grid.background_color,
        );

        let geometry = self.world.grid.geometry();
        for tile in self.world.grid.tiles() {
            let (x, y) = geometry.cell_origin_px(tile.position());
            self.surface
                .fill_rect(x, y, geometry.tile_width, geometry.tile_height, tile.color);
        }
        for entity in &self.world.entities {
            draw_entity(
                &mut self.surface,
                &self.world.images,
                &mut self.warned_missing_images,
                geometry,
                entity,
            );
        }

        self.emit(EngineEvent::DrawEnd);
        Ok(())
    }

    /// Builds an entity restricted to the grid bounds; a spawn outside them
    /// lands on the nearest cell inside. Collidable entities get
    /// [`MoveAuthorizer::DenyOnCollision`]. `new-entity` fires before the
    /// entity joins the collection.
    pub fn create_entity(&mut self, spawn: EntitySpawn) -> &mut Entity {
        let requested = spawn.position;
        let mut entity = Entity::new(spawn);
        entity.assign_id(self.next_entity_id);
        self.next_entity_id += 1;
        let bounds = self.world.grid.geometry().bounds();
        entity.set_restriction(true, RestrictionPatch::from_area(bounds));
        if entity.position() != requested {
            warn!(
                key = entity.key(),
                requested = %requested,
                placed = %entity.position(),
                "entity_spawn_clamped_to_grid"
            );
        }
        if entity.collidable() {
            entity.set_move_authorizer(MoveAuthorizer::DenyOnCollision);
        }
        debug!(
            key = entity.key(),
            x = entity.x(),
            y = entity.y(),
            collidable = entity.collidable(),
            "entity_created"
        );

        self.bus.publish(
            &mut EngineEvent::NewEntity(&entity),
            self.world.view(),
            &mut self.commands,
        );
        self.flush_commands();

        let index = self.world.entities.len();
        self.world.entities.push(entity);
        &mut self.world.entities[index]
    }

    /// Removes the first entity with `key`. `remove-entity` fires either way,
    /// with `None` when nothing matched.
    pub fn remove_entity(&mut self, key: &str) -> bool {
        let index = self.world.entity_index(key);
        self.bus.publish(
            &mut EngineEvent::RemoveEntity(index.map(|index| &self.world.entities[index])),
            self.world.view(),
            &mut self.commands,
        );
        let removed = index.map(|index| self.world.entities.remove(index));
        debug!(key, removed = removed.is_some(), "entity_removed");
        self.flush_commands();
        removed.is_some()
    }

    /// Moves the first entity with `key` through its authorizer. `None` when
    /// no entity matched.
    pub fn move_entity(&mut self, key: &str, direction: Direction) -> Option<MoveVerdict> {
        let index = self.world.entity_index(key)?;
        self.move_entity_at(index, direction)
    }

    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.world.view().entity(key)
    }

    pub fn entity_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.world
            .entities
            .iter_mut()
            .find(|entity| entity.key() == key)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.world.entities
    }

    /// Applies `patch` to the tile at `position` and fires `set-tile`. A miss
    /// returns `false` and fires nothing.
    pub fn set_tile(&mut self, position: Position, patch: TilePatch) -> bool {
        match self.world.grid.tile_at_mut(position) {
            Some(tile) => patch.apply(tile),
            None => return false,
        }
        let Some(tile) = self.world.grid.tile_at(position) else {
            return false;
        };
        self.bus.publish(
            &mut EngineEvent::SetTile(tile),
            self.world.view(),
            &mut self.commands,
        );
        self.flush_commands();
        true
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.world.grid.tile_at(position)
    }

    pub fn tiles(&self) -> &[Tile] {
        self.world.grid.tiles()
    }

    pub fn geometry(&self) -> GridGeometry {
        self.world.grid.geometry()
    }

    pub fn set_pause(&mut self, paused: bool) {
        self.world.paused = paused;
        info!(paused, "engine_pause_changed");
        self.emit(EngineEvent::Pause(paused));
    }

    pub fn is_paused(&self) -> bool {
        self.world.paused
    }

    pub fn is_initialized(&self) -> bool {
        self.world.initialized
    }

    /// Registers an image and asks the surface to decode it. Unset
    /// dimensions default to the tile size.
    pub fn load_image(&mut self, request: ImageRequest) -> &ImageAsset {
        let geometry = self.world.grid.geometry();
        let size = request.display_size(DisplaySize {
            width: geometry.tile_width,
            height: geometry.tile_height,
        });
        let handle = self.image_handles.allocate();
        self.surface.load_image(handle, &request.source, size);
        debug!(
            key = %request.key,
            source = %request.source.display(),
            width = size.width,
            height = size.height,
            "image_registered"
        );

        let index = self.world.images.len();
        self.world.images.push(ImageAsset {
            key: request.key,
            source: request.source,
            handle,
            size,
        });
        self.bus.publish(
            &mut EngineEvent::LoadedImage(&self.world.images[index]),
            self.world.view(),
            &mut self.commands,
        );
        self.flush_commands();
        &self.world.images[index]
    }

    pub fn load_images<I>(&mut self, requests: I) -> Vec<ImageAsset>
    where
        I: IntoIterator<Item = ImageRequest>,
    {
        requests
            .into_iter()
            .map(|request| self.load_image(request).clone())
            .collect()
    }

    pub fn image(&self, key: &str) -> Option<&ImageAsset> {
        self.world.view().image(key)
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.world.images
    }

    /// Republishes a host key event. Ignored until initialized.
    pub fn key_input(&mut self, phase: KeyPhase, raw: &RawKeyEvent) {
        if !self.world.initialized {
            return;
        }
        let key = KeyDescriptor::from(raw);
        let mut event = match phase {
            KeyPhase::Down => EngineEvent::KeyDown { key, raw },
            KeyPhase::Up => EngineEvent::KeyUp { key, raw },
            KeyPhase::Press => EngineEvent::KeyPress { key, raw },
        };
        self.bus.publish(&mut event, self.world.view(), &mut self.commands);
        self.flush_commands();
    }

    /// Stores the new interval. Once initialized, the pending cycle is
    /// replaced by one `rate` after the engine's current time.
    pub fn change_refresh_rate(&mut self, rate: Duration) {
        self.config.refresh_rate = rate;
        if !self.world.initialized {
            return;
        }
        self.timer.cancel();
        self.timer.schedule(self.clock, rate, TimerTask::Update);
        debug!(refresh_rate_ms = rate.as_millis() as u64, "refresh_rate_changed");
    }

    pub fn refresh_rate(&self) -> Duration {
        self.config.refresh_rate
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn view(&self) -> EngineView<'_> {
        self.world.view()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn ensure_initialized(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.world.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized { operation })
        }
    }

    fn advance_clock(&mut self, now: Instant) {
        self.clock = self.clock.max(now);
    }

    fn initialize(&mut self) {
        let geometry = self.world.grid.geometry();
        for position in TileGrid::cell_positions(geometry) {
            let mut tile = Tile::new(position);
            self.bus.publish(
                &mut EngineEvent::CreateTile(&mut tile),
                self.world.view(),
                &mut self.commands,
            );
            self.flush_commands();
            self.world.grid.push(tile);
        }

        self.emit(EngineEvent::Init);
        self.world.initialized = true;
        info!(
            tile_count = self.world.grid.len(),
            entity_count = self.world.entities.len(),
            "engine_initialized"
        );
    }

    fn run_autonomous_moves(&mut self) {
        // Listeners may add or remove entities mid-loop. Only entities alive at
        // the start of the cycle move, each at most once.
        let ids: Vec<u64> = self.world.entities.iter().map(Entity::id).collect();
        for id in ids {
            let Some(index) = self.world.entities.iter().position(|e| e.id() == id) else {
                continue;
            };
            let Some(direction) = self.world.entities[index].poll_autonomous_move() else {
                continue;
            };
            self.move_entity_at(index, direction);
        }
    }

    fn move_entity_at(&mut self, index: usize, direction: Direction) -> Option<MoveVerdict> {
        let entity = self.world.entities.get(index)?;
        let proposed = entity.propose_move(direction);
        let verdict = entity
            .move_authorizer()
            .authorize(&self.world.view(), Some(index), &proposed);

        match verdict {
            MoveVerdict::Allowed => {
                self.world.entities[index].commit_move(&proposed);
            }
            MoveVerdict::Collided { with } => {
                let moving = &self.world.entities[index];
                let colliding = &self.world.entities[with];
                debug!(
                    moving = moving.key(),
                    colliding = colliding.key(),
                    direction = direction.as_str(),
                    target = %proposed.new_position,
                    "collision_denied_move"
                );
                self.bus.publish(
                    &mut EngineEvent::Collision { moving, colliding },
                    self.world.view(),
                    &mut self.commands,
                );
                self.flush_commands();
            }
        }
        Some(verdict)
    }

    fn emit(&mut self, mut event: EngineEvent<'static>) {
        self.bus.publish(&mut event, self.world.view(), &mut self.commands);
        self.flush_commands();
    }

    /// Drains queued commands in FIFO order. Commands queued while draining
    /// are picked up by the same loop.
    fn flush_commands(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        while let Some(command) = self.commands.pop() {
            self.apply_command(command);
        }
        self.flushing = false;
    }

    fn apply_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::MoveEntity { key, direction } => {
                if self.move_entity(&key, direction).is_none() {
                    debug!(key = %key, "command_target_missing");
                }
            }
            EngineCommand::SetTile { position, patch } => {
                self.set_tile(position, patch);
            }
            EngineCommand::SetPause(paused) => self.set_pause(paused),
            EngineCommand::SpawnEntity(spawn) => {
                self.create_entity(spawn);
            }
            EngineCommand::RemoveEntity { key } => {
                self.remove_entity(&key);
            }
            EngineCommand::ChangeRefreshRate(rate) => self.change_refresh_rate(rate),
            EngineCommand::SetEntityImage { key, image } => match self.entity_mut(&key) {
                Some(entity) => match image {
                    Some(image) => entity.set_image(image),
                    None => entity.clear_image(),
                },
                None => debug!(key = %key, "command_target_missing"),
            },
            EngineCommand::SetEntityAttribute { key, name, value } => {
                match self.entity_mut(&key) {
                    Some(entity) => entity.set_attribute(name, value),
                    None => debug!(key = %key, "command_target_missing"),
                }
            }
            EngineCommand::SetEntityRestriction {
                key,
                enabled,
                patch,
            } => match self.entity_mut(&key) {
                Some(entity) => entity.set_restriction(enabled, patch),
                None => debug!(key = %key, "command_target_missing"),
            },
        }
    }
}

fn draw_entity<S: RenderSurface>(
    surface: &mut S,
    images: &[ImageAsset],
    warned_missing_images: &mut HashSet<String>,
    geometry: GridGeometry,
    entity: &Entity,
) {
    let (x, y) = geometry.cell_origin_px(entity.position());
    let (width, height) = (geometry.tile_width, geometry.tile_height);

    if let Some(image_key) = entity.image() {
        if let Some(image) = images.iter().find(|image| image.key == image_key) {
            surface.draw_image(image.handle, x, y, width, height);
            return;
        }
        if warned_missing_images.insert(image_key.to_string()) {
            warn!(
                entity = entity.key(),
                image = image_key,
                "entity_image_missing_using_color"
            );
        }
    }
    surface.fill_rect(x, y, width, height, entity.color);
}
