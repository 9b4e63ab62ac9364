use pixel_engine::{Color, Direction, Engine, EngineEvent, EntitySpawn, EventKind, RenderSurface};
use tracing::info;

mod patrol;

use patrol::Patrol;

pub(crate) const PLAYER_KEY: &str = "player";
const TILE_COLOR: Color = Color::rgb(0x00, 0xdd, 0xdd);
const PLAYER_COLOR: Color = Color::rgb(0xff, 0x00, 0x00);
const NPC_COLOR: Color = Color::rgb(0x00, 0xff, 0x00);
const PATROL_SIDE: usize = 2;
const PATROL_CYCLES_PER_STEP: u32 = 5;
const PAUSE_KEY: &str = "p";

/// Wires the sample scene into a freshly constructed engine.
pub(crate) fn install<S: RenderSurface>(engine: &mut Engine<S>) {
    engine.on(EventKind::CreateTile, |event, _| {
        if let EngineEvent::CreateTile(tile) = event {
            tile.color = TILE_COLOR;
        }
    });
    engine.on(EventKind::Init, |_, context| {
        let geometry = context.view().geometry();
        info!(
            tile_count = context.view().tiles().len(),
            columns = geometry.columns,
            rows = geometry.rows,
            "tiles_ready"
        );
    });

    engine.create_entity(
        EntitySpawn::new(PLAYER_KEY)
            .at(0, 0)
            .color(PLAYER_COLOR)
            .collidable(true),
    );
    engine.create_entity(
        EntitySpawn::new("e1")
            .at(2, 5)
            .color(NPC_COLOR)
            .collidable(true),
    );
    engine
        .create_entity(
            EntitySpawn::new("e2")
                .at(3, 1)
                .color(NPC_COLOR)
                .collidable(true),
        )
        .set_autonomous_move(Patrol::square(PATROL_SIDE, PATROL_CYCLES_PER_STEP));
    // Same key as above on purpose; lookups by "e1" resolve to the first one.
    engine.create_entity(EntitySpawn::new("e1").at(4, 7).color(NPC_COLOR));

    engine.on(EventKind::KeyDown, |event, context| {
        let EngineEvent::KeyDown { key, .. } = event else {
            return;
        };
        if key.name == PAUSE_KEY {
            let paused = context.view().is_paused();
            context.commands().set_pause(!paused);
            return;
        }
        if let Some(direction) = direction_for_key(&key.name) {
            context.commands().move_entity(PLAYER_KEY, direction);
        }
    });

    engine.on(EventKind::Collision, |event, context| {
        if let EngineEvent::Collision { moving, colliding } = event {
            info!(
                moving = moving.key(),
                colliding = colliding.key(),
                x = colliding.x(),
                y = colliding.y(),
                occupants = context.view().entities_at(colliding.position()).count(),
                "collision"
            );
        }
    });
    engine.on(EventKind::Pause, |event, _| {
        if let EngineEvent::Pause(paused) = event {
            info!(paused = *paused, "pause_toggled");
        }
    });
}

fn direction_for_key(name: &str) -> Option<Direction> {
    match name {
        "w" | "W" | "ArrowUp" => Some(Direction::Up),
        "s" | "S" | "ArrowDown" => Some(Direction::Down),
        "a" | "A" | "ArrowLeft" => Some(Direction::Left),
        "d" | "D" | "ArrowRight" => Some(Direction::Right),
        _ => None,
    }
}
