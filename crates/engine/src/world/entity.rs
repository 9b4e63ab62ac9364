use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::color::Color;

use super::geometry::{Direction, Position, RestrictionArea};
use super::view::EngineView;

pub const DEFAULT_ENTITY_COLOR: Color = Color::BLACK;

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
}

/// Partial restriction update. Each present bound is written, zero included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestrictionPatch {
    pub start_x: Option<i32>,
    pub start_y: Option<i32>,
    pub end_x: Option<i32>,
    pub end_y: Option<i32>,
}

impl RestrictionPatch {
    pub fn from_area(area: RestrictionArea) -> Self {
        Self {
            start_x: Some(area.start.x),
            start_y: Some(area.start.y),
            end_x: Some(area.end.x),
            end_y: Some(area.end.y),
        }
    }

    fn apply(self, area: &mut RestrictionArea) {
        if let Some(value) = self.start_x {
            area.start.x = value;
        }
        if let Some(value) = self.start_y {
            area.start.y = value;
        }
        if let Some(value) = self.end_x {
            area.end.x = value;
        }
        if let Some(value) = self.end_y {
            area.end.y = value;
        }
    }
}

/// Candidate position produced by [`Entity::propose_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedMove {
    pub new_position: Position,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveVerdict {
    Allowed,
    /// Denied because the entity at index `with` of the view's entity list
    /// already occupies the candidate cell.
    Collided { with: usize },
}

impl MoveVerdict {
    pub fn is_allowed(self) -> bool {
        matches!(self, MoveVerdict::Allowed)
    }
}

/// Decides whether a proposed move is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MoveAuthorizer {
    #[default]
    AlwaysAllow,
    /// Denies moves onto a cell held by another collidable entity. The first
    /// collidable entity in collection order wins.
    DenyOnCollision,
}

impl MoveAuthorizer {
    /// `mover` is the index of the moving entity inside `view`, when it is
    /// part of it; that entity never collides with itself.
    pub fn authorize(
        self,
        view: &EngineView<'_>,
        mover: Option<usize>,
        proposed: &ProposedMove,
    ) -> MoveVerdict {
        match self {
            MoveAuthorizer::AlwaysAllow => MoveVerdict::Allowed,
            MoveAuthorizer::DenyOnCollision => view
                .entities()
                .iter()
                .enumerate()
                .filter(|(index, entity)| Some(*index) != mover && entity.collidable())
                .find(|(_, entity)| entity.is_at(proposed.new_position))
                .map_or(MoveVerdict::Allowed, |(with, _)| MoveVerdict::Collided {
                    with,
                }),
        }
    }
}

/// Polled once per update cycle; `None` means stay put.
pub trait AutonomousMove {
    fn next_move(&mut self, position: Position) -> Option<Direction>;
}

impl<F> AutonomousMove for F
where
    F: FnMut(Position) -> Option<Direction>,
{
    fn next_move(&mut self, position: Position) -> Option<Direction> {
        self(position)
    }
}

/// Construction parameters for [`crate::Engine::create_entity`] and
/// [`Entity::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpawn {
    pub key: Option<String>,
    pub position: Position,
    pub color: Color,
    pub collidable: bool,
}

impl EntitySpawn {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }
}

impl Default for EntitySpawn {
    fn default() -> Self {
        Self {
            key: None,
            position: Position::default(),
            color: DEFAULT_ENTITY_COLOR,
            collidable: false,
        }
    }
}

pub struct Entity {
    id: u64,
    key: String,
    position: Position,
    pub color: Color,
    collidable: bool,
    restricted: bool,
    restriction: RestrictionArea,
    attributes: Vec<Attribute>,
    authorizer: MoveAuthorizer,
    autonomous: Option<Box<dyn AutonomousMove>>,
    image: Option<String>,
}

impl Entity {
    pub fn new(spawn: EntitySpawn) -> Self {
        Self {
            id: 0,
            key: spawn.key.unwrap_or_else(generated_key),
            position: spawn.position,
            color: spawn.color,
            collidable: spawn.collidable,
            restricted: false,
            restriction: RestrictionArea::default(),
            attributes: Vec::new(),
            authorizer: MoveAuthorizer::AlwaysAllow,
            autonomous: None,
            image: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Engine-assigned serial, unique among entities of one engine.
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: u64) {
        self.id = id;
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn collidable(&self) -> bool {
        self.collidable
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn restriction(&self) -> RestrictionArea {
        self.restriction
    }

    pub fn move_authorizer(&self) -> MoveAuthorizer {
        self.authorizer
    }

    pub fn set_move_authorizer(&mut self, authorizer: MoveAuthorizer) {
        self.authorizer = authorizer;
    }

    pub fn set_autonomous_move(&mut self, policy: impl AutonomousMove + 'static) {
        self.autonomous = Some(Box::new(policy));
    }

    pub fn clear_autonomous_move(&mut self) {
        self.autonomous = None;
    }

    pub fn has_autonomous_move(&self) -> bool {
        self.autonomous.is_some()
    }

    pub(crate) fn poll_autonomous_move(&mut self) -> Option<Direction> {
        let position = self.position;
        self.autonomous
            .as_mut()
            .and_then(|policy| policy.next_move(position))
    }

    pub fn is_at(&self, position: Position) -> bool {
        self.position == position
    }

    pub fn is_colliding_with(&self, other: Option<&Entity>) -> bool {
        other.is_some_and(|other| other.position == self.position)
    }

    /// Always overwrites the `restricted` flag; bounds are patched. Enabling
    /// pulls the entity to the nearest cell inside the patched area.
    pub fn set_restriction(&mut self, enabled: bool, patch: RestrictionPatch) {
        patch.apply(&mut self.restriction);
        self.restricted = enabled;
        if enabled {
            self.position = self.restriction.clamp(self.position);
        }
    }

    /// One-cell step along `direction`. While restricted, an axis already at
    /// its bound stays unchanged instead of leaving the rectangle.
    pub fn propose_move(&self, direction: Direction) -> ProposedMove {
        let Position { mut x, mut y } = self.position;
        let area = self.restriction;
        let clamp = self.restricted;

        match direction {
            Direction::Right if !clamp || x < area.end.x.saturating_sub(1) => {
                x = x.saturating_add(1)
            }
            Direction::Left if !clamp || x > area.start.x => x = x.saturating_sub(1),
            Direction::Down if !clamp || y < area.end.y.saturating_sub(1) => {
                y = y.saturating_add(1)
            }
            Direction::Up if !clamp || y > area.start.y => y = y.saturating_sub(1),
            _ => {}
        }

        ProposedMove {
            new_position: Position::new(x, y),
            direction,
        }
    }

    pub(crate) fn commit_move(&mut self, proposed: &ProposedMove) {
        self.position = proposed.new_position;
    }

    /// Moves an entity that is not owned by an engine. The authorizer sees an
    /// empty view, so only its own verdict applies.
    pub fn step(&mut self, direction: Direction) -> MoveVerdict {
        let proposed = self.propose_move(direction);
        let verdict = self
            .authorizer
            .authorize(&EngineView::default(), None, &proposed);
        if verdict.is_allowed() {
            self.commit_move(&proposed);
        }
        verdict
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Stores an image key; existence is checked at draw time.
    pub fn set_image(&mut self, key: impl Into<String>) {
        self.image = Some(key.into());
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("key", &self.key)
            .field("position", &self.position)
            .field("color", &self.color)
            .field("collidable", &self.collidable)
            .field("restricted", &self.restricted)
            .field("restriction", &self.restriction)
            .field("attributes", &self.attributes)
            .field("authorizer", &self.authorizer)
            .field("autonomous", &self.autonomous.is_some())
            .field("image", &self.image)
            .finish()
    }
}

fn generated_key() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("entity{millis}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn restricted_entity(x: i32, y: i32, end: (i32, i32)) -> Entity {
        let mut entity = Entity::new(EntitySpawn::new("walker").at(x, y));
        entity.set_restriction(
            true,
            RestrictionPatch::from_area(RestrictionArea::new(
                Position::new(0, 0),
                Position::new(end.0, end.1),
            )),
        );
        entity
    }

    #[test]
    fn new_entity_uses_documented_defaults() {
        let entity = Entity::new(EntitySpawn::default());
        assert!(entity.key().starts_with("entity"));
        assert_eq!(entity.position(), Position::new(0, 0));
        assert_eq!(entity.color, Color::BLACK);
        assert!(!entity.collidable());
        assert!(!entity.is_restricted());
        assert_eq!(entity.restriction(), RestrictionArea::default());
        assert_eq!(entity.move_authorizer(), MoveAuthorizer::AlwaysAllow);
        assert!(!entity.has_autonomous_move());
        assert!(entity.image().is_none());
    }

    #[test]
    fn clamp_keeps_entity_inside_restriction() {
        let mut entity = restricted_entity(1, 1, (2, 2));

        entity.step(Direction::Right);
        assert_eq!(entity.position(), Position::new(1, 1));
        entity.step(Direction::Right);
        assert_eq!(entity.position(), Position::new(1, 1));
        entity.step(Direction::Down);
        assert_eq!(entity.position(), Position::new(1, 1));
    }

    #[test]
    fn random_walk_never_leaves_restriction() {
        let mut entity = restricted_entity(0, 0, (3, 2));
        let area = entity.restriction();
        let pattern = [
            Direction::Left,
            Direction::Up,
            Direction::Right,
            Direction::Right,
            Direction::Right,
            Direction::Down,
            Direction::Down,
            Direction::Down,
            Direction::Left,
        ];
        for direction in pattern.iter().cycle().take(90) {
            entity.step(*direction);
            assert!(area.contains(entity.position()), "{:?}", entity.position());
        }
    }

    #[test]
    fn unrestricted_entity_moves_past_area() {
        let mut entity = Entity::new(EntitySpawn::new("free").at(7, 0));
        entity.step(Direction::Right);
        entity.step(Direction::Up);
        assert_eq!(entity.position(), Position::new(8, -1));
    }

    #[test]
    fn enabling_restriction_pulls_entity_inside() {
        let mut entity = Entity::new(EntitySpawn::new("far").at(10, -3));
        entity.set_restriction(
            true,
            RestrictionPatch::from_area(RestrictionArea::new(
                Position::new(0, 0),
                Position::new(4, 3),
            )),
        );
        assert_eq!(entity.position(), Position::new(3, 0));
        assert!(entity.restriction().contains(entity.position()));

        entity.set_restriction(
            true,
            RestrictionPatch {
                end_x: Some(2),
                ..RestrictionPatch::default()
            },
        );
        assert_eq!(entity.position(), Position::new(1, 0));

        entity.set_restriction(
            false,
            RestrictionPatch {
                start_x: Some(5),
                end_x: Some(9),
                ..RestrictionPatch::default()
            },
        );
        assert_eq!(entity.position(), Position::new(1, 0));
    }

    #[test]
    fn extreme_bounds_saturate_instead_of_overflowing() {
        let mut free = Entity::new(EntitySpawn::new("edge").at(i32::MAX, i32::MIN));
        assert_eq!(
            free.propose_move(Direction::Right).new_position,
            Position::new(i32::MAX, i32::MIN)
        );
        assert_eq!(
            free.propose_move(Direction::Up).new_position,
            Position::new(i32::MAX, i32::MIN)
        );

        free.set_restriction(
            true,
            RestrictionPatch {
                start_x: Some(i32::MIN),
                start_y: Some(i32::MIN),
                end_x: Some(i32::MIN),
                end_y: Some(i32::MIN),
            },
        );
        assert_eq!(free.position(), Position::new(i32::MIN, i32::MIN));
        for direction in [
            Direction::Right,
            Direction::Left,
            Direction::Down,
            Direction::Up,
        ] {
            free.step(direction);
        }
        assert_eq!(free.position(), Position::new(i32::MIN, i32::MIN));
    }

    #[test]
    fn proposal_carries_direction_and_candidate() {
        let entity = restricted_entity(0, 0, (4, 4));
        let proposed = entity.propose_move(Direction::Down);
        assert_eq!(proposed.direction, Direction::Down);
        assert_eq!(proposed.new_position, Position::new(0, 1));
        assert_eq!(entity.position(), Position::new(0, 0));
    }

    #[test]
    fn restriction_patch_applies_zero_bounds() {
        let mut entity = Entity::new(EntitySpawn::new("patched"));
        entity.set_restriction(
            true,
            RestrictionPatch {
                end_x: Some(0),
                ..RestrictionPatch::default()
            },
        );
        assert!(entity.is_restricted());
        assert_eq!(entity.restriction().end, Position::new(0, 8));
        assert_eq!(entity.restriction().start, Position::new(0, 0));

        entity.set_restriction(false, RestrictionPatch::default());
        assert!(!entity.is_restricted());
        assert_eq!(entity.restriction().end, Position::new(0, 8));
    }

    #[test]
    fn colliding_requires_exact_same_cell() {
        let a = Entity::new(EntitySpawn::new("a").at(1, 1));
        let b = Entity::new(EntitySpawn::new("b").at(1, 1));
        let c = Entity::new(EntitySpawn::new("c").at(1, 2));
        assert!(a.is_colliding_with(Some(&b)));
        assert!(!a.is_colliding_with(Some(&c)));
        assert!(!a.is_colliding_with(None));
    }

    #[test]
    fn collision_authorizer_ignores_non_collidable_and_self() {
        let entities = vec![
            Entity::new(EntitySpawn::new("mover").at(0, 0).collidable(true)),
            Entity::new(EntitySpawn::new("ghost").at(1, 0)),
            Entity::new(EntitySpawn::new("wall").at(0, 1).collidable(true)),
        ];
        let view = EngineView::from_entities(&entities);
        let authorizer = MoveAuthorizer::DenyOnCollision;

        let onto_ghost = entities[0].propose_move(Direction::Right);
        assert_eq!(
            authorizer.authorize(&view, Some(0), &onto_ghost),
            MoveVerdict::Allowed
        );

        let onto_wall = entities[0].propose_move(Direction::Down);
        assert_eq!(
            authorizer.authorize(&view, Some(0), &onto_wall),
            MoveVerdict::Collided { with: 2 }
        );

        let in_place = ProposedMove {
            new_position: Position::new(0, 0),
            direction: Direction::Left,
        };
        assert_eq!(
            authorizer.authorize(&view, Some(0), &in_place),
            MoveVerdict::Allowed
        );
    }

    #[test]
    fn collision_authorizer_reports_first_match() {
        let entities = vec![
            Entity::new(EntitySpawn::new("first").at(2, 2).collidable(true)),
            Entity::new(EntitySpawn::new("second").at(2, 2).collidable(true)),
        ];
        let view = EngineView::from_entities(&entities);
        let proposed = ProposedMove {
            new_position: Position::new(2, 2),
            direction: Direction::Up,
        };
        assert_eq!(
            MoveAuthorizer::DenyOnCollision.authorize(&view, None, &proposed),
            MoveVerdict::Collided { with: 0 }
        );
    }

    #[test]
    fn autonomous_policy_is_polled_with_current_position() {
        let mut entity = Entity::new(EntitySpawn::new("bot").at(3, 4));
        assert_eq!(entity.poll_autonomous_move(), None);

        entity.set_autonomous_move(|position: Position| {
            (position.x > 0).then_some(Direction::Left)
        });
        assert_eq!(entity.poll_autonomous_move(), Some(Direction::Left));

        entity.clear_autonomous_move();
        assert_eq!(entity.poll_autonomous_move(), None);
    }

    #[test]
    fn attributes_upsert_by_name_in_insertion_order() {
        let mut entity = Entity::new(EntitySpawn::new("stats"));
        entity.set_attribute("hp", 10);
        entity.set_attribute("name", "hero");
        entity.set_attribute("hp", json!(7));

        assert_eq!(entity.attribute("hp"), Some(&json!(7)));
        assert_eq!(entity.attribute("missing"), None);
        let names = entity
            .attributes()
            .iter()
            .map(|attr| attr.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["hp", "name"]);
    }

    #[test]
    fn image_reference_is_not_validated() {
        let mut entity = Entity::new(EntitySpawn::new("sprite"));
        entity.set_image("does_not_exist");
        assert_eq!(entity.image(), Some("does_not_exist"));
        entity.clear_image();
        assert_eq!(entity.image(), None);
    }
}
