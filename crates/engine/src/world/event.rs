//! Typed event bus.
//!
//! Every notification the engine emits is an [`EngineEvent`] whose variant
//! fixes the payload type. Listeners subscribe per [`EventKind`] and run
//! synchronously in registration order. They cannot borrow the engine while
//! it dispatches, so they read state through the [`EngineView`] in their
//! [`EventContext`] and request mutations through its [`CommandQueue`]; the
//! engine applies queued commands as soon as the publish call returns.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::command::CommandQueue;
use super::entity::Entity;
use super::grid::Tile;
use super::image::ImageAsset;
use super::input::{KeyDescriptor, RawKeyEvent};
use super::view::EngineView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Init,
    CreateTile,
    DrawStart,
    DrawEnd,
    UpdateStart,
    UpdateEnd,
    SetTile,
    KeyUp,
    KeyDown,
    KeyPress,
    Pause,
    NewEntity,
    RemoveEntity,
    Collision,
    LoadedImage,
}

const EVENT_KIND_COUNT: usize = 15;

impl EventKind {
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::Init,
        EventKind::CreateTile,
        EventKind::DrawStart,
        EventKind::DrawEnd,
        EventKind::UpdateStart,
        EventKind::UpdateEnd,
        EventKind::SetTile,
        EventKind::KeyUp,
        EventKind::KeyDown,
        EventKind::KeyPress,
        EventKind::Pause,
        EventKind::NewEntity,
        EventKind::RemoveEntity,
        EventKind::Collision,
        EventKind::LoadedImage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::CreateTile => "create-tile",
            EventKind::DrawStart => "draw-start",
            EventKind::DrawEnd => "draw-end",
            EventKind::UpdateStart => "update-start",
            EventKind::UpdateEnd => "update-end",
            EventKind::SetTile => "set-tile",
            EventKind::KeyUp => "key-up",
            EventKind::KeyDown => "key-down",
            EventKind::KeyPress => "key-press",
            EventKind::Pause => "pause",
            EventKind::NewEntity => "new-entity",
            EventKind::RemoveEntity => "remove-entity",
            EventKind::Collision => "collision",
            EventKind::LoadedImage => "loaded-image",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event name '{0}'")]
pub struct UnknownEventName(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownEventName(name.to_string()))
    }
}

#[derive(Debug)]
pub enum EngineEvent<'a> {
    Init,
    /// The tile is not yet part of the grid; listeners may restyle it.
    CreateTile(&'a mut Tile),
    DrawStart,
    DrawEnd,
    UpdateStart,
    UpdateEnd,
    SetTile(&'a Tile),
    KeyUp {
        key: KeyDescriptor,
        raw: &'a RawKeyEvent,
    },
    KeyDown {
        key: KeyDescriptor,
        raw: &'a RawKeyEvent,
    },
    KeyPress {
        key: KeyDescriptor,
        raw: &'a RawKeyEvent,
    },
    Pause(bool),
    NewEntity(&'a Entity),
    /// `None` when the key matched nothing.
    RemoveEntity(Option<&'a Entity>),
    Collision {
        moving: &'a Entity,
        colliding: &'a Entity,
    },
    LoadedImage(&'a ImageAsset),
}

impl EngineEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Init => EventKind::Init,
            EngineEvent::CreateTile(_) => EventKind::CreateTile,
            EngineEvent::DrawStart => EventKind::DrawStart,
            EngineEvent::DrawEnd => EventKind::DrawEnd,
            EngineEvent::UpdateStart => EventKind::UpdateStart,
            EngineEvent::UpdateEnd => EventKind::UpdateEnd,
            EngineEvent::SetTile(_) => EventKind::SetTile,
            EngineEvent::KeyUp { .. } => EventKind::KeyUp,
            EngineEvent::KeyDown { .. } => EventKind::KeyDown,
            EngineEvent::KeyPress { .. } => EventKind::KeyPress,
            EngineEvent::Pause(_) => EventKind::Pause,
            EngineEvent::NewEntity(_) => EventKind::NewEntity,
            EngineEvent::RemoveEntity(_) => EventKind::RemoveEntity,
            EngineEvent::Collision { .. } => EventKind::Collision,
            EngineEvent::LoadedImage(_) => EventKind::LoadedImage,
        }
    }
}

pub struct EventContext<'a> {
    view: EngineView<'a>,
    commands: &'a mut CommandQueue,
}

impl<'a> EventContext<'a> {
    pub fn view(&self) -> &EngineView<'a> {
        &self.view
    }

    pub fn commands(&mut self) -> &mut CommandQueue {
        self.commands
    }
}

pub type Listener = Box<dyn FnMut(&mut EngineEvent<'_>, &mut EventContext<'_>)>;

pub struct EventBus {
    listeners: [Vec<Listener>; EVENT_KIND_COUNT],
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            listeners: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl EventBus {
    pub fn subscribe<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&mut EngineEvent<'_>, &mut EventContext<'_>) + 'static,
    {
        self.listeners[kind.index()].push(Box::new(listener));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners[kind.index()].len()
    }

    /// Runs every listener of the event's kind, in registration order.
    pub fn publish(
        &mut self,
        event: &mut EngineEvent<'_>,
        view: EngineView<'_>,
        commands: &mut CommandQueue,
    ) {
        let listeners = &mut self.listeners[event.kind().index()];
        if listeners.is_empty() {
            return;
        }
        let mut context = EventContext { view, commands };
        for listener in listeners.iter_mut() {
            listener(event, &mut context);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            let count = self.listener_count(kind);
            if count > 0 {
                map.entry(&kind.as_str(), &count);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::world::geometry::Direction;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert_eq!(
            "explode".parse::<EventKind>(),
            Err(UnknownEventName("explode".to_string()))
        );
    }

    #[test]
    fn kind_index_matches_table_position() {
        for (position, kind) in EventKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn listeners_run_in_registration_order_for_their_kind_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::default();
        for label in ["first", "second"] {
            let log = Rc::clone(&log);
            bus.subscribe(EventKind::DrawStart, move |_, _| {
                log.borrow_mut().push(label)
            });
        }
        let other = Rc::clone(&log);
        bus.subscribe(EventKind::DrawEnd, move |_, _| {
            other.borrow_mut().push("draw-end")
        });

        let mut commands = CommandQueue::default();
        bus.publish(
            &mut EngineEvent::DrawStart,
            EngineView::default(),
            &mut commands,
        );

        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(bus.listener_count(EventKind::DrawStart), 2);
        assert_eq!(bus.listener_count(EventKind::DrawEnd), 1);
    }

    #[test]
    fn publish_without_listeners_is_a_no_op() {
        let mut bus = EventBus::default();
        let mut commands = CommandQueue::default();
        bus.publish(&mut EngineEvent::Init, EngineView::default(), &mut commands);
        bus.publish(
            &mut EngineEvent::RemoveEntity(None),
            EngineView::default(),
            &mut commands,
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn listeners_queue_commands_through_context() {
        let mut bus = EventBus::default();
        bus.subscribe(EventKind::KeyDown, |event, context| {
            if let EngineEvent::KeyDown { key, .. } = event {
                if key.name == "d" {
                    context.commands().move_entity("player", Direction::Right);
                }
            }
        });

        let raw = RawKeyEvent::new("d");
        let mut commands = CommandQueue::default();
        bus.publish(
            &mut EngineEvent::KeyDown {
                key: KeyDescriptor::from(&raw),
                raw: &raw,
            },
            EngineView::default(),
            &mut commands,
        );

        assert_eq!(commands.len(), 1);
    }
}
