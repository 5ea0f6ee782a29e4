//! String-keyed event routing, expressed as a closed key type.
//!
//! Both raw input and collision results reach an entity as an [`EventKey`].
//! Each entity owns a [`DispatchTable`] mapping keys to handlers; a key with
//! no registered handler resolves to [`Handler::NoOp`], so an unknown event
//! leaves the entity idle instead of failing.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::entity::{Entity, TypeTag};
use crate::geometry::{Edge, Rect, Vec2};
use crate::input::KeyCode;

const HIT_BY_PREFIX: &str = "hitby";
const NO_INPUT_WIRE: &str = "-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A key is held; rendered on the wire as its numeric code.
    Key(KeyCode),
    /// No key is held any more.
    NoInput,
    /// Collision with an entity of the given type.
    HitBy(TypeTag),
}

impl EventKey {
    /// Parses the wire form: a key code, `-1`, or `hitby<tag>`.
    pub fn parse(raw: &str) -> Option<EventKey> {
        if raw == NO_INPUT_WIRE {
            return Some(EventKey::NoInput);
        }
        if let Some(tag) = raw.strip_prefix(HIT_BY_PREFIX) {
            return TypeTag::parse(tag).map(EventKey::HitBy);
        }
        raw.parse::<u32>().ok().map(|code| EventKey::Key(KeyCode(code)))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Key(code) => write!(f, "{}", code.0),
            EventKey::NoInput => f.write_str(NO_INPUT_WIRE),
            EventKey::HitBy(tag) => write!(f, "{HIT_BY_PREFIX}{tag}"),
        }
    }
}

/// Everything a handler may touch besides its own entity.
pub struct EventContext<'a> {
    /// The other collision participant; `None` for input events.
    pub other: Option<&'a mut Entity>,
    pub play_area: Rect,
}

impl<'a> EventContext<'a> {
    pub fn input(play_area: Rect) -> Self {
        Self {
            other: None,
            play_area,
        }
    }

    pub fn collision(other: &'a mut Entity, play_area: Rect) -> Self {
        Self {
            other: Some(other),
            play_area,
        }
    }
}

pub type HandlerFn = Rc<dyn Fn(&mut Entity, &mut EventContext<'_>)>;

#[derive(Clone, Default)]
pub enum Handler {
    #[default]
    NoOp,
    Action(HandlerFn),
}

impl Handler {
    pub fn action(f: impl Fn(&mut Entity, &mut EventContext<'_>) + 'static) -> Self {
        Handler::Action(Rc::new(f))
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Handler::NoOp)
    }

    pub fn invoke(&self, entity: &mut Entity, ctx: &mut EventContext<'_>) {
        match self {
            Handler::NoOp => {}
            Handler::Action(action) => action(entity, ctx),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::NoOp => f.write_str("NoOp"),
            Handler::Action(_) => f.write_str("Action(..)"),
        }
    }
}

#[derive(Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<EventKey, Handler>,
}

impl DispatchTable {
    /// Registers `handler` for `key`, replacing and returning any previous one.
    pub fn register(&mut self, key: EventKey, handler: Handler) -> Option<Handler> {
        self.handlers.insert(key, handler)
    }

    pub fn resolve(&self, key: &EventKey) -> Handler {
        match self.handlers.get(key) {
            Some(handler) => handler.clone(),
            None => {
                trace!(key = %key, "dispatch_miss");
                Handler::NoOp
            }
        }
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EventKey> {
        self.handlers.keys()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("DispatchTable").field("keys", &keys).finish()
    }
}

/// Stock handlers shared by the built-in archetypes.
pub mod handlers {
    use super::*;

    pub fn die() -> Handler {
        Handler::action(|entity, _ctx| entity.die())
    }

    /// Takes the bullet's damage and destroys the bullet. Bullets fired by
    /// this entity are ignored.
    pub fn absorb_projectile() -> Handler {
        Handler::action(|entity, ctx| {
            let Some(other) = ctx.other.as_deref_mut() else {
                return;
            };
            let Some(projectile) = other.projectile else {
                return;
            };
            if projectile.owner == Some(entity.id()) {
                return;
            }
            entity.decrease_health(projectile.damage);
            other.die();
        })
    }

    /// Moves toward `edge` at `speed` while there is room, keeping the other
    /// axis; stops completely once the edge would be crossed.
    pub fn steer(edge: Edge, speed: f32) -> Handler {
        Handler::action(move |entity, ctx| {
            if !ctx.play_area.has_room_toward(&entity.bounds(), edge) {
                entity.velocity = Vec2::ZERO;
                return;
            }
            match edge {
                Edge::Left => entity.velocity.x = -speed,
                Edge::Right => entity.velocity.x = speed,
                Edge::Top => entity.velocity.y = -speed,
                Edge::Bottom => entity.velocity.y = speed,
            }
        })
    }

    /// Horizontal-only steering for gravity-bound entities; vertical speed
    /// is left to gravity and jumping.
    pub fn walk(edge: Edge, speed: f32) -> Handler {
        Handler::action(move |entity, ctx| {
            if !ctx.play_area.has_room_toward(&entity.bounds(), edge) {
                entity.velocity.x = 0.0;
                return;
            }
            match edge {
                Edge::Left => entity.velocity.x = -speed,
                Edge::Right => entity.velocity.x = speed,
                Edge::Top | Edge::Bottom => {}
            }
        })
    }

    pub fn halt() -> Handler {
        Handler::action(|entity, _ctx| {
            entity.velocity = Vec2::ZERO;
        })
    }

    /// Releasing every key stops walking but lets a jump or fall finish.
    pub fn halt_horizontal() -> Handler {
        Handler::action(|entity, _ctx| {
            entity.velocity.x = 0.0;
        })
    }

    /// Each press asks for exactly one shot; holding the key does not repeat.
    pub fn pull_trigger() -> Handler {
        Handler::action(|entity, _ctx| entity.fire_requested = true)
    }

    /// Launches upward only while standing on the floor of the play area.
    pub fn jump(speed: f32) -> Handler {
        Handler::action(move |entity, ctx| {
            if !ctx.play_area.has_room_toward(&entity.bounds(), Edge::Bottom) {
                entity.velocity.y = -speed;
            }
        })
    }
}
