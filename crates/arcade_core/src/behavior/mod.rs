//! Per-tick logic units attached to entities.
//!
//! A behavior receives its owning entity mutably for the duration of one
//! call instead of holding a back-reference to it. Read access to the rest of
//! the level goes through a [`WorldView`] captured before any entity updates,
//! and new entities are requested through [`TickContext::spawn`].

mod movement;
mod pursuit;
mod shooting;

use std::any::Any;
use std::fmt;

use crate::entity::{Entity, EntityId, TypeTag};
use crate::geometry::{Rect, Size, Vec2};

pub use movement::{Bounce, Confine, CullOutside, Gravity, Translate};
pub use pursuit::Pursuit;
pub use shooting::{FireMode, Shooting};

pub trait Behavior: Any + fmt::Debug {
    /// Stable lowercase name, used in logs and diagnostics.
    fn name(&self) -> &'static str;
    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What an entity looked like when the tick started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub tag: TypeTag,
    pub bounds: Rect,
    pub alive: bool,
}

impl EntitySnapshot {
    pub fn of(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            tag: entity.tag(),
            bounds: entity.bounds(),
            alive: entity.is_alive() && !entity.is_marked_for_removal(),
        }
    }
}

/// Read-only picture of the level shared by every behavior during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldView {
    play_area: Rect,
    entities: Vec<EntitySnapshot>,
}

impl Default for WorldView {
    /// An empty play area: no level bounds are known.
    fn default() -> Self {
        Self {
            play_area: Rect::of_size(Size::new(0.0, 0.0)),
            entities: Vec::new(),
        }
    }
}

impl WorldView {
    pub fn new(play_area: Rect, entities: Vec<EntitySnapshot>) -> Self {
        Self {
            play_area,
            entities,
        }
    }

    pub fn capture(play_area: Rect, entities: &[Entity]) -> Self {
        Self::new(play_area, entities.iter().map(EntitySnapshot::of).collect())
    }

    pub fn play_area(&self) -> Rect {
        self.play_area
    }

    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    pub fn live_with_tag(&self, tag: TypeTag) -> impl Iterator<Item = &EntitySnapshot> + '_ {
        self.entities
            .iter()
            .filter(move |snapshot| snapshot.alive && snapshot.tag == tag)
    }

    /// Closest live entity of `tag` to `from`, measured center to center.
    /// Equal distances resolve to the earlier entity in level order.
    pub fn nearest(&self, from: Vec2, tag: TypeTag) -> Option<&EntitySnapshot> {
        self.live_with_tag(tag).fold(None, |best, candidate| {
            let distance = candidate.bounds.center().distance(from);
            match best {
                Some((_, best_distance)) if best_distance <= distance => best,
                _ => Some((candidate, distance)),
            }
        })
        .map(|(snapshot, _)| snapshot)
    }
}

pub struct TickContext<'a> {
    pub elapsed_seconds: f32,
    view: &'a WorldView,
    spawns: &'a mut Vec<Entity>,
}

impl<'a> TickContext<'a> {
    pub fn new(elapsed_seconds: f32, view: &'a WorldView, spawns: &'a mut Vec<Entity>) -> Self {
        Self {
            elapsed_seconds,
            view,
            spawns,
        }
    }

    pub fn view(&self) -> &WorldView {
        self.view
    }

    pub fn play_area(&self) -> Rect {
        self.view.play_area
    }

    /// Queues `entity` to join the level once the current tick finishes.
    pub fn spawn(&mut self, entity: Entity) {
        self.spawns.push(entity);
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }
}
