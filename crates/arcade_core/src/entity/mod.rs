mod archetype;
mod config;

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::behavior::{Behavior, TickContext};
use crate::dispatch::{DispatchTable, EventContext, EventKey, Handler};
use crate::geometry::{Rect, Size, Vec2};
use crate::render::{Camera, Surface};

pub use archetype::{bullet_entity, Archetype, ArchetypeRegistry, BuildFn, BulletSpec};
pub use config::{
    base_param_docs, ConfigError, EntityConfig, ParamDocs, HEIGHT_KEY, IMAGE_KEY, WIDTH_KEY,
    X_KEY, Y_KEY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Id carried by an entity that has not been added to a level yet.
    pub const UNASSIGNED: EntityId = EntityId(u64::MAX);
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Closed set of entity kinds. The lowercase name is part of the
/// collision-event key contract (`hitby<tag>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Player,
    Enemy,
    Bullet,
    Tile,
    Item,
}

impl TypeTag {
    pub const ALL: [TypeTag; 5] = [
        TypeTag::Player,
        TypeTag::Enemy,
        TypeTag::Bullet,
        TypeTag::Tile,
        TypeTag::Item,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            TypeTag::Player => "player",
            TypeTag::Enemy => "enemy",
            TypeTag::Bullet => "bullet",
            TypeTag::Tile => "tile",
            TypeTag::Item => "item",
        }
    }

    pub fn parse(raw: &str) -> Option<TypeTag> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// Invulnerable: damage is ignored and the entity never dies from it.
    Unbounded,
    Points(i32),
}

impl Health {
    pub fn points(self) -> Option<i32> {
        match self {
            Health::Unbounded => None,
            Health::Points(points) => Some(points),
        }
    }

    pub fn damaged(self, damage: u32) -> Health {
        match self {
            Health::Unbounded => Health::Unbounded,
            Health::Points(points) => {
                let damage = i32::try_from(damage).unwrap_or(i32::MAX);
                Health::Points(points.saturating_sub(damage))
            }
        }
    }

    /// Below zero, not at zero: an entity at exactly 0 is still alive.
    pub fn is_depleted(self) -> bool {
        matches!(self, Health::Points(points) if points < 0)
    }
}

/// Reference to the image an entity is drawn with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Visual {
    image: String,
}

impl Visual {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub damage: u32,
    pub owner: Option<EntityId>,
}

#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    tag: TypeTag,
    pub position: Vec2,
    pub size: Size,
    pub velocity: Vec2,
    health: Health,
    visual: Option<Visual>,
    removal_flag: bool,
    /// Receives queued key events at the start of each tick.
    pub input_focus: bool,
    /// One pending shot requested by the fire key; the next shot clears it.
    pub fire_requested: bool,
    pub projectile: Option<Projectile>,
    /// Awarded to the session when this entity is destroyed.
    pub score_value: u32,
    behaviors: Vec<Box<dyn Behavior>>,
    dispatch: DispatchTable,
}

impl Entity {
    pub fn new(tag: TypeTag, position: Vec2, size: Size, visual: Visual) -> Self {
        Self {
            id: EntityId::UNASSIGNED,
            tag,
            position,
            size,
            velocity: Vec2::ZERO,
            health: Health::Unbounded,
            visual: Some(visual),
            removal_flag: false,
            input_focus: false,
            fire_requested: false,
            projectile: None,
            score_value: 0,
            behaviors: Vec::new(),
            dispatch: DispatchTable::default(),
        }
    }

    pub fn with_health(mut self, health: Health) -> Self {
        self.health = health;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior) -> Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    pub fn with_handler(mut self, key: EventKey, handler: Handler) -> Self {
        self.dispatch.register(key, handler);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn decrease_health(&mut self, damage: u32) {
        self.health = self.health.damaged(damage);
    }

    pub fn visual(&self) -> Option<&Visual> {
        self.visual.as_ref()
    }

    pub fn set_visual(&mut self, visual: Visual) {
        if self.visual.is_some() {
            self.visual = Some(visual);
        }
    }

    /// A dead entity keeps no visual; it is skipped by collision and
    /// painting and purged at the next sweep.
    pub fn is_alive(&self) -> bool {
        self.visual.is_some()
    }

    pub fn die(&mut self) {
        self.visual = None;
        self.removal_flag = true;
    }

    pub fn mark_for_removal(&mut self) {
        self.removal_flag = true;
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.removal_flag
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    pub fn left(&self) -> f32 {
        self.bounds().left
    }

    pub fn top(&self) -> f32 {
        self.bounds().top
    }

    pub fn right(&self) -> f32 {
        self.bounds().right
    }

    pub fn bottom(&self) -> f32 {
        self.bounds().bottom
    }

    pub fn add_behavior(&mut self, behavior: impl Behavior) {
        self.behaviors.push(Box::new(behavior));
    }

    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|behavior| behavior.name()).collect()
    }

    /// First attached behavior of concrete type `T`.
    pub fn behavior<T: Behavior>(&self) -> Option<&T> {
        self.behaviors
            .iter()
            .find_map(|behavior| behavior.as_any().downcast_ref::<T>())
    }

    pub fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// Routes `key` to the registered handler; unregistered keys do nothing.
    pub fn handle_event(&mut self, key: &EventKey, ctx: &mut EventContext<'_>) {
        let handler = self.dispatch.resolve(key);
        handler.invoke(self, ctx);
    }

    /// Runs one tick: a depleted entity dies instead of acting, otherwise
    /// every behavior runs once in attachment order.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        if !self.is_alive() {
            return;
        }
        if self.health.is_depleted() {
            self.die();
            return;
        }

        let mut behaviors = mem::take(&mut self.behaviors);
        for behavior in &mut behaviors {
            behavior.apply_tick(self, ctx);
        }
        // Behaviors attached while the list was detached go after the originals.
        behaviors.append(&mut self.behaviors);
        self.behaviors = behaviors;
    }

    /// Draws the current visual if the bounding box is inside the camera's
    /// visible region, translated by the camera offset.
    pub fn paint(&self, surface: &mut dyn Surface, camera: &Camera) {
        let Some(visual) = &self.visual else {
            return;
        };
        let bounds = self.bounds();
        if !bounds.intersects(&camera.visible_region()) {
            return;
        }
        surface.draw_image(visual.image(), camera.world_to_screen_rect(bounds));
    }
}
