//! Level container and its tick loop.
//!
//! A tick runs in fixed order: queued input is dispatched to input-focused
//! entities, every live entity updates against a snapshot taken before the
//! first update, collisions are resolved (when enabled), flagged entities are
//! swept out, spawn requests join the collection, and the rules report a
//! status. Entities never leave or join the collection while it is being
//! iterated.

mod collision;
mod status;

use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::behavior::{TickContext, WorldView};
use crate::dispatch::EventContext;
use crate::entity::{
    ArchetypeRegistry, ConfigError, Entity, EntityConfig, EntityId, EntityIdAllocator, TypeTag,
};
use crate::geometry::{Rect, Size, Vec2};
use crate::input::{InputQueue, KeyEvent};
use crate::render::{Camera, Surface};
use crate::session::Session;

pub use collision::{resolve_collisions, Collision};
pub use status::{ClearEnemies, LevelPhase, LevelRules, PlayStatus, Sandbox};

fn default_collisions_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Size of the play area, anchored at the world origin.
    pub dimension: Size,
    pub viewport: Size,
    /// Input-only levels turn this off and never test collisions.
    #[serde(default = "default_collisions_enabled")]
    pub collisions_enabled: bool,
    /// Keep the camera centered on the first live player.
    #[serde(default)]
    pub follow_player: bool,
    #[serde(default)]
    pub next_level: Option<String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: "level".to_string(),
            dimension: Size::new(640.0, 480.0),
            viewport: Size::new(640.0, 480.0),
            collisions_enabled: true,
            follow_player: false,
            next_level: None,
        }
    }
}

/// Outcome of one [`Level::update`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Entities swept out this tick, moved out of the level.
    pub removed: Vec<Entity>,
    pub spawned: Vec<EntityId>,
    pub collisions: Vec<Collision>,
    pub status: PlayStatus,
}

impl TickReport {
    pub fn removed_ids(&self) -> Vec<EntityId> {
        self.removed.iter().map(Entity::id).collect()
    }
}

#[derive(Debug)]
pub struct Level {
    config: LevelConfig,
    rules: Box<dyn LevelRules>,
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    camera: Camera,
    input: InputQueue,
    phase: LevelPhase,
    status: PlayStatus,
    tick: u64,
}

impl Level {
    pub fn new(config: LevelConfig, rules: Box<dyn LevelRules>) -> Self {
        let camera =
            Camera::new(Vec2::ZERO, config.viewport).with_limits(Rect::of_size(config.dimension));
        Self {
            config,
            rules,
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            camera,
            input: InputQueue::default(),
            phase: LevelPhase::Initializing,
            status: PlayStatus::Continue,
            tick: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn rules(&self) -> &dyn LevelRules {
        self.rules.as_ref()
    }

    pub fn play_area(&self) -> Rect {
        Rect::of_size(self.config.dimension)
    }

    /// Assigns a fresh id and appends the entity; collection order is
    /// update and paint order.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = self.allocator.allocate();
        entity.assign_id(id);
        self.entities.push(entity);
        id
    }

    pub fn spawn_from_config(
        &mut self,
        registry: &ArchetypeRegistry,
        archetype: &str,
        config: &EntityConfig,
    ) -> Result<EntityId, ConfigError> {
        match registry.build(archetype, config) {
            Ok(entity) => Ok(self.add_entity(entity)),
            Err(err) => {
                warn!(
                    level = %self.config.name,
                    archetype,
                    error = %err,
                    "entity_construction_failed"
                );
                Err(err)
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    /// Entities of `tag` that still have a visual and are not flagged.
    pub fn count_live(&self, tag: TypeTag) -> usize {
        self.entities
            .iter()
            .filter(|entity| {
                entity.tag() == tag && entity.is_alive() && !entity.is_marked_for_removal()
            })
            .count()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Buffers a key event; it is dispatched at the start of the next tick.
    pub fn push_input(&mut self, event: KeyEvent) {
        self.input.push(event);
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn status(&self) -> PlayStatus {
        self.status
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Advances the level by one tick. A level that already advanced or
    /// terminated does nothing and repeats its final status.
    pub fn update(&mut self, elapsed_seconds: f32, session: &mut Session) -> TickReport {
        if self.phase.is_finished() {
            return TickReport {
                tick: self.tick,
                status: self.status,
                ..TickReport::default()
            };
        }
        if self.phase == LevelPhase::Initializing {
            self.phase = LevelPhase::Running;
            info!(
                level = %self.config.name,
                rules = self.rules.name(),
                entity_count = self.entities.len(),
                "level_started"
            );
        }
        self.tick = self.tick.saturating_add(1);
        session.record_tick();
        let play_area = self.play_area();

        self.dispatch_input(play_area);

        let view = WorldView::capture(play_area, &self.entities);
        let mut spawns = Vec::new();
        {
            let mut ctx = TickContext::new(elapsed_seconds, &view, &mut spawns);
            for entity in &mut self.entities {
                entity.update(&mut ctx);
            }
        }

        let collisions = if self.config.collisions_enabled {
            resolve_collisions(&mut self.entities, play_area)
        } else {
            Vec::new()
        };

        let removed = self.sweep(session);
        let spawned: Vec<EntityId> = spawns
            .into_iter()
            .map(|entity| self.add_entity(entity))
            .collect();

        let status = self.rules.evaluate(&self.entities);
        self.apply_status(status);
        if self.config.follow_player {
            self.follow_player();
        }

        debug!(
            level = %self.config.name,
            tick = self.tick,
            removed = removed.len(),
            spawned = spawned.len(),
            collisions = collisions.len(),
            "tick_completed"
        );
        TickReport {
            tick: self.tick,
            removed,
            spawned,
            collisions,
            status,
        }
    }

    /// Paints the background, then every live entity in collection order.
    pub fn paint(&self, surface: &mut dyn Surface) {
        self.rules.paint_background(surface, &self.camera);
        for entity in &self.entities {
            entity.paint(surface, &self.camera);
        }
    }

    fn dispatch_input(&mut self, play_area: Rect) {
        for key in self.input.drain() {
            for entity in &mut self.entities {
                if entity.input_focus && entity.is_alive() {
                    entity.handle_event(&key, &mut EventContext::input(play_area));
                }
            }
        }
    }

    // Destroyed entities (no visual) pay out their score on the way out.
    fn sweep(&mut self, session: &mut Session) -> Vec<Entity> {
        let (removed, kept): (Vec<Entity>, Vec<Entity>) = mem::take(&mut self.entities)
            .into_iter()
            .partition(|entity| entity.is_marked_for_removal() || !entity.is_alive());
        self.entities = kept;

        for entity in &removed {
            let destroyed = !entity.is_alive();
            if destroyed && entity.score_value > 0 {
                session.award(entity.score_value);
            }
            debug!(
                level = %self.config.name,
                entity = %entity.id(),
                tag = %entity.tag(),
                destroyed,
                "entity_removed"
            );
        }
        removed
    }

    fn apply_status(&mut self, status: PlayStatus) {
        let previous = self.status;
        self.status = status;
        self.phase = self.phase.after(status);
        if status != previous {
            info!(
                level = %self.config.name,
                tick = self.tick,
                from = %previous,
                to = %status,
                "level_status_changed"
            );
        }
    }

    fn follow_player(&mut self) {
        let target = self
            .entities
            .iter()
            .find(|entity| entity.tag() == TypeTag::Player && entity.is_alive())
            .map(|entity| entity.position);
        if let Some(position) = target {
            self.camera.center_on(position);
        }
    }
}
