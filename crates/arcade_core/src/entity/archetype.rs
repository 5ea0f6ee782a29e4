use std::collections::HashMap;
use std::fmt;

use super::config::{
    base_param_docs, ConfigError, EntityConfig, ParamDocs, HEIGHT_KEY, IMAGE_KEY, WIDTH_KEY,
    X_KEY, Y_KEY,
};
use super::{Entity, EntityId, Health, Projectile, TypeTag, Visual};
use crate::behavior::{
    Bounce, Confine, CullOutside, FireMode, Gravity, Pursuit, Shooting, Translate,
};
use crate::dispatch::{handlers, EventKey};
use crate::geometry::{Edge, Size, Vec2};
use crate::input::KeyCode;

const HEALTH_KEY: &str = "health";
const SPEED_KEY: &str = "speed";
const SCORE_KEY: &str = "score";
const VX_KEY: &str = "vx";
const VY_KEY: &str = "vy";
const DAMAGE_KEY: &str = "damage";
const FIRE_INTERVAL_KEY: &str = "fireInterval";
const BULLET_SPEED_KEY: &str = "bulletSpeed";
const BULLET_DAMAGE_KEY: &str = "bulletDamage";
const BULLET_IMAGE_KEY: &str = "bulletImage";
const BULLET_WIDTH_KEY: &str = "bulletWidth";
const BULLET_HEIGHT_KEY: &str = "bulletHeight";
const LEFT_KEY: &str = "leftKey";
const RIGHT_KEY: &str = "rightKey";
const UP_KEY: &str = "upKey";
const DOWN_KEY: &str = "downKey";
const FIRE_KEY: &str = "fireKey";
const JUMP_KEY: &str = "jumpKey";
const JUMP_SPEED_KEY: &str = "jumpSpeed";
const GRAVITY_KEY: &str = "gravity";
const TERMINAL_VELOCITY_KEY: &str = "terminalVelocity";
const TILE_SIZE_KEY: &str = "tileSize";

/// Everything needed to fire one bullet.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletSpec {
    pub image: String,
    pub size: Size,
    pub velocity: Vec2,
    pub damage: u32,
}

impl BulletSpec {
    fn from_config(
        config: &EntityConfig,
        default_image: &str,
        default_speed: f32,
        heading: f32,
    ) -> Result<Self, ConfigError> {
        let speed = config.optional_f32(BULLET_SPEED_KEY, default_speed)?;
        Ok(Self {
            image: config
                .get(BULLET_IMAGE_KEY)
                .unwrap_or(default_image)
                .to_string(),
            size: Size::new(
                config.optional_f32(BULLET_WIDTH_KEY, 4.0)?,
                config.optional_f32(BULLET_HEIGHT_KEY, 8.0)?,
            ),
            velocity: Vec2::new(0.0, heading * speed),
            damage: config.optional_u32(BULLET_DAMAGE_KEY, 1)?,
        })
    }
}

/// A bullet moving under its own velocity until it leaves the play area.
pub fn bullet_entity(spec: &BulletSpec, origin: Vec2, owner: Option<EntityId>) -> Entity {
    let mut bullet = Entity::new(
        TypeTag::Bullet,
        origin,
        spec.size,
        Visual::new(spec.image.clone()),
    )
    .with_velocity(spec.velocity)
    .with_behavior(Translate)
    .with_behavior(CullOutside);
    bullet.projectile = Some(Projectile {
        damage: spec.damage,
        owner,
    });
    bullet
}

pub type BuildFn = fn(&EntityConfig) -> Result<Entity, ConfigError>;

/// Named entity recipe: type tag, documented parameters and a builder.
#[derive(Clone, Copy)]
pub struct Archetype {
    pub name: &'static str,
    pub tag: TypeTag,
    params: fn() -> ParamDocs,
    build: BuildFn,
}

impl Archetype {
    pub const fn new(
        name: &'static str,
        tag: TypeTag,
        params: fn() -> ParamDocs,
        build: BuildFn,
    ) -> Self {
        Self {
            name,
            tag,
            params,
            build,
        }
    }

    /// Parameter names and descriptions, base keys included.
    pub fn param_docs(&self) -> ParamDocs {
        (self.params)()
    }

    pub fn build(&self, config: &EntityConfig) -> Result<Entity, ConfigError> {
        (self.build)(config)
    }
}

impl fmt::Debug for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archetype")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ArchetypeRegistry {
    archetypes: Vec<Archetype>,
    index_by_name: HashMap<&'static str, usize>,
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for archetype in BUILTIN_ARCHETYPES {
            registry.register(archetype);
        }
        registry
    }
}

const BUILTIN_ARCHETYPES: [Archetype; 7] = [
    Archetype::new("player", TypeTag::Player, player_params, build_player),
    Archetype::new("runner", TypeTag::Player, runner_params, build_runner),
    Archetype::new("enemy", TypeTag::Enemy, enemy_params, build_enemy),
    Archetype::new(
        "interceptor",
        TypeTag::Enemy,
        interceptor_params,
        build_interceptor,
    ),
    Archetype::new("bullet", TypeTag::Bullet, bullet_params, build_bullet),
    Archetype::new("tile", TypeTag::Tile, base_param_docs, build_tile),
    Archetype::new("item", TypeTag::Item, item_params, build_item),
];

impl ArchetypeRegistry {
    pub fn empty() -> Self {
        Self {
            archetypes: Vec::new(),
            index_by_name: HashMap::new(),
        }
    }

    /// Adds or replaces the archetype registered under the same name.
    pub fn register(&mut self, archetype: Archetype) {
        match self.index_by_name.get(archetype.name) {
            Some(&index) => self.archetypes[index] = archetype,
            None => {
                self.index_by_name
                    .insert(archetype.name, self.archetypes.len());
                self.archetypes.push(archetype);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.index_by_name
            .get(name)
            .and_then(|&index| self.archetypes.get(index))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.archetypes.iter().map(|archetype| archetype.name)
    }

    pub fn param_docs(&self, name: &str) -> Result<ParamDocs, ConfigError> {
        self.lookup(name).map(Archetype::param_docs)
    }

    pub fn build(&self, name: &str, config: &EntityConfig) -> Result<Entity, ConfigError> {
        self.lookup(name)?.build(config)
    }

    fn lookup(&self, name: &str) -> Result<&Archetype, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownArchetype {
            name: name.to_string(),
        })
    }
}

// Base keys are read before anything else so a config missing one never
// yields a partially built entity.
fn base_entity(config: &EntityConfig, tag: TypeTag) -> Result<Entity, ConfigError> {
    let position = Vec2::new(config.require_f32(X_KEY)?, config.require_f32(Y_KEY)?);
    let size = Size::new(
        config.require_f32(WIDTH_KEY)?,
        config.require_f32(HEIGHT_KEY)?,
    );
    let image = config.require(IMAGE_KEY)?;
    Ok(Entity::new(tag, position, size, Visual::new(image)))
}

fn key_code(config: &EntityConfig, key: &str, default: KeyCode) -> Result<EventKey, ConfigError> {
    config
        .optional_u32(key, default.0)
        .map(|code| EventKey::Key(KeyCode(code)))
}

fn player_params() -> ParamDocs {
    let mut params = base_param_docs();
    params.insert(HEALTH_KEY, "starting health; the player dies below zero");
    params.insert(SPEED_KEY, "movement speed in units per second (default 120)");
    params.insert(FIRE_INTERVAL_KEY, "seconds between shots while firing (default 0.25)");
    params.insert(BULLET_SPEED_KEY, "speed of fired bullets (default 240)");
    params.insert(BULLET_DAMAGE_KEY, "damage dealt by fired bullets (default 1)");
    params.insert(BULLET_IMAGE_KEY, "image of fired bullets");
    params.insert(LEFT_KEY, "key code for moving left (default 37)");
    params.insert(RIGHT_KEY, "key code for moving right (default 39)");
    params.insert(UP_KEY, "key code for moving up (default 38)");
    params.insert(DOWN_KEY, "key code for moving down (default 40)");
    params.insert(FIRE_KEY, "key code for firing (default 32)");
    params
}

fn build_player(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let entity = base_entity(config, TypeTag::Player)?;
    let health = config.require_i32(HEALTH_KEY)?;
    let speed = config.optional_f32(SPEED_KEY, 120.0)?;
    let interval = config.optional_f32(FIRE_INTERVAL_KEY, 0.25)?;
    let bullet = BulletSpec::from_config(config, "bullet.png", 240.0, -1.0)?;
    let left = key_code(config, LEFT_KEY, KeyCode::LEFT)?;
    let right = key_code(config, RIGHT_KEY, KeyCode::RIGHT)?;
    let up = key_code(config, UP_KEY, KeyCode::UP)?;
    let down = key_code(config, DOWN_KEY, KeyCode::DOWN)?;
    let fire = key_code(config, FIRE_KEY, KeyCode::SPACE)?;

    let mut entity = entity
        .with_health(Health::Points(health))
        .with_handler(left, handlers::steer(Edge::Left, speed))
        .with_handler(right, handlers::steer(Edge::Right, speed))
        .with_handler(up, handlers::steer(Edge::Top, speed))
        .with_handler(down, handlers::steer(Edge::Bottom, speed))
        .with_handler(fire, handlers::pull_trigger())
        .with_handler(EventKey::NoInput, handlers::halt())
        .with_handler(EventKey::HitBy(TypeTag::Bullet), handlers::absorb_projectile())
        .with_handler(EventKey::HitBy(TypeTag::Enemy), handlers::die())
        .with_behavior(Translate)
        .with_behavior(Confine)
        .with_behavior(Shooting::new(FireMode::OnTrigger, interval, bullet));
    entity.input_focus = true;
    Ok(entity)
}

fn runner_params() -> ParamDocs {
    let mut params = base_param_docs();
    params.insert(HEALTH_KEY, "starting health (default 0)");
    params.insert(SPEED_KEY, "walking speed in units per second (default 100)");
    params.insert(JUMP_SPEED_KEY, "upward launch speed of a jump (default 300)");
    params.insert(GRAVITY_KEY, "downward acceleration (default 600)");
    params.insert(TERMINAL_VELOCITY_KEY, "maximum falling speed (default 600)");
    params.insert(LEFT_KEY, "key code for walking left (default 37)");
    params.insert(RIGHT_KEY, "key code for walking right (default 39)");
    params.insert(JUMP_KEY, "key code for jumping (default 38)");
    params
}

fn build_runner(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let entity = base_entity(config, TypeTag::Player)?;
    let health = config.optional_i32(HEALTH_KEY, 0)?;
    let speed = config.optional_f32(SPEED_KEY, 100.0)?;
    let jump_speed = config.optional_f32(JUMP_SPEED_KEY, 300.0)?;
    let gravity = Gravity::new(
        config.optional_f32(GRAVITY_KEY, 600.0)?,
        config.optional_f32(TERMINAL_VELOCITY_KEY, 600.0)?,
    );
    let left = key_code(config, LEFT_KEY, KeyCode::LEFT)?;
    let right = key_code(config, RIGHT_KEY, KeyCode::RIGHT)?;
    let jump = key_code(config, JUMP_KEY, KeyCode::UP)?;

    let mut entity = entity
        .with_health(Health::Points(health))
        .with_handler(left, handlers::walk(Edge::Left, speed))
        .with_handler(right, handlers::walk(Edge::Right, speed))
        .with_handler(jump, handlers::jump(jump_speed))
        .with_handler(EventKey::NoInput, handlers::halt_horizontal())
        .with_handler(EventKey::HitBy(TypeTag::Bullet), handlers::absorb_projectile())
        .with_handler(EventKey::HitBy(TypeTag::Enemy), handlers::die())
        .with_behavior(Translate)
        .with_behavior(gravity)
        .with_behavior(Confine);
    entity.input_focus = true;
    Ok(entity)
}

fn enemy_params() -> ParamDocs {
    let mut params = base_param_docs();
    params.insert(HEALTH_KEY, "starting health (default 0)");
    params.insert(VX_KEY, "initial horizontal velocity (default 0)");
    params.insert(VY_KEY, "initial vertical velocity (default 0)");
    params.insert(SCORE_KEY, "points awarded when destroyed (default 10)");
    params.insert(FIRE_INTERVAL_KEY, "seconds between downward shots; unset never fires");
    params.insert(BULLET_SPEED_KEY, "speed of fired bullets (default 150)");
    params.insert(BULLET_DAMAGE_KEY, "damage dealt by fired bullets (default 1)");
    params.insert(BULLET_IMAGE_KEY, "image of fired bullets");
    params
}

fn hostile(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let entity = base_entity(config, TypeTag::Enemy)?;
    let health = config.optional_i32(HEALTH_KEY, 0)?;
    let velocity = Vec2::new(
        config.optional_f32(VX_KEY, 0.0)?,
        config.optional_f32(VY_KEY, 0.0)?,
    );
    let mut entity = entity
        .with_health(Health::Points(health))
        .with_velocity(velocity)
        .with_handler(EventKey::HitBy(TypeTag::Bullet), handlers::absorb_projectile())
        .with_handler(EventKey::HitBy(TypeTag::Player), handlers::die());
    entity.score_value = config.optional_u32(SCORE_KEY, 10)?;
    Ok(entity)
}

fn enemy_gun(config: &EntityConfig) -> Result<Option<Shooting>, ConfigError> {
    if !config.contains(FIRE_INTERVAL_KEY) {
        return Ok(None);
    }
    let interval = config.optional_f32(FIRE_INTERVAL_KEY, 1.0)?;
    let bullet = BulletSpec::from_config(config, "enemy_bullet.png", 150.0, 1.0)?;
    Ok(Some(Shooting::new(FireMode::Automatic, interval, bullet)))
}

fn build_enemy(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let gun = enemy_gun(config)?;
    let mut entity = hostile(config)?
        .with_behavior(Translate)
        .with_behavior(Bounce::default());
    if let Some(gun) = gun {
        entity.add_behavior(gun);
    }
    Ok(entity)
}

fn interceptor_params() -> ParamDocs {
    let mut params = enemy_params();
    params.insert(SPEED_KEY, "pursuit speed in units per second (default 60)");
    params.insert(TILE_SIZE_KEY, "side of the planning grid's tiles (default 32)");
    params
}

fn build_interceptor(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let speed = config.optional_f32(SPEED_KEY, 60.0)?;
    let tile_size = config.optional_f32(TILE_SIZE_KEY, 32.0)?;
    if tile_size <= 0.0 {
        return Err(ConfigError::Malformed {
            key: TILE_SIZE_KEY.to_string(),
            value: tile_size.to_string(),
            expected: "a positive number",
        });
    }
    let gun = enemy_gun(config)?;
    let mut entity = hostile(config)?
        .with_behavior(Pursuit::new(TypeTag::Player, speed, tile_size))
        .with_behavior(Translate);
    if let Some(gun) = gun {
        entity.add_behavior(gun);
    }
    Ok(entity)
}

fn bullet_params() -> ParamDocs {
    let mut params = base_param_docs();
    params.insert(DAMAGE_KEY, "damage dealt on hit (default 1)");
    params.insert(VX_KEY, "horizontal velocity (default 0)");
    params.insert(VY_KEY, "vertical velocity (default -200)");
    params
}

fn build_bullet(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let base = base_entity(config, TypeTag::Bullet)?;
    let spec = BulletSpec {
        image: config.require(IMAGE_KEY)?.to_string(),
        size: base.size,
        velocity: Vec2::new(
            config.optional_f32(VX_KEY, 0.0)?,
            config.optional_f32(VY_KEY, -200.0)?,
        ),
        damage: config.optional_u32(DAMAGE_KEY, 1)?,
    };
    Ok(bullet_entity(&spec, base.position, None))
}

fn build_tile(config: &EntityConfig) -> Result<Entity, ConfigError> {
    Ok(base_entity(config, TypeTag::Tile)?.with_health(Health::Unbounded))
}

fn item_params() -> ParamDocs {
    let mut params = base_param_docs();
    params.insert(SCORE_KEY, "points awarded when collected (default 50)");
    params
}

fn build_item(config: &EntityConfig) -> Result<Entity, ConfigError> {
    let mut entity = base_entity(config, TypeTag::Item)?
        .with_handler(EventKey::HitBy(TypeTag::Player), handlers::die());
    entity.score_value = config.optional_u32(SCORE_KEY, 50)?;
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(extra: &[(&str, &str)]) -> EntityConfig {
        let mut config = EntityConfig::from_pairs([
            (X_KEY, "40"),
            (Y_KEY, "60"),
            (WIDTH_KEY, "10"),
            (HEIGHT_KEY, "12"),
            (IMAGE_KEY, "thing.png"),
        ]);
        for (key, value) in extra {
            config.insert(*key, value);
        }
        config
    }

    #[test]
    fn builtins_are_registered_in_order() {
        let registry = ArchetypeRegistry::default();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["player", "runner", "enemy", "interceptor", "bullet", "tile", "item"]
        );
        assert_eq!(registry.get("tile").map(|a| a.tag), Some(TypeTag::Tile));
    }

    #[test]
    fn unknown_archetype_is_a_config_error() {
        let registry = ArchetypeRegistry::default();
        let err = registry.build("dragon", &placed(&[])).expect_err("err");
        assert_eq!(
            err,
            ConfigError::UnknownArchetype {
                name: "dragon".to_string()
            }
        );
        assert!(registry.param_docs("dragon").is_err());
    }

    #[test]
    fn missing_base_key_fails_fast() {
        let registry = ArchetypeRegistry::default();
        let config = EntityConfig::from_pairs([(X_KEY, "1"), (Y_KEY, "1"), (WIDTH_KEY, "1")]);
        let err = registry.build("tile", &config).expect_err("err");
        assert_eq!(
            err,
            ConfigError::MissingKey {
                key: HEIGHT_KEY.to_string()
            }
        );
    }

    #[test]
    fn player_requires_health() {
        let registry = ArchetypeRegistry::default();
        let err = registry.build("player", &placed(&[])).expect_err("err");
        assert_eq!(
            err,
            ConfigError::MissingKey {
                key: HEALTH_KEY.to_string()
            }
        );
    }

    #[test]
    fn player_wires_input_and_collision_handlers() {
        let registry = ArchetypeRegistry::default();
        let player = registry
            .build("player", &placed(&[(HEALTH_KEY, "10"), (LEFT_KEY, "65")]))
            .expect("player");

        assert_eq!(player.tag(), TypeTag::Player);
        assert_eq!(player.health(), Health::Points(10));
        assert!(player.input_focus);
        assert_eq!(player.position, Vec2::new(40.0, 60.0));
        let table = player.dispatch_table();
        assert!(table.contains(&EventKey::Key(KeyCode(65))));
        assert!(!table.contains(&EventKey::Key(KeyCode::LEFT)));
        assert!(table.contains(&EventKey::NoInput));
        assert!(table.contains(&EventKey::HitBy(TypeTag::Bullet)));
        assert!(table.contains(&EventKey::HitBy(TypeTag::Enemy)));
        assert!(player.behavior::<Shooting>().is_some());
    }

    #[test]
    fn enemy_only_shoots_with_fire_interval() {
        let registry = ArchetypeRegistry::default();
        let passive = registry.build("enemy", &placed(&[])).expect("enemy");
        assert!(passive.behavior::<Shooting>().is_none());
        assert_eq!(passive.score_value, 10);

        let gunner = registry
            .build("enemy", &placed(&[(FIRE_INTERVAL_KEY, "2"), (SCORE_KEY, "25")]))
            .expect("enemy");
        let gun = gunner.behavior::<Shooting>().expect("gun");
        assert_eq!(gun.mode, FireMode::Automatic);
        assert!(gun.bullet.velocity.y > 0.0);
        assert_eq!(gunner.score_value, 25);
    }

    #[test]
    fn interceptor_plans_before_moving() {
        let registry = ArchetypeRegistry::default();
        let interceptor = registry.build("interceptor", &placed(&[])).expect("interceptor");
        assert_eq!(interceptor.behavior_names(), vec!["pursuit", "translate"]);

        let err = registry
            .build("interceptor", &placed(&[(TILE_SIZE_KEY, "0")]))
            .expect_err("err");
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn bullet_carries_its_damage() {
        let registry = ArchetypeRegistry::default();
        let bullet = registry
            .build("bullet", &placed(&[(DAMAGE_KEY, "4")]))
            .expect("bullet");
        assert_eq!(
            bullet.projectile,
            Some(Projectile {
                damage: 4,
                owner: None
            })
        );
        assert_eq!(bullet.behavior_names(), vec!["translate", "cull_outside"]);
    }

    #[test]
    fn param_docs_extend_base_keys() {
        let registry = ArchetypeRegistry::default();
        let docs = registry.param_docs("runner").expect("docs");
        for key in [X_KEY, Y_KEY, WIDTH_KEY, HEIGHT_KEY, IMAGE_KEY, JUMP_SPEED_KEY] {
            assert!(docs.contains_key(key), "missing {key}");
        }
        assert_eq!(registry.param_docs("tile").expect("docs"), base_param_docs());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ArchetypeRegistry::default();
        registry.register(Archetype::new(
            "item",
            TypeTag::Item,
            base_param_docs,
            build_tile,
        ));
        assert_eq!(registry.names().count(), 7);
        let built = registry.build("item", &placed(&[])).expect("item");
        assert_eq!(built.tag(), TypeTag::Tile);
    }
}
