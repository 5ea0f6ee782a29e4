pub mod behavior;
pub mod dispatch;
pub mod driver;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod level;
pub mod pathfind;
pub mod render;
mod session;

pub use behavior::{
    Behavior, Bounce, Confine, CullOutside, EntitySnapshot, FireMode, Gravity, Pursuit, Shooting,
    TickContext, Translate, WorldView,
};
pub use dispatch::{handlers, DispatchTable, EventContext, EventKey, Handler, HandlerFn};
pub use driver::{DriverError, DriverOutcome, GameDriver, LevelEntry, LevelFactory, LoopConfig};
pub use entity::{
    base_param_docs, bullet_entity, Archetype, ArchetypeRegistry, BulletSpec, ConfigError, Entity,
    EntityConfig, EntityId, EntityIdAllocator, Health, ParamDocs, Projectile, TypeTag, Visual,
};
pub use geometry::{Edge, Rect, Size, Vec2};
pub use input::{InputQueue, KeyCode, KeyEvent, KeyState};
pub use level::{
    resolve_collisions, ClearEnemies, Collision, Level, LevelConfig, LevelPhase, LevelRules,
    PlayStatus, Sandbox, TickReport,
};
pub use pathfind::{Direction, OccupancyError, OccupancyMap, Occupant, PathFinder, TilePoint};
pub use render::{Camera, Color, DrawCommand, DrawList, Surface};
pub use session::Session;
