use std::any::Any;

use tracing::trace;

use super::{Behavior, TickContext};
use crate::entity::{bullet_entity, BulletSpec, Entity};
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireMode {
    /// Fires once per request from the owner's fire key, when the cooldown
    /// allows. A request made during the cooldown waits for it.
    OnTrigger,
    /// Fires whenever the cooldown allows.
    Automatic,
}

/// Spawns bullets owned by the shooter, at most once per `interval_seconds`.
#[derive(Debug, Clone, PartialEq)]
pub struct Shooting {
    pub mode: FireMode,
    pub interval_seconds: f32,
    pub bullet: BulletSpec,
    cooldown: f32,
    shots_fired: u32,
}

impl Shooting {
    pub fn new(mode: FireMode, interval_seconds: f32, bullet: BulletSpec) -> Self {
        Self {
            mode,
            interval_seconds: interval_seconds.max(0.0),
            bullet,
            cooldown: 0.0,
            shots_fired: 0,
        }
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    // Just outside the shooter's box along the bullet's heading.
    fn muzzle(&self, owner: &Entity) -> Vec2 {
        let heading = self.bullet.velocity.normalized_or_zero();
        Vec2 {
            x: owner.position.x + heading.x * (owner.size.width + self.bullet.size.width) * 0.5,
            y: owner.position.y + heading.y * (owner.size.height + self.bullet.size.height) * 0.5,
        }
    }
}

impl Behavior for Shooting {
    fn name(&self) -> &'static str {
        "shooting"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        self.cooldown = (self.cooldown - ctx.elapsed_seconds).max(0.0);
        let wants_to_fire = match self.mode {
            FireMode::OnTrigger => owner.fire_requested,
            FireMode::Automatic => true,
        };
        if !wants_to_fire || self.cooldown > 0.0 {
            return;
        }

        ctx.spawn(bullet_entity(&self.bullet, self.muzzle(owner), Some(owner.id())));
        owner.fire_requested = false;
        self.cooldown = self.interval_seconds;
        self.shots_fired = self.shots_fired.saturating_add(1);
        trace!(shooter = %owner.id(), shots_fired = self.shots_fired, "bullet_fired");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
