use std::any::Any;

use super::{Behavior, TickContext};
use crate::entity::Entity;
use crate::geometry::Edge;

/// Integrates velocity (units per second) into position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translate;

impl Behavior for Translate {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        owner.position += owner.velocity * ctx.elapsed_seconds;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Downward acceleration with a speed cap. Attach after [`Translate`]: an
/// entity that sank through the floor of the play area is put back on it and
/// its fall stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    pub acceleration: f32,
    pub terminal_velocity: f32,
}

impl Gravity {
    pub fn new(acceleration: f32, terminal_velocity: f32) -> Self {
        Self {
            acceleration,
            terminal_velocity,
        }
    }
}

impl Behavior for Gravity {
    fn name(&self) -> &'static str {
        "gravity"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        owner.velocity.y = (owner.velocity.y + self.acceleration * ctx.elapsed_seconds)
            .min(self.terminal_velocity);

        let area = ctx.play_area();
        if !area.is_empty() && owner.velocity.y >= 0.0 && owner.bottom() >= area.bottom {
            owner.position.y = area.bottom - owner.size.height * 0.5;
            owner.velocity.y = 0.0;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Reverses the velocity component that would carry the entity across an
/// edge of the play area.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounce {
    pub bounces: u32,
}

impl Behavior for Bounce {
    fn name(&self) -> &'static str {
        "bounce"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        let area = ctx.play_area();
        if area.is_empty() {
            return;
        }
        let bounds = owner.bounds();
        let velocity = &mut owner.velocity;
        let crossing_x = (velocity.x < 0.0 && !area.has_room_toward(&bounds, Edge::Left))
            || (velocity.x > 0.0 && !area.has_room_toward(&bounds, Edge::Right));
        let crossing_y = (velocity.y < 0.0 && !area.has_room_toward(&bounds, Edge::Top))
            || (velocity.y > 0.0 && !area.has_room_toward(&bounds, Edge::Bottom));
        if crossing_x {
            velocity.x = -velocity.x;
        }
        if crossing_y {
            velocity.y = -velocity.y;
        }
        if crossing_x || crossing_y {
            self.bounces = self.bounces.saturating_add(1);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Flags the entity for removal once it lies entirely outside the play area.
/// The visual is kept: leaving the screen is not a kill and awards no score.
#[derive(Debug, Clone, Copy, Default)]
pub struct CullOutside;

impl Behavior for CullOutside {
    fn name(&self) -> &'static str {
        "cull_outside"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        let area = ctx.play_area();
        if area.is_empty() {
            return;
        }
        if !owner.bounds().intersects(&area) {
            owner.mark_for_removal();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Keeps the bounding box inside the play area. Motion into an edge the
/// entity already touches is stopped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Confine;

impl Behavior for Confine {
    fn name(&self) -> &'static str {
        "confine"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        let area = ctx.play_area();
        if area.is_empty() {
            return;
        }
        let half_width = owner.size.width * 0.5;
        let half_height = owner.size.height * 0.5;
        if owner.left() <= area.left {
            owner.position.x = area.left + half_width;
            owner.velocity.x = owner.velocity.x.max(0.0);
        } else if owner.right() >= area.right {
            owner.position.x = area.right - half_width;
            owner.velocity.x = owner.velocity.x.min(0.0);
        }
        if owner.top() <= area.top {
            owner.position.y = area.top + half_height;
            owner.velocity.y = owner.velocity.y.max(0.0);
        } else if owner.bottom() >= area.bottom {
            owner.position.y = area.bottom - half_height;
            owner.velocity.y = owner.velocity.y.min(0.0);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
