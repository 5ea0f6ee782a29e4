use std::any::Any;

use tracing::debug;

use super::{Behavior, TickContext, WorldView};
use crate::entity::{Entity, TypeTag};
use crate::geometry::{Rect, Vec2};
use crate::pathfind::{Direction, OccupancyMap, Occupant, PathFinder, TilePoint};

/// Interception AI: each tick, plans a tile route to the nearest live entity
/// of `target` and steers along its first move. Live `tile` entities are
/// obstacles. With no target or no route the entity holds position.
#[derive(Debug, Clone, PartialEq)]
pub struct Pursuit {
    pub target: TypeTag,
    pub speed: f32,
    pub tile_size: f32,
    last_route: Option<Vec<Direction>>,
}

impl Pursuit {
    pub fn new(target: TypeTag, speed: f32, tile_size: f32) -> Self {
        Self {
            target,
            speed,
            tile_size,
            last_route: None,
        }
    }

    /// Route planned on the most recent tick; `None` when none was found.
    pub fn last_route(&self) -> Option<&[Direction]> {
        self.last_route.as_deref()
    }

    fn tile_of(&self, area: &Rect, point: Vec2) -> TilePoint {
        TilePoint::new(
            ((point.x - area.left) / self.tile_size).floor() as i32,
            ((point.y - area.top) / self.tile_size).floor() as i32,
        )
    }

    fn occupancy(&self, view: &WorldView) -> Option<OccupancyMap> {
        let area = view.play_area();
        if self.tile_size <= 0.0 {
            return None;
        }
        let width = (area.width() / self.tile_size).ceil() as u32;
        let height = (area.height() / self.tile_size).ceil() as u32;
        let mut map = match OccupancyMap::new(width, height) {
            Ok(map) => map,
            Err(err) => {
                debug!(error = %err, "pursuit_map_unavailable");
                return None;
            }
        };
        for tile in view.live_with_tag(TypeTag::Tile) {
            let point = self.tile_of(&area, tile.bounds.center());
            // Tiles hanging off the play area cannot block a route inside it.
            if !map.contains(point) {
                continue;
            }
            if let Err(err) = map.place(point, Occupant::blocking(tile.id.0)) {
                debug!(error = %err, tile = tile.id.0, "pursuit_map_unavailable");
                return None;
            }
        }
        Some(map)
    }
}

impl Behavior for Pursuit {
    fn name(&self) -> &'static str {
        "pursuit"
    }

    fn apply_tick(&mut self, owner: &mut Entity, ctx: &mut TickContext<'_>) {
        let view = ctx.view();
        let Some(quarry) = view.nearest(owner.position, self.target) else {
            self.last_route = None;
            owner.velocity = Vec2::ZERO;
            return;
        };
        let quarry_center = quarry.bounds.center();
        let Some(map) = self.occupancy(view) else {
            self.last_route = None;
            owner.velocity = Vec2::ZERO;
            return;
        };

        let area = view.play_area();
        let start = self.tile_of(&area, owner.position);
        let goal = self.tile_of(&area, quarry_center);
        self.last_route = PathFinder::new(&map, start, goal).search();

        owner.velocity = match self.last_route.as_deref() {
            None => Vec2::ZERO,
            // Same tile: close in directly.
            Some([]) => (quarry_center - owner.position).normalized_or_zero() * self.speed,
            Some([first, ..]) => {
                let (dx, dy) = first.offset();
                Vec2::new(dx as f32, dy as f32) * self.speed
            }
        };
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::EntitySnapshot;
    use crate::entity::{EntityId, Visual};
    use crate::geometry::Size;

    fn tile_snapshot(id: u64, column: i32, row: i32, tag: TypeTag) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId(id),
            tag,
            bounds: Rect::from_center(
                Vec2::new(column as f32 * 10.0 + 5.0, row as f32 * 10.0 + 5.0),
                Size::new(10.0, 10.0),
            ),
            alive: true,
        }
    }

    fn hunter(column: i32, row: i32) -> Entity {
        Entity::new(
            TypeTag::Enemy,
            Vec2::new(column as f32 * 10.0 + 5.0, row as f32 * 10.0 + 5.0),
            Size::new(8.0, 8.0),
            Visual::new("hunter.png"),
        )
        .with_velocity(Vec2::new(3.0, 3.0))
    }

    #[test]
    fn steers_along_first_move_of_route() {
        let view = WorldView::new(
            Rect::of_size(Size::new(50.0, 50.0)),
            vec![tile_snapshot(1, 4, 0, TypeTag::Player)],
        );
        let mut spawns = Vec::new();
        let mut ctx = TickContext::new(0.1, &view, &mut spawns);
        let mut owner = hunter(0, 0);
        let mut pursuit = Pursuit::new(TypeTag::Player, 20.0, 10.0);

        pursuit.apply_tick(&mut owner, &mut ctx);

        assert_eq!(owner.velocity, Vec2::new(20.0, 0.0));
        assert_eq!(pursuit.last_route().map(<[Direction]>::len), Some(4));
    }

    #[test]
    fn holds_position_when_target_is_walled_off() {
        let mut entities = vec![tile_snapshot(1, 2, 2, TypeTag::Player)];
        for (offset, (column, row)) in [(2, 1), (2, 3), (1, 2), (3, 2)].into_iter().enumerate() {
            entities.push(tile_snapshot(10 + offset as u64, column, row, TypeTag::Tile));
        }
        let view = WorldView::new(Rect::of_size(Size::new(50.0, 50.0)), entities);
        let mut spawns = Vec::new();
        let mut ctx = TickContext::new(0.1, &view, &mut spawns);
        let mut owner = hunter(0, 0);
        let mut pursuit = Pursuit::new(TypeTag::Player, 20.0, 10.0);

        pursuit.apply_tick(&mut owner, &mut ctx);

        assert_eq!(owner.velocity, Vec2::ZERO);
        assert!(pursuit.last_route().is_none());
    }

    #[test]
    fn tiles_outside_the_play_area_are_ignored() {
        let view = WorldView::new(
            Rect::of_size(Size::new(50.0, 50.0)),
            vec![
                tile_snapshot(1, 4, 0, TypeTag::Player),
                tile_snapshot(2, -1, 0, TypeTag::Tile),
                tile_snapshot(3, 5, 0, TypeTag::Tile),
                tile_snapshot(4, 2, 1, TypeTag::Tile),
            ],
        );
        let map = Pursuit::new(TypeTag::Player, 20.0, 10.0)
            .occupancy(&view)
            .expect("map for a sized play area");
        assert!(map.is_blocked(TilePoint::new(2, 1)));
        assert!(!map.contains(TilePoint::new(-1, 0)));
        assert!(!map.contains(TilePoint::new(5, 0)));

        let mut spawns = Vec::new();
        let mut ctx = TickContext::new(0.1, &view, &mut spawns);
        let mut owner = hunter(0, 0);
        let mut pursuit = Pursuit::new(TypeTag::Player, 20.0, 10.0);
        pursuit.apply_tick(&mut owner, &mut ctx);

        assert_eq!(owner.velocity, Vec2::new(20.0, 0.0));
        assert_eq!(pursuit.last_route().map(<[Direction]>::len), Some(4));
    }

    #[test]
    fn holds_position_without_a_target() {
        let view = WorldView::new(Rect::of_size(Size::new(50.0, 50.0)), Vec::new());
        let mut spawns = Vec::new();
        let mut ctx = TickContext::new(0.1, &view, &mut spawns);
        let mut owner = hunter(1, 1);

        Pursuit::new(TypeTag::Player, 20.0, 10.0).apply_tick(&mut owner, &mut ctx);
        assert_eq!(owner.velocity, Vec2::ZERO);
    }
}
