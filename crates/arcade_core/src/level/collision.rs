use tracing::trace;

use crate::dispatch::{EventContext, EventKey};
use crate::entity::{Entity, EntityId, TypeTag};
use crate::geometry::Rect;

/// One intersecting pair, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collision {
    pub first: EntityId,
    pub first_tag: TypeTag,
    pub second: EntityId,
    pub second_tag: TypeTag,
}

impl Collision {
    pub fn involves(&self, id: EntityId) -> bool {
        self.first == id || self.second == id
    }
}

/// Tests every unordered pair once and dispatches `hitby<tag>` to both sides
/// of each intersecting pair, each side receiving the other as argument.
///
/// Liveness is checked when a pair is reached, so an entity killed by an
/// earlier pair takes part in no later one. The pairwise scan is O(n²) per
/// call; intended for levels with tens of entities.
pub fn resolve_collisions(entities: &mut [Entity], play_area: Rect) -> Vec<Collision> {
    let mut collisions = Vec::new();
    for split in 1..entities.len() {
        let (head, tail) = entities.split_at_mut(split);
        let second = &mut tail[0];
        for first in head.iter_mut() {
            if !first.is_alive() || !second.is_alive() {
                continue;
            }
            if !first.bounds().intersects(&second.bounds()) {
                continue;
            }

            let collision = Collision {
                first: first.id(),
                first_tag: first.tag(),
                second: second.id(),
                second_tag: second.tag(),
            };
            trace!(
                first = %collision.first,
                second = %collision.second,
                first_tag = %collision.first_tag,
                second_tag = %collision.second_tag,
                "collision"
            );
            first.handle_event(
                &EventKey::HitBy(collision.second_tag),
                &mut EventContext::collision(second, play_area),
            );
            second.handle_event(
                &EventKey::HitBy(collision.first_tag),
                &mut EventContext::collision(first, play_area),
            );
            collisions.push(collision);
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dispatch::{handlers, Handler};
    use crate::entity::Visual;
    use crate::geometry::{Size, Vec2};

    type Log = Rc<RefCell<Vec<(EntityId, String, Option<EntityId>)>>>;

    fn recorder(log: &Log) -> Handler {
        let log = Rc::clone(log);
        Handler::action(move |entity, ctx| {
            let other = ctx.other.as_deref().map(Entity::id);
            log.borrow_mut().push((entity.id(), "hit".to_string(), other));
        })
    }

    fn body(id: u64, tag: TypeTag, x: f32) -> Entity {
        let mut entity = Entity::new(
            tag,
            Vec2::new(x, 10.0),
            Size::new(10.0, 10.0),
            Visual::new("body.png"),
        );
        entity.assign_id(EntityId(id));
        entity
    }

    fn area() -> Rect {
        Rect::of_size(Size::new(100.0, 100.0))
    }

    #[test]
    fn dispatches_mirrored_keys_to_both_sides() {
        let log: Log = Rc::default();
        let mut entities = vec![
            body(0, TypeTag::Bullet, 10.0)
                .with_handler(EventKey::HitBy(TypeTag::Enemy), recorder(&log)),
            body(1, TypeTag::Enemy, 15.0)
                .with_handler(EventKey::HitBy(TypeTag::Bullet), recorder(&log)),
        ];

        let collisions = resolve_collisions(&mut entities, area());

        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].first_tag, TypeTag::Bullet);
        assert_eq!(collisions[0].second_tag, TypeTag::Enemy);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(log.contains(&(EntityId(0), "hit".to_string(), Some(EntityId(1)))));
        assert!(log.contains(&(EntityId(1), "hit".to_string(), Some(EntityId(0)))));
    }

    #[test]
    fn never_pairs_an_entity_with_itself_or_repeats_a_pair() {
        let mut entities = vec![
            body(0, TypeTag::Tile, 10.0),
            body(1, TypeTag::Tile, 12.0),
            body(2, TypeTag::Tile, 14.0),
        ];
        let collisions = resolve_collisions(&mut entities, area());
        assert_eq!(collisions.len(), 3);
        for collision in &collisions {
            assert_ne!(collision.first, collision.second);
        }
    }

    #[test]
    fn dead_entities_take_no_part() {
        let log: Log = Rc::default();
        let mut dead = body(0, TypeTag::Bullet, 10.0);
        dead.die();
        let mut entities = vec![
            dead,
            body(1, TypeTag::Player, 10.0)
                .with_handler(EventKey::HitBy(TypeTag::Bullet), recorder(&log)),
        ];

        assert!(resolve_collisions(&mut entities, area()).is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn entity_killed_by_earlier_pair_skips_later_pairs() {
        let mut entities = vec![
            body(0, TypeTag::Player, 10.0)
                .with_handler(EventKey::HitBy(TypeTag::Bullet), handlers::absorb_projectile()),
            body(1, TypeTag::Bullet, 12.0),
            body(2, TypeTag::Enemy, 14.0),
        ];
        entities[1].projectile = Some(crate::entity::Projectile {
            damage: 1,
            owner: None,
        });

        let collisions = resolve_collisions(&mut entities, area());

        assert!(!entities[1].is_alive());
        assert!(collisions.iter().all(|c| !(c.involves(EntityId(1)) && c.involves(EntityId(2)))));
        assert_eq!(collisions.len(), 2);
    }

    #[test]
    fn touching_boxes_do_not_collide() {
        let mut entities = vec![body(0, TypeTag::Tile, 10.0), body(1, TypeTag::Tile, 20.0)];
        assert!(resolve_collisions(&mut entities, area()).is_empty());
    }
}
