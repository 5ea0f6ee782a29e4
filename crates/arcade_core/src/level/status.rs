use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, TypeTag};
use crate::render::{Camera, Color, Surface};

/// What a level reports to its driver after each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    #[default]
    Continue,
    Advance,
    GameOver,
}

impl PlayStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PlayStatus::Continue => "continue",
            PlayStatus::Advance => "advance",
            PlayStatus::GameOver => "game_over",
        }
    }
}

impl fmt::Display for PlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a level. `Advanced` and `Terminated` are final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelPhase {
    #[default]
    Initializing,
    Running,
    Advanced,
    Terminated,
}

impl LevelPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, LevelPhase::Advanced | LevelPhase::Terminated)
    }

    /// Phase after a tick that reported `status`.
    pub fn after(self, status: PlayStatus) -> LevelPhase {
        if self.is_finished() {
            return self;
        }
        match status {
            PlayStatus::Continue => LevelPhase::Running,
            PlayStatus::Advance => LevelPhase::Advanced,
            PlayStatus::GameOver => LevelPhase::Terminated,
        }
    }
}

/// Win/lose predicates and background of one level flavor. Evaluation must
/// be a pure query over the entity collection.
pub trait LevelRules: fmt::Debug {
    fn name(&self) -> &'static str;

    fn evaluate(&self, entities: &[Entity]) -> PlayStatus;

    fn paint_background(&self, surface: &mut dyn Surface, camera: &Camera) {
        let viewport = camera.visible_region();
        surface.fill_rect(camera.world_to_screen_rect(viewport), Color::BLACK);
    }
}

fn present(entity: &Entity) -> bool {
    entity.is_alive() && !entity.is_marked_for_removal()
}

/// Game over once no player is left, next level once no enemy is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearEnemies;

impl LevelRules for ClearEnemies {
    fn name(&self) -> &'static str {
        "clear_enemies"
    }

    fn evaluate(&self, entities: &[Entity]) -> PlayStatus {
        let player_left = entities
            .iter()
            .any(|entity| entity.tag() == TypeTag::Player && present(entity));
        if !player_left {
            return PlayStatus::GameOver;
        }
        let enemy_left = entities
            .iter()
            .any(|entity| entity.tag() == TypeTag::Enemy && present(entity));
        if enemy_left {
            PlayStatus::Continue
        } else {
            PlayStatus::Advance
        }
    }
}

/// Open-ended play with no win or lose condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sandbox;

impl LevelRules for Sandbox {
    fn name(&self) -> &'static str {
        "sandbox"
    }

    fn evaluate(&self, _entities: &[Entity]) -> PlayStatus {
        PlayStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Visual;
    use crate::geometry::{Rect, Size, Vec2};
    use crate::render::{DrawCommand, DrawList};

    fn entity(tag: TypeTag) -> Entity {
        Entity::new(tag, Vec2::ZERO, Size::new(1.0, 1.0), Visual::new("x.png"))
    }

    #[test]
    fn finished_phases_latch() {
        let phase = LevelPhase::Initializing.after(PlayStatus::Continue);
        assert_eq!(phase, LevelPhase::Running);
        let phase = phase.after(PlayStatus::Advance);
        assert_eq!(phase, LevelPhase::Advanced);
        assert_eq!(phase.after(PlayStatus::GameOver), LevelPhase::Advanced);
        assert_eq!(
            LevelPhase::Terminated.after(PlayStatus::Continue),
            LevelPhase::Terminated
        );
    }

    #[test]
    fn clear_enemies_prefers_game_over() {
        let rules = ClearEnemies;
        assert_eq!(rules.evaluate(&[]), PlayStatus::GameOver);

        let mut flagged_player = entity(TypeTag::Player);
        flagged_player.mark_for_removal();
        assert_eq!(
            rules.evaluate(&[flagged_player, entity(TypeTag::Enemy)]),
            PlayStatus::GameOver
        );
    }

    #[test]
    fn clear_enemies_advances_when_only_dead_enemies_remain() {
        let rules = ClearEnemies;
        let mut dead_enemy = entity(TypeTag::Enemy);
        dead_enemy.die();
        assert_eq!(
            rules.evaluate(&[entity(TypeTag::Player), dead_enemy]),
            PlayStatus::Advance
        );
        assert_eq!(
            rules.evaluate(&[entity(TypeTag::Player), entity(TypeTag::Enemy)]),
            PlayStatus::Continue
        );
    }

    #[test]
    fn sandbox_never_ends_and_paints_default_background() {
        assert_eq!(Sandbox.evaluate(&[]), PlayStatus::Continue);

        let camera = Camera::new(Vec2::new(30.0, 40.0), Size::new(20.0, 10.0));
        let mut surface = DrawList::default();
        Sandbox.paint_background(&mut surface, &camera);
        assert_eq!(
            surface.commands().to_vec(),
            vec![DrawCommand::Fill {
                rect: Rect::of_size(Size::new(20.0, 10.0)),
                color: Color::BLACK,
            }]
        );
    }
}
