//! Level sequencing on a fixed-timestep clock.
//!
//! The driver turns variable frame times into a whole number of fixed
//! ticks, forwards them to the current level and reacts to its status:
//! *advance* swaps in the next level, *game over* ends the run.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::entity::ConfigError;
use crate::input::KeyEvent;
use crate::level::{Level, PlayStatus};
use crate::render::Surface;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

impl LoopConfig {
    pub fn fixed_dt(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_tps.max(1)))
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no levels registered")]
    NoLevels,
    #[error("failed to build level `{name}`: {source}")]
    LevelConstruction {
        name: String,
        #[source]
        source: ConfigError,
    },
    #[error("level `{from}` names unknown next level `{name}`")]
    UnknownLevel { from: String, name: String },
}

pub type LevelFactory = Box<dyn Fn() -> Result<Level, ConfigError>>;

/// A named recipe for a fresh level instance.
pub struct LevelEntry {
    pub name: String,
    factory: LevelFactory,
}

impl LevelEntry {
    pub fn new(
        name: impl Into<String>,
        factory: impl Fn() -> Result<Level, ConfigError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }

    fn build(&self) -> Result<Level, DriverError> {
        (self.factory)().map_err(|source| DriverError::LevelConstruction {
            name: self.name.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    Playing,
    /// The last level advanced.
    Won,
    /// A level reported game over.
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

pub struct GameDriver {
    config: LoopConfig,
    session: Session,
    entries: Vec<LevelEntry>,
    current_index: usize,
    level: Level,
    accumulator: Duration,
    outcome: DriverOutcome,
    levels_cleared: u32,
}

impl GameDriver {
    /// Builds the first entry's level immediately.
    pub fn new(
        config: LoopConfig,
        session: Session,
        entries: Vec<LevelEntry>,
    ) -> Result<Self, DriverError> {
        let first = entries.first().ok_or(DriverError::NoLevels)?;
        let level = first.build()?;
        Ok(Self {
            config,
            session,
            entries,
            current_index: 0,
            level,
            accumulator: Duration::ZERO,
            outcome: DriverOutcome::Playing,
            levels_cleared: 0,
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn outcome(&self) -> DriverOutcome {
        self.outcome
    }

    pub fn levels_cleared(&self) -> u32 {
        self.levels_cleared
    }

    pub fn fixed_dt(&self) -> Duration {
        self.config.fixed_dt()
    }

    pub fn push_input(&mut self, event: KeyEvent) {
        self.level.push_input(event);
    }

    pub fn paint(&self, surface: &mut dyn Surface) {
        self.level.paint(surface);
    }

    /// Feeds one frame's elapsed time and runs the ticks it pays for. Ticks
    /// left over after a level change are discarded.
    pub fn frame(&mut self, frame_dt: Duration) -> Result<DriverOutcome, DriverError> {
        if self.outcome != DriverOutcome::Playing {
            return Ok(self.outcome);
        }
        let fixed_dt = self.config.fixed_dt();
        self.accumulator = self
            .accumulator
            .saturating_add(frame_dt.min(self.config.max_frame_delta));
        let plan = plan_sim_steps(
            self.accumulator,
            fixed_dt,
            self.config.max_ticks_per_frame.max(1),
        );
        self.accumulator = plan.remaining_accumulator;
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.config.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        for _ in 0..plan.ticks_to_run {
            let report = self.level.update(fixed_dt.as_secs_f32(), &mut self.session);
            match report.status {
                PlayStatus::Continue => {}
                PlayStatus::Advance => {
                    self.advance()?;
                    break;
                }
                PlayStatus::GameOver => {
                    self.outcome = DriverOutcome::Lost;
                    info!(
                        level = self.level.name(),
                        score = self.session.score(),
                        ticks = self.session.ticks(),
                        "game_over"
                    );
                    break;
                }
            }
        }
        Ok(self.outcome)
    }

    fn advance(&mut self) -> Result<(), DriverError> {
        self.levels_cleared = self.levels_cleared.saturating_add(1);
        self.accumulator = Duration::ZERO;

        let next_index = match &self.level.config().next_level {
            Some(name) => Some(
                self.entries
                    .iter()
                    .position(|entry| entry.name == *name)
                    .ok_or_else(|| DriverError::UnknownLevel {
                        from: self.level.name().to_string(),
                        name: name.clone(),
                    })?,
            ),
            None => Some(self.current_index + 1).filter(|index| *index < self.entries.len()),
        };

        let Some(next_index) = next_index else {
            self.outcome = DriverOutcome::Won;
            info!(
                levels_cleared = self.levels_cleared,
                score = self.session.score(),
                "game_won"
            );
            return Ok(());
        };

        let next = self.entries[next_index].build()?;
        info!(
            from = self.level.name(),
            to = next.name(),
            score = self.session.score(),
            "level_advanced"
        );
        self.level = next;
        self.current_index = next_index;
        Ok(())
    }
}
