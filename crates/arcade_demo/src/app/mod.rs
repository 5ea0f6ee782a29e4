mod ascii;
mod autopilot;
mod bootstrap;
mod level_file;

use arcade_core::{ArchetypeRegistry, DriverError, DriverOutcome, GameDriver, Session};
use thiserror::Error;
use tracing::{debug, info};

pub(crate) use bootstrap::{build_app, AppWiring};

use ascii::AsciiCanvas;
use autopilot::Autopilot;
use bootstrap::{level_entries, load_levels};
use level_file::LevelFileError;

#[derive(Debug, Error)]
pub(crate) enum DemoError {
    #[error(transparent)]
    LevelFile(#[from] LevelFileError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) outcome: DriverOutcome,
    pub(crate) score: u64,
    pub(crate) ticks: u64,
    pub(crate) levels_cleared: u32,
}

/// Plays the configured levels with the autopilot at a steady frame rate
/// until the game ends or the tick budget runs out.
pub(crate) fn run(wiring: AppWiring) -> Result<RunSummary, DemoError> {
    let AppWiring { config, settings } = wiring;
    let files = load_levels(&settings)?;
    let entries = level_entries(files, &ArchetypeRegistry::default());
    let mut driver = GameDriver::new(config, Session::new(&settings.player_name), entries)?;
    let mut autopilot = Autopilot::new(settings.autopilot_period);
    let frame_dt = driver.fixed_dt();
    info!(level = driver.level().name(), "demo_started");

    let mut outcome = DriverOutcome::Playing;
    for frame in 0..settings.max_ticks {
        for event in autopilot.events_for(frame) {
            driver.push_input(event);
        }
        outcome = driver.frame(frame_dt)?;

        if settings.frame_every > 0 && frame % settings.frame_every == 0 {
            let viewport = driver.level().camera().viewport;
            let mut canvas = AsciiCanvas::for_viewport(viewport, settings.frame_columns);
            driver.paint(&mut canvas);
            println!("frame {frame} [{}]\n{canvas}", driver.level().name());
        }
        if outcome != DriverOutcome::Playing {
            break;
        }
    }
    if outcome == DriverOutcome::Playing {
        debug!(max_ticks = settings.max_ticks, "tick_budget_exhausted");
    }

    Ok(RunSummary {
        outcome,
        score: driver.session().score(),
        ticks: driver.session().ticks(),
        levels_cleared: driver.levels_cleared(),
    })
}
