use std::env;
use std::path::PathBuf;

use arcade_core::{ArchetypeRegistry, LevelEntry, LoopConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::level_file::{builtin_levels, load_level_file, LevelFile, LevelFileError};

const LEVELS_ENV_VAR: &str = "ARCADE_LEVELS";
const MAX_TICKS_ENV_VAR: &str = "ARCADE_MAX_TICKS";
const SHOW_FRAMES_ENV_VAR: &str = "ARCADE_SHOW_FRAMES";
const DEFAULT_MAX_TICKS: u64 = 3_600;
const PLAYER_NAME: &str = "autopilot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DemoSettings {
    pub(crate) player_name: String,
    /// Level files in play order; empty means the built-in levels.
    pub(crate) level_paths: Vec<PathBuf>,
    pub(crate) max_ticks: u64,
    /// Print a rasterized frame every this many ticks; 0 prints none.
    pub(crate) frame_every: u64,
    pub(crate) frame_columns: usize,
    pub(crate) autopilot_period: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            player_name: PLAYER_NAME.to_string(),
            level_paths: Vec::new(),
            max_ticks: DEFAULT_MAX_TICKS,
            frame_every: 0,
            frame_columns: 64,
            autopilot_period: 45,
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) settings: DemoSettings,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Arcade Demo Startup ===");

    let defaults = DemoSettings::default();
    let settings = DemoSettings {
        level_paths: parse_level_paths(env::var(LEVELS_ENV_VAR).ok().as_deref()),
        max_ticks: resolve_u64_env(MAX_TICKS_ENV_VAR, defaults.max_ticks),
        frame_every: resolve_u64_env(SHOW_FRAMES_ENV_VAR, defaults.frame_every),
        ..defaults
    };
    info!(
        level_files = settings.level_paths.len(),
        max_ticks = settings.max_ticks,
        frame_every = settings.frame_every,
        "demo_configured"
    );

    AppWiring {
        config: LoopConfig::default(),
        settings,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_level_paths(raw: Option<&str>) -> Vec<PathBuf> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(PathBuf::from)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

fn resolve_u64_env(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => parse_u64_or(name, &value, default),
        Err(env::VarError::NotPresent) => default,
        Err(err) => {
            warn!(
                env_var = name,
                error = %err,
                "unreadable env var value; falling back to default"
            );
            default
        }
    }
}

fn parse_u64_or(name: &str, value: &str, default: u64) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(
                env_var = name,
                value,
                "invalid env var value; falling back to default"
            );
            default
        }
    }
}

/// Reads every configured level up front so a bad file fails before play.
pub(crate) fn load_levels(settings: &DemoSettings) -> Result<Vec<LevelFile>, LevelFileError> {
    if settings.level_paths.is_empty() {
        return builtin_levels();
    }
    settings
        .level_paths
        .iter()
        .map(|path| load_level_file(path))
        .collect()
}

/// One driver entry per level file, each building fresh from the registry.
pub(crate) fn level_entries(
    files: Vec<LevelFile>,
    registry: &ArchetypeRegistry,
) -> Vec<LevelEntry> {
    files
        .into_iter()
        .map(|file| {
            let registry = registry.clone();
            let name = file.name().to_string();
            LevelEntry::new(name, move || file.instantiate(&registry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_paths_are_trimmed_and_filtered() {
        let paths = parse_level_paths(Some(" a.json, ,b.json ,"));
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert!(parse_level_paths(None).is_empty());
        assert!(parse_level_paths(Some(" , ")).is_empty());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        assert_eq!(parse_u64_or("X", "120", 5), 120);
        assert_eq!(parse_u64_or("X", " 7 ", 5), 7);
        assert_eq!(parse_u64_or("X", "-1", 5), 5);
        assert_eq!(parse_u64_or("X", "lots", 5), 5);
    }

    #[test]
    fn unset_level_paths_load_builtins() {
        let files = load_levels(&DemoSettings::default()).expect("builtin levels");
        let entries = level_entries(files, &ArchetypeRegistry::default());
        let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["shooter", "platformer", "maze"]);
    }
}
