use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arcade_core::{
    ArchetypeRegistry, ClearEnemies, ConfigError, EntityConfig, Level, LevelConfig, LevelRules,
    Sandbox,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum LevelFileError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse level file {path} at {location}: {source}")]
    Parse {
        path: PathBuf,
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RulesKind {
    #[default]
    ClearEnemies,
    Sandbox,
}

impl RulesKind {
    fn build(self) -> Box<dyn LevelRules> {
        match self {
            RulesKind::ClearEnemies => Box::new(ClearEnemies),
            RulesKind::Sandbox => Box::new(Sandbox),
        }
    }
}

/// One placed entity: archetype name plus its flat attribute object.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct EntitySpec {
    pub(crate) archetype: String,
    pub(crate) attributes: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelFile {
    pub(crate) level: LevelConfig,
    #[serde(default)]
    pub(crate) rules: RulesKind,
    #[serde(default)]
    pub(crate) entities: Vec<EntitySpec>,
}

impl LevelFile {
    pub(crate) fn name(&self) -> &str {
        &self.level.name
    }

    /// Builds a fresh level. Any entity that fails to build aborts the level.
    pub(crate) fn instantiate(&self, registry: &ArchetypeRegistry) -> Result<Level, ConfigError> {
        let mut level = Level::new(self.level.clone(), self.rules.build());
        for spec in &self.entities {
            let config = EntityConfig::from_json(&spec.attributes)?;
            level.spawn_from_config(registry, &spec.archetype, &config)?;
        }
        Ok(level)
    }
}

pub(crate) fn load_level_file(path: &Path) -> Result<LevelFile, LevelFileError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level_json(&raw, path)
}

pub(crate) fn parse_level_json(raw: &str, origin: &Path) -> Result<LevelFile, LevelFileError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, LevelFile>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        LevelFileError::Parse {
            path: origin.to_path_buf(),
            location,
            source: error.into_inner(),
        }
    })
}

const SHOOTER_LEVEL: &str = r#"{
  "level": {
    "name": "shooter",
    "dimension": { "width": 320.0, "height": 240.0 },
    "viewport": { "width": 320.0, "height": 240.0 },
    "next_level": "platformer"
  },
  "rules": "clear_enemies",
  "entities": [
    { "archetype": "player",
      "attributes": { "x": 160, "y": 220, "width": 16, "height": 16,
                      "imagePath": "ship.png", "health": 3, "speed": 140 } },
    { "archetype": "enemy",
      "attributes": { "x": 60, "y": 40, "width": 16, "height": 16,
                      "imagePath": "invader.png", "vx": 50 } },
    { "archetype": "enemy",
      "attributes": { "x": 160, "y": 40, "width": 16, "height": 16,
                      "imagePath": "invader.png", "vx": 50, "fireInterval": 2.0 } },
    { "archetype": "enemy",
      "attributes": { "x": 260, "y": 40, "width": 16, "height": 16,
                      "imagePath": "invader.png", "vx": 50 } }
  ]
}"#;

const PLATFORMER_LEVEL: &str = r#"{
  "level": {
    "name": "platformer",
    "dimension": { "width": 640.0, "height": 240.0 },
    "viewport": { "width": 320.0, "height": 240.0 },
    "follow_player": true,
    "next_level": "maze"
  },
  "rules": "clear_enemies",
  "entities": [
    { "archetype": "runner",
      "attributes": { "x": 40, "y": 200, "width": 16, "height": 24,
                      "imagePath": "runner.png", "speed": 90 } },
    { "archetype": "item",
      "attributes": { "x": 200, "y": 228, "width": 8, "height": 8,
                      "imagePath": "coin.png" } },
    { "archetype": "enemy",
      "attributes": { "x": 420, "y": 228, "width": 16, "height": 16,
                      "imagePath": "crawler.png", "vx": -30, "health": 1 } }
  ]
}"#;

const MAZE_LEVEL: &str = r#"{
  "level": {
    "name": "maze",
    "dimension": { "width": 256.0, "height": 192.0 },
    "viewport": { "width": 256.0, "height": 192.0 },
    "collisions_enabled": true
  },
  "rules": "sandbox",
  "entities": [
    { "archetype": "player",
      "attributes": { "x": 16, "y": 176, "width": 12, "height": 12,
                      "imagePath": "ship.png", "health": 5, "speed": 60 } },
    { "archetype": "tile",
      "attributes": { "x": 112, "y": 80, "width": 32, "height": 32, "imagePath": "wall.png" } },
    { "archetype": "tile",
      "attributes": { "x": 112, "y": 112, "width": 32, "height": 32, "imagePath": "wall.png" } },
    { "archetype": "tile",
      "attributes": { "x": 144, "y": 112, "width": 32, "height": 32, "imagePath": "wall.png" } },
    { "archetype": "interceptor",
      "attributes": { "x": 240, "y": 16, "width": 12, "height": 12,
                      "imagePath": "hunter.png", "speed": 40, "tileSize": 32 } }
  ]
}"#;

/// Levels played when no level files are configured, in play order.
pub(crate) fn builtin_levels() -> Result<Vec<LevelFile>, LevelFileError> {
    [
        ("builtin:shooter", SHOOTER_LEVEL),
        ("builtin:platformer", PLATFORMER_LEVEL),
        ("builtin:maze", MAZE_LEVEL),
    ]
    .into_iter()
    .map(|(origin, raw)| parse_level_json(raw, Path::new(origin)))
    .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use arcade_core::{Session, TypeTag};
    use serde_json::json;
    use tempfile::TempDir;

    fn write_level(dir: &TempDir, name: &str, document: &Value) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).expect("create level file");
        file.write_all(document.to_string().as_bytes())
            .expect("write level file");
        path
    }

    fn arena_document() -> Value {
        json!({
            "level": {
                "name": "arena",
                "dimension": { "width": 200.0, "height": 100.0 },
                "viewport": { "width": 200.0, "height": 100.0 }
            },
            "entities": [
                {
                    "archetype": "player",
                    "attributes": {
                        "x": 20, "y": 80, "width": 10, "height": 10,
                        "imagePath": "p.png", "health": 2
                    }
                },
                {
                    "archetype": "enemy",
                    "attributes": {
                        "x": 150, "y": 20, "width": 10, "height": 10,
                        "imagePath": "e.png", "vx": 10
                    }
                }
            ]
        })
    }

    #[test]
    fn loads_and_instantiates_level_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_level(&dir, "arena.json", &arena_document());

        let file = load_level_file(&path).expect("load");
        assert_eq!(file.name(), "arena");
        assert_eq!(file.rules, RulesKind::ClearEnemies);
        assert!(file.level.collisions_enabled);

        let level = file
            .instantiate(&ArchetypeRegistry::default())
            .expect("instantiate");
        assert_eq!(level.entities().len(), 2);
        assert_eq!(level.count_live(TypeTag::Player), 1);
        assert_eq!(level.count_live(TypeTag::Enemy), 1);
        assert_eq!(level.rules().name(), "clear_enemies");
    }

    #[test]
    fn instantiate_yields_fresh_levels() {
        let file = parse_level_json(&arena_document().to_string(), Path::new("inline"))
            .expect("parse");
        let registry = ArchetypeRegistry::default();
        let mut first = file.instantiate(&registry).expect("first");
        let mut session = Session::new("tester");
        first.update(0.1, &mut session);

        let second = file.instantiate(&registry).expect("second");
        assert_eq!(second.tick_count(), 0);
        assert_eq!(first.tick_count(), 1);
    }

    #[test]
    fn missing_file_reports_read_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.json");
        let err = load_level_file(&path).expect_err("missing file");
        assert!(matches!(err, LevelFileError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn parse_error_names_failing_path() {
        let mut document = arena_document();
        document["entities"][1]["archetype"] = json!(7);
        let err = parse_level_json(&document.to_string(), Path::new("broken.json"))
            .expect_err("bad archetype type");
        match err {
            LevelFileError::Parse { location, .. } => {
                assert!(location.contains("entities[1]"), "location was {location}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let mut document = arena_document();
        document["levle"] = json!({});
        let err = parse_level_json(&document.to_string(), Path::new("typo.json"))
            .expect_err("unknown field");
        assert!(matches!(err, LevelFileError::Parse { .. }));
    }

    #[test]
    fn unknown_archetype_fails_instantiation() {
        let mut document = arena_document();
        document["entities"][0]["archetype"] = json!("dragon");
        let file =
            parse_level_json(&document.to_string(), Path::new("dragon.json")).expect("parse");
        let err = file
            .instantiate(&ArchetypeRegistry::default())
            .expect_err("unknown archetype");
        assert!(matches!(err, ConfigError::UnknownArchetype { .. }));
    }

    #[test]
    fn builtin_levels_parse_and_build() {
        let levels = builtin_levels().expect("builtin levels");
        let names: Vec<&str> = levels.iter().map(LevelFile::name).collect();
        assert_eq!(names, vec!["shooter", "platformer", "maze"]);

        let registry = ArchetypeRegistry::default();
        for file in &levels {
            let level = file.instantiate(&registry).expect("builtin level builds");
            assert_eq!(level.entities().len(), file.entities.len());
        }
        assert_eq!(levels[2].rules, RulesKind::Sandbox);
    }
}
