use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const X_KEY: &str = "x";
pub const Y_KEY: &str = "y";
pub const WIDTH_KEY: &str = "width";
pub const HEIGHT_KEY: &str = "height";
pub const IMAGE_KEY: &str = "imagePath";

/// Parameter name to human-readable description, as shown by level editors.
pub type ParamDocs = BTreeMap<&'static str, &'static str>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required attribute `{key}`")]
    MissingKey { key: String },
    #[error("attribute `{key}` has malformed value `{value}` (expected {expected})")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("malformed attribute pair `{pair}` (expected key=value)")]
    MalformedPair { pair: String },
    #[error("unknown archetype `{name}`")]
    UnknownArchetype { name: String },
}

/// Flat attribute map handed over by an external level loader.
///
/// Keys the consuming archetype does not know are kept but ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityConfig {
    attributes: BTreeMap<String, String>,
}

impl EntityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            attributes: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Parses a `key=value,key=value` configuration string.
    pub fn parse(config_string: &str) -> Result<Self, ConfigError> {
        let mut attributes = BTreeMap::new();
        for pair in config_string.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError::MalformedPair {
                    pair: pair.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::MalformedPair {
                    pair: pair.to_string(),
                });
            }
            attributes.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { attributes })
    }

    /// Builds a config from a JSON object whose values are scalars.
    /// Numbers and booleans are stringified; nested values are rejected.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(object) = value else {
            return Err(ConfigError::Malformed {
                key: "<root>".to_string(),
                value: value.to_string(),
                expected: "a JSON object of attributes",
            });
        };
        let mut attributes = BTreeMap::new();
        for (key, value) in object {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(ConfigError::Malformed {
                        key: key.clone(),
                        value: value.to_string(),
                        expected: "a string, number or boolean",
                    })
                }
            };
            attributes.insert(key.clone(), text);
        }
        Ok(Self { attributes })
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.attributes.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    pub fn require_f32(&self, key: &str) -> Result<f32, ConfigError> {
        let raw = self.require(key)?;
        parse_value(key, raw, "a finite number").and_then(|value: f32| finite(key, raw, value))
    }

    pub fn optional_f32(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        match self.get(key) {
            Some(raw) => {
                parse_value(key, raw, "a finite number").and_then(|value| finite(key, raw, value))
            }
            None => Ok(default),
        }
    }

    pub fn require_i32(&self, key: &str) -> Result<i32, ConfigError> {
        let raw = self.require(key)?;
        parse_value(key, raw, "an integer")
    }

    pub fn optional_i32(&self, key: &str, default: i32) -> Result<i32, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_value(key, raw, "an integer"),
            None => Ok(default),
        }
    }

    pub fn optional_u32(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_value(key, raw, "a non-negative integer"),
            None => Ok(default),
        }
    }

    pub fn optional_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(raw) => parse_value(key, raw, "true or false"),
            None => Ok(default),
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str, expected: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Malformed {
        key: key.to_string(),
        value: raw.to_string(),
        expected,
    })
}

fn finite(key: &str, raw: &str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::Malformed {
            key: key.to_string(),
            value: raw.to_string(),
            expected: "a finite number",
        })
    }
}

/// Parameters every archetype requires.
pub fn base_param_docs() -> ParamDocs {
    let mut params = ParamDocs::new();
    params.insert(X_KEY, "x position of the object's center");
    params.insert(Y_KEY, "y position of the object's center");
    params.insert(WIDTH_KEY, "width of the object");
    params.insert(HEIGHT_KEY, "height of the object");
    params.insert(IMAGE_KEY, "name of the image used as the default image");
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_reads_comma_separated_pairs() {
        let config = EntityConfig::parse("x=10, y=20,width=5,height=5,imagePath=hero.png")
            .expect("config");
        assert_eq!(config.len(), 5);
        assert_eq!(config.get("y"), Some("20"));
        assert_eq!(config.require_f32(X_KEY).expect("x"), 10.0);
        assert_eq!(config.get(IMAGE_KEY), Some("hero.png"));
    }

    #[test]
    fn parse_rejects_pair_without_separator() {
        let err = EntityConfig::parse("x=1,oops").expect_err("err");
        assert_eq!(
            err,
            ConfigError::MalformedPair {
                pair: "oops".to_string()
            }
        );
    }

    #[test]
    fn missing_required_key_is_reported_by_name() {
        let config = EntityConfig::new().with(X_KEY, 1.0);
        let err = config.require_f32(Y_KEY).expect_err("err");
        assert_eq!(
            err,
            ConfigError::MissingKey {
                key: "y".to_string()
            }
        );
    }

    #[test]
    fn malformed_number_is_not_defaulted() {
        let config = EntityConfig::new().with("speed", "fast");
        assert!(matches!(
            config.optional_f32("speed", 3.0),
            Err(ConfigError::Malformed { .. })
        ));
        assert_eq!(config.optional_f32("absent", 3.0).expect("default"), 3.0);
    }

    #[test]
    fn non_finite_number_is_malformed() {
        let config = EntityConfig::new().with(X_KEY, "NaN");
        assert!(matches!(
            config.require_f32(X_KEY),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn from_json_stringifies_scalars_and_rejects_nesting() {
        let config = EntityConfig::from_json(&json!({
            "x": 12.5,
            "imagePath": "alien.png",
            "auto": true
        }))
        .expect("config");
        assert_eq!(config.require_f32(X_KEY).expect("x"), 12.5);
        assert!(config.optional_bool("auto", false).expect("bool"));

        let err = EntityConfig::from_json(&json!({ "x": [1, 2] })).expect_err("err");
        assert!(matches!(err, ConfigError::Malformed { key, .. } if key == "x"));
    }

    #[test]
    fn deserializes_as_plain_string_map() {
        let config: EntityConfig =
            serde_json::from_value(json!({ "x": "1", "y": "2" })).expect("config");
        assert_eq!(config.get("x"), Some("1"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn base_param_docs_cover_required_keys() {
        let docs = base_param_docs();
        for key in [X_KEY, Y_KEY, WIDTH_KEY, HEIGHT_KEY, IMAGE_KEY] {
            assert!(docs.contains_key(key), "missing doc for {key}");
        }
    }
}
