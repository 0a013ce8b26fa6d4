//! Policy configuration: a nested key/value structure stored on the hub as
//! pretty-printed JSON text.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PolicyHubError, Result};

/// Nested configuration of a trained policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyConfig(Map<String, Value>);

impl PolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; the top level must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(PolicyConfig(map)),
            other => Err(PolicyHubError::InvalidConfig(format!(
                "policy config must be a mapping, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a dotted path such as `exp_config.policy.cuda`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Serialize to the text stored on the hub.
    pub fn to_text(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.0)?;
        text.push('\n');
        Ok(text)
    }

    /// Inverse of [`PolicyConfig::to_text`].
    pub fn from_text(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write the configuration text to `path`, returning it as well.
pub fn save_config(config: &PolicyConfig, path: &Path) -> Result<String> {
    let text = config.to_text()?;
    std::fs::write(path, &text)?;
    Ok(text)
}

/// Read a configuration written by [`save_config`].
pub fn load_config(path: &Path) -> Result<PolicyConfig> {
    let text = std::fs::read_to_string(path)?;
    PolicyConfig::from_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PolicyConfig {
        PolicyConfig::from_value(json!({
            "exp_config": {
                "env": { "env_id": "LunarLander-v2", "n_evaluator_episode": 4 },
                "policy": {
                    "cuda": false,
                    "learning_rate": 3e-4,
                    "hidden_sizes": [64, 64, 128],
                    "discount_factor": 0.99,
                    "clip_ratio": null
                },
                "seed": 0
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_text_roundtrip() {
        let config = sample();
        let text = config.to_text().unwrap();
        assert_eq!(PolicyConfig::from_text(&text).unwrap(), config);
    }

    #[test]
    fn test_get_path() {
        let config = sample();
        assert_eq!(
            config.get_path("exp_config.env.env_id"),
            Some(&json!("LunarLander-v2"))
        );
        assert_eq!(config.get_path("exp_config.policy.learning_rate"), Some(&json!(3e-4)));
        assert_eq!(config.get_path("exp_config.missing"), None);
        assert_eq!(config.get_path("exp_config.seed.deeper"), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(PolicyConfig::from_value(json!([1, 2, 3])).is_err());
        assert!(PolicyConfig::from_text("42").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy_config.json");
        let text = save_config(&sample(), &path).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(load_config(&path).unwrap(), sample());
    }
}
