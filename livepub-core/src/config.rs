//! Merged publisher configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PublishError, PublishResult};

/// Configuration key the outgoing stream name is written to
pub const STREAM_NAME_KEY: &str = "streamName";

/// Flat key/value configuration handed to [`crate::Publisher::init`].
///
/// Built by layering sources on top of each other; a key set by a later layer
/// replaces the value of an earlier one and every other key is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishConfig {
    entries: Map<String, Value>,
}

impl PublishConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge layers in order, rightmost wins
    pub fn merge<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let mut config = Self::new();
        for layer in layers {
            config.apply(layer);
        }
        config
    }

    /// Overlay a single layer on top of the current entries
    pub fn apply(&mut self, layer: Map<String, Value>) {
        self.entries.extend(layer);
    }

    /// Turn any serializable value into a merge layer.
    ///
    /// Only JSON objects qualify; `null` becomes an empty layer.
    pub fn layer<T: Serialize>(value: &T) -> PublishResult<Map<String, Value>> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(PublishError::InvalidLayer {
                found: json_type_name(&other).to_string(),
            }),
        }
    }

    /// Get a raw value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Get an unsigned integer value
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.entries.get(key).and_then(Value::as_u64)
    }

    /// Get a boolean value
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.entries.get(key).and_then(Value::as_bool)
    }

    /// Set a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Outgoing stream name, once derived
    pub fn stream_name(&self) -> Option<&str> {
        self.get_str(STREAM_NAME_KEY)
    }

    /// Copy the string at `source_key` into `streamName`.
    ///
    /// Fails with [`PublishError::MissingConfiguration`] naming `source_key`
    /// when it is absent or not a non-empty string.
    pub fn derive_stream_name(&mut self, source_key: &str) -> PublishResult<&str> {
        let name = match self.get_str(source_key) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(PublishError::MissingConfiguration {
                    field: source_key.to_string(),
                })
            }
        };
        self.insert(STREAM_NAME_KEY, Value::String(name));
        Ok(self.stream_name().unwrap_or_default())
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Pretty JSON rendering for log lines
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.entries).unwrap_or_default()
    }
}

impl From<Map<String, Value>> for PublishConfig {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use serde_json::json;

    fn layer(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("layer must be an object"),
        }
    }

    #[test]
    fn test_rightmost_layer_wins() {
        let config = PublishConfig::merge([
            layer(json!({"protocol": "http", "port": 5080, "stream1": "a"})),
            layer(json!({"protocol": "ws", "port": 8081})),
            layer(json!({"port": 9000})),
        ]);

        assert_eq!(config.get_str("protocol"), Some("ws"));
        assert_eq!(config.get_u64("port"), Some(9000));
        assert_eq!(config.get_str("stream1"), Some("a"));
        assert_eq!(config.len(), 3);
    }

    #[test]
    fn test_derive_stream_name() {
        let mut config = PublishConfig::from(layer(json!({"stream1": "stream1"})));
        assert_eq!(config.derive_stream_name("stream1").unwrap(), "stream1");
        assert_eq!(config.stream_name(), Some("stream1"));
    }

    #[test]
    fn test_derive_stream_name_missing() {
        let mut config = PublishConfig::new();
        let err = config.derive_stream_name("stream1").unwrap_err();
        assert!(matches!(err, PublishError::MissingConfiguration { ref field } if field == "stream1"));
        assert!(!config.contains_key(STREAM_NAME_KEY));
    }

    #[test]
    fn test_layer_from_serializable() {
        #[derive(Serialize)]
        struct Defaults {
            app: &'static str,
        }
        let map = PublishConfig::layer(&Defaults { app: "live" }).unwrap();
        assert_eq!(map.get("app"), Some(&json!("live")));

        assert!(PublishConfig::layer(&Value::Null).unwrap().is_empty());
        let err = PublishConfig::layer(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, PublishError::InvalidLayer { ref found } if found == "array"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
