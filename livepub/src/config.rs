//! Configuration source, session variants and defaults

use livepub_core::{LogLevel, PublishConfig, PublishError, PublishResult};
use livepub_media::{MediaConstraintState, MediaConstraints, TrackConstraint};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Storage key of the test-bed settings blob
pub const TESTBED_KEY: &str = "r5proTestBed";
/// Storage key of the server settings blob
pub const SERVER_SETTINGS_KEY: &str = "r5proServerSettings";
/// Default render target of the preview view
pub const DEFAULT_ELEMENT_ID: &str = "red5pro-publisher-video";
/// Configuration field the outgoing stream name is read from
pub const STREAM_NAME_SOURCE: &str = "stream1";
/// Application scope on the server
pub const DEFAULT_APP: &str = "live";

/// Key-value store the host persisted its settings in
pub trait SessionStore {
    /// Raw value stored under `key`
    fn get_item(&self, key: &str) -> Option<String>;
}

impl SessionStore for HashMap<String, String> {
    fn get_item(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// In-memory [`SessionStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value
    pub fn set_item(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Builder-style [`MemoryStore::set_item`]
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.set_item(key, value);
        self
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Read a setting as `T`, falling back to `T::default()` on a type mismatch
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Ignoring setting {}: {}", value, e);
            Ok(T::default())
        }
    }
}

/// Read a flag the way the host page tests it: `0`, `""` and `null` are off
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Media settings nested under `userMedia`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserMediaSettings {
    /// Audio constraint used when audio is enabled
    pub audio: Option<Value>,
    /// Video constraint used when video is enabled
    pub video: Option<Value>,
}

/// General test-bed options.
///
/// The typed fields are a view over the raw entry, which is kept whole and
/// forms the first configuration layer. A field of the wrong type reads as
/// unset without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestbedSettings {
    /// Raise provider and local log verbosity
    #[serde(default, deserialize_with = "truthy")]
    pub verbose_logging: bool,
    /// Base audio constraint
    pub audio: Option<Value>,
    /// Base video constraint
    pub video: Option<Value>,
    /// Publish audio
    #[serde(default, deserialize_with = "truthy")]
    pub use_audio: bool,
    /// Publish video
    #[serde(default, deserialize_with = "truthy")]
    pub use_video: bool,
    /// Constraints applied when audio/video are enabled
    #[serde(default, deserialize_with = "lenient")]
    pub user_media: UserMediaSettings,
    /// Requested frame rate, passed through as configured
    pub frame_rate: Option<Value>,
    /// Name of the stream to publish
    #[serde(default, deserialize_with = "lenient")]
    pub stream1: Option<String>,
    #[serde(skip)]
    raw: Map<String, Value>,
}

impl TestbedSettings {
    /// Build from a parsed storage entry
    pub fn from_map(raw: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_value(Value::Object(raw.clone()))?;
        settings.raw = raw;
        Ok(settings)
    }

    /// Every stored key, including ones without a typed field
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Server connection settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServerSettings {
    /// Server host
    #[serde(default, deserialize_with = "lenient")]
    pub host: Option<String>,
    /// Page protocol, `https` selects secure sockets
    #[serde(default, deserialize_with = "lenient")]
    pub protocol: Option<String>,
    /// Insecure websocket port
    #[serde(default, deserialize_with = "lenient")]
    pub wsport: Option<u16>,
    /// Secure websocket port
    #[serde(default, deserialize_with = "lenient")]
    pub wssport: Option<u16>,
}

impl ServerSettings {
    /// Build from a parsed storage entry
    pub fn from_map(raw: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(raw))
    }

    /// Whether the server is reached over TLS
    pub fn is_secure(&self) -> bool {
        self.protocol.as_deref() == Some("https")
    }

    /// Websocket scheme and port matching the page protocol
    pub fn socket_location(&self) -> (&'static str, Option<u16>) {
        if self.is_secure() {
            ("wss", self.wssport)
        } else {
            ("ws", self.wsport)
        }
    }
}

/// Parse one storage entry into a JSON object.
///
/// A missing entry or a JSON `null` is an empty object; anything else that is
/// not an object is an error.
pub fn parse_entry(key: &str, text: Option<&str>) -> PublishResult<Map<String, Value>> {
    let Some(text) = text else {
        return Ok(Map::new());
    };
    let value: Value = serde_json::from_str(text).map_err(|e| PublishError::Configuration {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(PublishError::Configuration {
            key: key.to_string(),
            reason: "expected a JSON object".to_string(),
        }),
    }
}

fn read_settings<T: Default>(
    key: &str,
    text: Option<&str>,
    build: impl FnOnce(Map<String, Value>) -> Result<T, serde_json::Error>,
) -> T {
    let parsed = parse_entry(key, text).and_then(|map| {
        build(map).map_err(|e| PublishError::Configuration {
            key: key.to_string(),
            reason: e.to_string(),
        })
    });
    match parsed {
        Ok(settings) => settings,
        Err(err) => {
            warn!("{}", err);
            T::default()
        }
    }
}

/// Settings read once from the host's session storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSource {
    testbed: TestbedSettings,
    server: ServerSettings,
}

impl ConfigurationSource {
    /// Read both entries from a store
    pub fn load(store: &dyn SessionStore) -> Self {
        Self::from_entries(
            store.get_item(TESTBED_KEY).as_deref(),
            store.get_item(SERVER_SETTINGS_KEY).as_deref(),
        )
    }

    /// Parse both raw entries; unreadable entries fall back to empty settings
    pub fn from_entries(testbed: Option<&str>, server: Option<&str>) -> Self {
        let source = Self {
            testbed: read_settings(TESTBED_KEY, testbed, TestbedSettings::from_map),
            server: read_settings(SERVER_SETTINGS_KEY, server, ServerSettings::from_map),
        };
        debug!(
            "Loaded configuration: {} test-bed key(s), secure server: {}",
            source.testbed.as_map().len(),
            source.server.is_secure()
        );
        source
    }

    /// Create from already typed settings
    pub fn new(testbed: TestbedSettings, server: ServerSettings) -> Self {
        Self { testbed, server }
    }

    /// Test-bed settings
    pub fn testbed(&self) -> &TestbedSettings {
        &self.testbed
    }

    /// Server settings
    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    /// Log level requested by the test-bed settings
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_verbose(self.testbed.verbose_logging)
    }
}

/// Connection options layered over the test-bed settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDefaults {
    /// Websocket scheme
    pub protocol: String,
    /// Websocket port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Application scope
    pub app: String,
    /// Transport type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<String>,
    /// Server-side handling of the stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_mode: Option<String>,
}

/// The two publisher pages this library reproduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionVariant {
    /// Live publish with a front/rear camera toggle
    CameraSwap,
    /// Recorded publish with bitrate statistics
    Record,
}

impl SessionVariant {
    /// Connection defaults for this variant
    pub fn connection_defaults(&self, server: &ServerSettings) -> ConnectionDefaults {
        match self {
            SessionVariant::CameraSwap => ConnectionDefaults {
                protocol: "ws".to_string(),
                port: Some(8081),
                app: DEFAULT_APP.to_string(),
                stream_type: Some("webrtc".to_string()),
                stream_mode: None,
            },
            SessionVariant::Record => {
                let (protocol, port) = server.socket_location();
                ConnectionDefaults {
                    protocol: protocol.to_string(),
                    port,
                    app: DEFAULT_APP.to_string(),
                    stream_type: None,
                    stream_mode: Some("record".to_string()),
                }
            }
        }
    }

    /// User-media constraints for this variant
    pub fn user_media(
        &self,
        testbed: &TestbedSettings,
        state: &MediaConstraintState,
    ) -> MediaConstraints {
        match self {
            SessionVariant::CameraSwap => {
                let base = MediaConstraints {
                    audio: testbed.audio.as_ref().and_then(TrackConstraint::from_value),
                    video: testbed.video.as_ref().and_then(TrackConstraint::from_value),
                    frame_rate: None,
                };
                base.overlay(MediaConstraints::new().with_video(state.video_constraint()))
            }
            SessionVariant::Record => MediaConstraints {
                audio: enabled_constraint(testbed.use_audio, testbed.user_media.audio.as_ref()),
                video: enabled_constraint(testbed.use_video, testbed.user_media.video.as_ref()),
                frame_rate: testbed.frame_rate.clone(),
            },
        }
    }

    /// Merge test-bed settings, connection defaults and user media, in that
    /// order
    pub fn publish_config(
        &self,
        source: &ConfigurationSource,
        state: &MediaConstraintState,
    ) -> PublishResult<PublishConfig> {
        Ok(PublishConfig::merge([
            source.testbed().as_map().clone(),
            PublishConfig::layer(&self.connection_defaults(source.server()))?,
            PublishConfig::layer(&self.user_media(source.testbed(), state))?,
        ]))
    }

    /// Bitrate statistics are sampled after publish
    pub fn tracks_bitrate(&self) -> bool {
        matches!(self, SessionVariant::Record)
    }

    /// The camera can be swapped by the user
    pub fn supports_camera_swap(&self) -> bool {
        matches!(self, SessionVariant::CameraSwap)
    }

    /// The view is bound to the publisher during preview rather than publish
    pub fn attaches_view_on_preview(&self) -> bool {
        matches!(self, SessionVariant::Record)
    }
}

fn enabled_constraint(enabled: bool, configured: Option<&Value>) -> Option<TrackConstraint> {
    if enabled {
        configured.and_then(TrackConstraint::from_value)
    } else {
        Some(TrackConstraint::Enabled(false))
    }
}
