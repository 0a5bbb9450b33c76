pub mod runtime;
mod validation;

pub use runtime::{RuntimeEnv, DEFAULT_CONFIG_PATH};
pub use validation::{validate, ConfigError};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::path::Path;

/// Complete frigate-notify configuration.
///
/// The on-disk document is the flat add-on options file (`mqtt_address`,
/// `ntfy_topic`, ...). Each section below picks its own keys out of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub mqtt: MqttConfig,
    #[serde(flatten)]
    pub frigate: FrigateConfig,
    #[serde(flatten)]
    pub ntfy: NtfyConfig,
    #[serde(flatten)]
    pub grouping: GroupingConfig,
    #[serde(flatten)]
    pub home_assistant: HomeAssistantConfig,
    #[serde(flatten)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub debug_logging: bool,
}

/// MQTT broker connection
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_address")]
    pub mqtt_address: String,
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,
    #[serde(default)]
    pub mqtt_username: Option<String>,
    #[serde(default)]
    pub mqtt_password: Option<String>,
    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,
    /// Generated per process when unset
    #[serde(default)]
    pub mqtt_client_id: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub mqtt_keep_alive_seconds: u64,
    /// Largest MQTT packet accepted or sent; Frigate events carry full object state
    #[serde(default = "default_max_packet_bytes")]
    pub mqtt_max_packet_bytes: usize,
}

fn default_mqtt_address() -> String {
    "mqtt://localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "frigate/events".to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_max_packet_bytes() -> usize {
    256 * 1024
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            mqtt_address: default_mqtt_address(),
            mqtt_port: default_mqtt_port(),
            mqtt_username: None,
            mqtt_password: None,
            mqtt_topic: default_mqtt_topic(),
            mqtt_client_id: None,
            mqtt_keep_alive_seconds: default_keep_alive(),
            mqtt_max_packet_bytes: default_max_packet_bytes(),
        }
    }
}

impl MqttConfig {
    /// Broker host and port.
    ///
    /// Accepts `mqtt://host`, `tcp://host`, or a bare host. A port embedded in
    /// the address takes precedence over `mqtt_port`.
    pub fn host_and_port(&self) -> (String, u16) {
        let address = self.mqtt_address.trim();
        let without_scheme = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(address);
        let authority = without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme);

        match authority.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (authority.to_string(), self.mqtt_port),
            },
            None => (authority.to_string(), self.mqtt_port),
        }
    }

    /// Username/password pair, ignoring empty strings.
    ///
    /// A username without a password is sent with an empty password.
    pub fn credentials(&self) -> Option<(String, String)> {
        let username = non_empty(&self.mqtt_username)?;
        let password = non_empty(&self.mqtt_password).unwrap_or_default();
        Some((username.to_string(), password.to_string()))
    }
}

/// Frigate link construction
#[derive(Debug, Clone, Deserialize)]
pub struct FrigateConfig {
    #[serde(default = "default_frigate_url")]
    pub frigate_url: String,
    /// Appended verbatim to snapshot links as `key=value` pairs, in document order
    #[serde(default, deserialize_with = "nullable")]
    pub snapshot_options: Map<String, Value>,
}

fn default_frigate_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for FrigateConfig {
    fn default() -> Self {
        Self {
            frigate_url: default_frigate_url(),
            snapshot_options: Map::new(),
        }
    }
}

/// ntfy push channel
#[derive(Debug, Clone, Deserialize)]
pub struct NtfyConfig {
    #[serde(default)]
    pub ntfy_enabled: bool,
    #[serde(default)]
    pub ntfy_url: String,
    #[serde(default)]
    pub ntfy_topic: String,
    #[serde(default)]
    pub ntfy_user: Option<String>,
    #[serde(default)]
    pub ntfy_password: Option<String>,
    #[serde(default)]
    pub ntfy_token: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub ntfy_tags: Vec<TagMapping>,
    #[serde(default = "default_normal_priority")]
    pub ntfy_normal_priority: Priority,
    #[serde(default = "default_lower_priority")]
    pub ntfy_lower_priority: Priority,
}

fn default_normal_priority() -> Priority {
    Priority::from("3")
}

fn default_lower_priority() -> Priority {
    Priority::from("2")
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            ntfy_enabled: false,
            ntfy_url: String::new(),
            ntfy_topic: String::new(),
            ntfy_user: None,
            ntfy_password: None,
            ntfy_token: None,
            ntfy_tags: Vec::new(),
            ntfy_normal_priority: default_normal_priority(),
            ntfy_lower_priority: default_lower_priority(),
        }
    }
}

impl NtfyConfig {
    /// Resolve the configured credentials into an Authorization scheme.
    ///
    /// Basic wins when both user and password are set, otherwise a token
    /// yields Bearer. Returns None when nothing usable is configured.
    pub fn auth(&self) -> Option<NtfyAuth> {
        match (non_empty(&self.ntfy_user), non_empty(&self.ntfy_password)) {
            (Some(user), Some(password)) => Some(NtfyAuth::Basic(
                BASE64.encode(format!("{}:{}", user, password)),
            )),
            _ => non_empty(&self.ntfy_token).map(|token| NtfyAuth::Bearer(token.to_string())),
        }
    }
}

/// Authorization scheme for the ntfy server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NtfyAuth {
    /// base64 of `user:password`
    Basic(String),
    Bearer(String),
}

impl NtfyAuth {
    pub fn header_value(&self) -> String {
        match self {
            NtfyAuth::Basic(encoded) => format!("Basic {}", encoded),
            NtfyAuth::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

/// Tags attached to ntfy messages for one object label
#[derive(Debug, Clone, Deserialize)]
pub struct TagMapping {
    pub object: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

/// ntfy priority, either numeric (`1`-`5`) or named (`"default"`, `"low"`).
///
/// Kept as the literal header value the ntfy server expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "PriorityValue")]
pub struct Priority(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityValue {
    Number(i64),
    Text(String),
}

impl From<PriorityValue> for Priority {
    fn from(value: PriorityValue) -> Self {
        match value {
            PriorityValue::Number(n) => Priority(n.to_string()),
            PriorityValue::Text(s) => Priority(s),
        }
    }
}

impl From<&str> for Priority {
    fn from(value: &str) -> Self {
        Priority(value.to_string())
    }
}

impl Priority {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Burst grouping
#[derive(Debug, Clone, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_grouping_enabled")]
    pub grouping_enabled: bool,
    /// Window length in whole minutes
    #[serde(default = "default_grouping_minutes")]
    pub grouping_minutes: u64,
}

fn default_grouping_enabled() -> bool {
    true
}

fn default_grouping_minutes() -> u64 {
    10
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            grouping_enabled: default_grouping_enabled(),
            grouping_minutes: default_grouping_minutes(),
        }
    }
}

/// Home Assistant notify channel
#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantConfig {
    #[serde(default)]
    pub ha_enabled: bool,
    /// `notify.*` service names, e.g. `mobile_app_pixel`
    #[serde(default, deserialize_with = "nullable")]
    pub ha_entity_ids: Vec<String>,
    #[serde(default = "default_ha_url")]
    pub ha_url: String,
}

fn default_ha_url() -> String {
    "http://supervisor/core".to_string()
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            ha_enabled: false,
            ha_entity_ids: Vec::new(),
            ha_url: default_ha_url(),
        }
    }
}

/// Suppression rules
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default, deserialize_with = "nullable")]
    pub disabled_cameras: Vec<DisabledCamera>,
    #[serde(default, deserialize_with = "nullable")]
    pub disabled_objects: Vec<String>,
}

/// A camera with suppressed objects. No objects means the whole camera is muted.
#[derive(Debug, Clone, Deserialize)]
pub struct DisabledCamera {
    pub camera_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub disabled_objects: Vec<String>,
}

/// Treat an explicit `null` like a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Load configuration from a JSON (add-on options) or TOML file.
///
/// The parser is chosen by extension; anything but `.toml` is read as JSON.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let is_toml = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML config '{}'", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON config '{}'", path.display()))?
    };

    Ok(config)
}
