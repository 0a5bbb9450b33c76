use super::{AppConfig, RuntimeEnv};
use std::fmt;
use tracing::warn;

/// Startup validation errors for AppConfig
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingNtfyUrl,
    MissingNtfyTopic,
    MissingFrigateUrl,
    NoEntityIds,
    MissingSupervisorToken,
    EmptyMqttTopic,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingNtfyUrl => write!(f, "ntfy_url is required when ntfy_enabled is set"),
            ConfigError::MissingNtfyTopic => {
                write!(f, "ntfy_topic is required when ntfy_enabled is set")
            }
            ConfigError::MissingFrigateUrl => {
                write!(f, "frigate_url is required when a notification channel is enabled")
            }
            ConfigError::NoEntityIds => {
                write!(f, "ha_entity_ids must list at least one entity when ha_enabled is set")
            }
            ConfigError::MissingSupervisorToken => {
                write!(f, "SUPERVISOR_TOKEN must be set when ha_enabled is set")
            }
            ConfigError::EmptyMqttTopic => write!(f, "mqtt_topic must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validates a loaded configuration against the process environment.
///
/// Rules:
/// - mqtt_topic: non-empty
/// - ntfy enabled: ntfy_url and ntfy_topic present
/// - ha enabled: at least one entity id and a supervisor token
/// - any channel enabled: frigate_url present
///
/// Half-configured ntfy basic credentials only produce a warning; the token
/// (if any) is used instead.
pub fn validate(config: &AppConfig, env: &RuntimeEnv) -> Result<(), ConfigError> {
    if config.mqtt.mqtt_topic.trim().is_empty() {
        return Err(ConfigError::EmptyMqttTopic);
    }

    let ntfy = &config.ntfy;
    if ntfy.ntfy_enabled {
        if ntfy.ntfy_url.trim().is_empty() {
            return Err(ConfigError::MissingNtfyUrl);
        }
        if ntfy.ntfy_topic.trim().is_empty() {
            return Err(ConfigError::MissingNtfyTopic);
        }

        let has_user = ntfy.ntfy_user.as_deref().map_or(false, |s| !s.is_empty());
        let has_password = ntfy.ntfy_password.as_deref().map_or(false, |s| !s.is_empty());
        if has_user != has_password {
            warn!("ntfy_user and ntfy_password must both be set for basic auth, ignoring them");
        }
    }

    let ha = &config.home_assistant;
    if ha.ha_enabled {
        if ha.ha_entity_ids.is_empty() {
            return Err(ConfigError::NoEntityIds);
        }
        if env.supervisor_token.is_none() {
            return Err(ConfigError::MissingSupervisorToken);
        }
    }

    if (ntfy.ntfy_enabled || ha.ha_enabled) && config.frigate.frigate_url.trim().is_empty() {
        return Err(ConfigError::MissingFrigateUrl);
    }

    Ok(())
}
