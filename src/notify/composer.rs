use super::{Channel, NotificationRequest, RequestBody};
use crate::config::{AppConfig, NtfyAuth, Priority, RuntimeEnv};
use crate::event::DetectionEvent;
use crate::policy::PriorityLevel;
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Upper-case the first character, leaving the rest unchanged.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Render snapshot options as a query string, `?` included.
///
/// Values are used verbatim; strings lose their JSON quotes.
fn snapshot_query(options: &Map<String, Value>) -> String {
    if options.is_empty() {
        return String::new();
    }

    let pairs: Vec<String> = options
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect();

    format!("?{}", pairs.join("&"))
}

/// ntfy destination and message metadata
#[derive(Debug, Clone)]
struct NtfyTarget {
    url: String,
    auth: Option<NtfyAuth>,
    /// Keyed by lowercased object label
    tags: HashMap<String, Vec<String>>,
    normal_priority: Priority,
    lower_priority: Priority,
}

#[derive(Debug, Clone)]
struct HomeAssistantTarget {
    base_url: String,
    entity_ids: Vec<String>,
    token: String,
}

/// Builds channel-specific requests for a detection.
///
/// Channels that are disabled in config are absent here, so composing for
/// them yields nothing.
#[derive(Debug, Clone)]
pub struct Composer {
    frigate_url: String,
    snapshot_query: String,
    ntfy: Option<NtfyTarget>,
    home_assistant: Option<HomeAssistantTarget>,
}

impl Composer {
    pub fn from_config(config: &AppConfig, env: &RuntimeEnv) -> Self {
        let ntfy = config.ntfy.ntfy_enabled.then(|| NtfyTarget {
            url: format!(
                "{}/{}",
                config.ntfy.ntfy_url.trim_end_matches('/'),
                config.ntfy.ntfy_topic
            ),
            auth: config.ntfy.auth(),
            tags: config
                .ntfy
                .ntfy_tags
                .iter()
                .map(|mapping| (mapping.object.to_lowercase(), mapping.tags.clone()))
                .collect(),
            normal_priority: config.ntfy.ntfy_normal_priority.clone(),
            lower_priority: config.ntfy.ntfy_lower_priority.clone(),
        });

        let ha = &config.home_assistant;
        let home_assistant = ha.ha_enabled.then(|| HomeAssistantTarget {
            base_url: ha.ha_url.trim_end_matches('/').to_string(),
            entity_ids: ha.ha_entity_ids.clone(),
            token: env.supervisor_token.clone().unwrap_or_default(),
        });

        Self {
            frigate_url: config.frigate.frigate_url.trim_end_matches('/').to_string(),
            snapshot_query: snapshot_query(&config.frigate.snapshot_options),
            ntfy,
            home_assistant,
        }
    }

    /// Snapshot image for a Frigate event, with snapshot options applied
    pub fn snapshot_url(&self, id: &str) -> String {
        format!(
            "{}/api/events/{}/snapshot.jpg{}",
            self.frigate_url, id, self.snapshot_query
        )
    }

    pub fn clip_url(&self, id: &str) -> String {
        format!("{}/api/events/{}/clip.mp4", self.frigate_url, id)
    }

    /// All requests for an event: ntfy first, then one per Home Assistant entity.
    pub fn compose(&self, event: &DetectionEvent, priority: PriorityLevel) -> Vec<NotificationRequest> {
        let mut requests = Vec::new();
        if let Some(request) = self.ntfy_request(&event.camera, &event.label, &event.id, priority) {
            requests.push(request);
        }
        requests.extend(self.home_assistant_requests(&event.camera, &event.label, &event.id));
        requests
    }

    /// `POST {ntfy_url}/{topic}` with the message in headers and the camera as body.
    pub fn ntfy_request(
        &self,
        camera: &str,
        label: &str,
        id: &str,
        priority: PriorityLevel,
    ) -> Option<NotificationRequest> {
        let target = self.ntfy.as_ref()?;

        let priority = match priority {
            PriorityLevel::Normal => &target.normal_priority,
            PriorityLevel::Lowered => &target.lower_priority,
        };

        let mut headers = vec![
            ("Title".to_string(), capitalize(label)),
            ("Attach".to_string(), self.snapshot_url(id)),
            ("Click".to_string(), self.clip_url(id)),
        ];
        if let Some(tags) = target.tags.get(&label.to_lowercase()) {
            if !tags.is_empty() {
                headers.push(("Tags".to_string(), tags.join(",")));
            }
        }
        headers.push(("Priority".to_string(), priority.to_string()));
        if let Some(auth) = &target.auth {
            headers.push(("Authorization".to_string(), auth.header_value()));
        }

        Some(NotificationRequest {
            channel: Channel::Ntfy,
            method: Method::POST,
            url: target.url.clone(),
            headers,
            body: RequestBody::Text(capitalize(camera)),
        })
    }

    /// One `notify` service call per configured entity id.
    pub fn home_assistant_requests(&self, camera: &str, label: &str, id: &str) -> Vec<NotificationRequest> {
        let Some(target) = self.home_assistant.as_ref() else {
            return Vec::new();
        };

        let body = json!({
            "title": capitalize(label),
            "message": capitalize(camera),
            "data": {
                "image": self.snapshot_url(id),
                "clickAction": self.clip_url(id),
            }
        });

        target
            .entity_ids
            .iter()
            .map(|entity_id| NotificationRequest {
                channel: Channel::HomeAssistant {
                    entity_id: entity_id.clone(),
                },
                method: Method::POST,
                url: format!("{}/api/services/notify/{}", target.base_url, entity_id),
                headers: vec![(
                    "Authorization".to_string(),
                    format!("Bearer {}", target.token),
                )],
                body: RequestBody::Json(body.clone()),
            })
            .collect()
    }
}
