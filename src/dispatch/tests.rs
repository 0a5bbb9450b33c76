use super::*;
use crate::config::DisabledCamera;
use crate::notify::{Channel, RequestBody};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, TimeZone};
use std::sync::Mutex;

/// Records every request; fails those whose url contains `fail_on`.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<NotificationRequest>>,
    fail_on: Option<String>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, request: &NotificationRequest) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(request.clone());
        match &self.fail_on {
            Some(pattern) if request.url.contains(pattern.as_str()) => {
                Err(anyhow!("simulated failure"))
            }
            _ => Ok(()),
        }
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn driveway_person() -> DetectionEvent {
    DetectionEvent {
        camera: "Driveway".to_string(),
        label: "person".to_string(),
        had_snapshot_before: false,
        has_snapshot_now: true,
        id: "abc".to_string(),
    }
}

fn ntfy_only_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.frigate.frigate_url = "http://frigate:5000".to_string();
    config.ntfy.ntfy_enabled = true;
    config.ntfy.ntfy_url = "https://ntfy.example".to_string();
    config.ntfy.ntfy_topic = "home".to_string();
    config.grouping.grouping_enabled = false;
    config
}

fn ha_env() -> RuntimeEnv {
    RuntimeEnv {
        supervisor_token: Some("sv".to_string()),
        ..RuntimeEnv::default()
    }
}

fn dispatcher(config: &AppConfig, sender: Arc<RecordingSender>) -> Dispatcher {
    Dispatcher::from_config(config, &ha_env(), sender)
}

#[test]
fn test_single_ntfy_post_for_qualifying_event() {
    let dispatcher = dispatcher(&ntfy_only_config(), Arc::new(RecordingSender::default()));
    let requests = dispatcher.plan(&driveway_person(), t0());

    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.channel, Channel::Ntfy);
    assert_eq!(request.url, "https://ntfy.example/home");
    assert_eq!(request.header("Title"), Some("Person"));
    assert_eq!(request.body, RequestBody::Text("Driveway".to_string()));
}

#[test]
fn test_disabled_camera_sends_nothing() {
    let mut config = ntfy_only_config();
    config.filters.disabled_cameras = vec![DisabledCamera {
        camera_name: "driveway".to_string(),
        disabled_objects: vec![],
    }];

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    assert!(dispatcher.plan(&driveway_person(), t0()).is_empty());
}

#[test]
fn test_globally_disabled_object_sends_nothing() {
    let mut config = ntfy_only_config();
    config.filters.disabled_objects = vec!["Person".to_string()];

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    assert!(dispatcher.plan(&driveway_person(), t0()).is_empty());
}

#[test]
fn test_snapshot_transition_required() {
    let dispatcher = dispatcher(&ntfy_only_config(), Arc::new(RecordingSender::default()));

    let mut already = driveway_person();
    already.had_snapshot_before = true;
    assert!(dispatcher.plan(&already, t0()).is_empty());

    let mut none_yet = driveway_person();
    none_yet.has_snapshot_now = false;
    assert!(dispatcher.plan(&none_yet, t0()).is_empty());
}

#[test]
fn test_home_assistant_one_post_per_entity() {
    let mut config = ntfy_only_config();
    config.ntfy.ntfy_enabled = false;
    config.home_assistant.ha_enabled = true;
    config.home_assistant.ha_entity_ids =
        vec!["mobile_app_a".to_string(), "mobile_app_b".to_string()];

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    let requests = dispatcher.plan(&driveway_person(), t0());

    assert_eq!(requests.len(), 2);
    assert!(requests[0].url.ends_with("/notify/mobile_app_a"));
    assert!(requests[1].url.ends_with("/notify/mobile_app_b"));
    assert_eq!(requests[0].body, requests[1].body);
}

#[test]
fn test_both_channels_ntfy_first() {
    let mut config = ntfy_only_config();
    config.home_assistant.ha_enabled = true;
    config.home_assistant.ha_entity_ids = vec!["mobile_app_a".to_string()];

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    let requests = dispatcher.plan(&driveway_person(), t0());

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].channel, Channel::Ntfy);
    assert_eq!(
        requests[1].channel,
        Channel::HomeAssistant {
            entity_id: "mobile_app_a".to_string()
        }
    );
}

#[test]
fn test_grouping_lowers_priority_inside_window() {
    let mut config = ntfy_only_config();
    config.grouping.grouping_enabled = true;
    config.grouping.grouping_minutes = 5;
    config.ntfy.ntfy_normal_priority = "default".into();
    config.ntfy.ntfy_lower_priority = "min".into();

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    let event = driveway_person();

    let first = dispatcher.plan(&event, t0());
    assert_eq!(first[0].header("Priority"), Some("default"));
    assert_eq!(dispatcher.grouping_state().anchor(), Some(t0()));

    let second = dispatcher.plan(&event, t0() + Duration::minutes(2));
    assert_eq!(second[0].header("Priority"), Some("min"));

    let third = dispatcher.plan(&event, t0() + Duration::minutes(5));
    assert_eq!(third[0].header("Priority"), Some("default"));
    assert_eq!(
        dispatcher.grouping_state().anchor(),
        Some(t0() + Duration::minutes(5))
    );
}

#[test]
fn test_suppressed_event_leaves_grouping_state() {
    let mut config = ntfy_only_config();
    config.grouping.grouping_enabled = true;
    config.filters.disabled_objects = vec!["person".to_string()];

    let dispatcher = dispatcher(&config, Arc::new(RecordingSender::default()));
    assert!(dispatcher.plan(&driveway_person(), t0()).is_empty());
    assert_eq!(dispatcher.grouping_state().anchor(), None);
}

#[tokio::test]
async fn test_handle_sends_every_planned_request() {
    let mut config = ntfy_only_config();
    config.home_assistant.ha_enabled = true;
    config.home_assistant.ha_entity_ids =
        vec!["mobile_app_a".to_string(), "mobile_app_b".to_string()];

    let sender = Arc::new(RecordingSender::default());
    let dispatcher = dispatcher(&config, Arc::clone(&sender));

    for task in dispatcher.handle(&driveway_person()) {
        task.await.unwrap();
    }

    assert_eq!(sender.sent().len(), 3);
}

#[tokio::test]
async fn test_failed_send_does_not_block_others() {
    let mut config = ntfy_only_config();
    config.ntfy.ntfy_enabled = false;
    config.home_assistant.ha_enabled = true;
    config.home_assistant.ha_entity_ids =
        vec!["mobile_app_a".to_string(), "mobile_app_b".to_string()];

    let sender = Arc::new(RecordingSender {
        sent: Mutex::new(Vec::new()),
        fail_on: Some("mobile_app_a".to_string()),
    });
    let dispatcher = dispatcher(&config, Arc::clone(&sender));

    let tasks = dispatcher.handle(&driveway_person());
    assert_eq!(tasks.len(), 2);
    for task in tasks {
        // Failures are logged inside the task, never surfaced as panics
        assert!(task.await.is_ok());
    }
    assert_eq!(sender.sent().len(), 2);

    // Next event still goes out
    let tasks = dispatcher.handle(&driveway_person());
    assert_eq!(tasks.len(), 2);
}
