use crate::config::{AppConfig, RuntimeEnv};
use crate::event::DetectionEvent;
use crate::notify::{Composer, NotificationRequest, NotificationSender};
use crate::policy::{GroupingPolicy, GroupingState, SuppressionPolicy};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[cfg(test)]
mod tests;

/// Turns detection events into outbound notifications.
///
/// Events are expected one at a time; the only state carried between them
/// is the grouping anchor.
pub struct Dispatcher {
    suppression: SuppressionPolicy,
    grouping: GroupingPolicy,
    composer: Composer,
    sender: Arc<dyn NotificationSender>,
}

impl Dispatcher {
    pub fn new(
        suppression: SuppressionPolicy,
        grouping: GroupingPolicy,
        composer: Composer,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            suppression,
            grouping,
            composer,
            sender,
        }
    }

    /// Build every policy from config, with a fresh grouping anchor.
    pub fn from_config(
        config: &AppConfig,
        env: &RuntimeEnv,
        sender: Arc<dyn NotificationSender>,
    ) -> Self {
        Self::new(
            SuppressionPolicy::from_config(&config.filters),
            GroupingPolicy::new(&config.grouping, GroupingState::new()),
            Composer::from_config(config, env),
            sender,
        )
    }

    pub fn grouping_state(&self) -> &GroupingState {
        self.grouping.state()
    }

    /// Decide what to send for `event` at `now`, without sending it.
    ///
    /// Order: snapshot transition check, suppression, grouping priority,
    /// then ntfy followed by one request per Home Assistant entity.
    /// Returns an empty list when nothing fires. May advance the grouping anchor.
    pub fn plan(&self, event: &DetectionEvent, now: DateTime<Utc>) -> Vec<NotificationRequest> {
        debug!(
            camera = %event.camera,
            label = %event.label,
            event_id = %event.id,
            "Event received"
        );

        if !event.is_notification_worthy() {
            return Vec::new();
        }

        if let Some(reason) = self.suppression.suppression_reason(&event.camera, &event.label) {
            debug!(
                camera = %event.camera,
                label = %event.label,
                reason = %reason,
                "Notification suppressed"
            );
            return Vec::new();
        }

        let priority = self.grouping.decide_priority(now);
        let requests = self.composer.compose(event, priority);

        info!(
            camera = %event.camera,
            label = %event.label,
            event_id = %event.id,
            priority = ?priority,
            requests = requests.len(),
            "Sending notification"
        );

        requests
    }

    /// Handle one event now: plan, then send each request on its own task.
    ///
    /// Sends are fire-and-forget; failures are logged inside the task and
    /// never reach the caller. The handles are returned so callers may wait.
    pub fn handle(&self, event: &DetectionEvent) -> Vec<JoinHandle<()>> {
        self.handle_at(event, Utc::now())
    }

    pub fn handle_at(&self, event: &DetectionEvent, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        self.plan(event, now)
            .into_iter()
            .map(|request| {
                let sender = Arc::clone(&self.sender);
                tokio::spawn(async move {
                    match sender.send(&request).await {
                        Ok(()) => debug!(channel = %request.channel, "Notification delivered"),
                        Err(e) => {
                            let error = format!("{:#}", e);
                            error!(
                                channel = %request.channel,
                                url = %request.url,
                                %error,
                                "Notification delivery failed"
                            );
                        }
                    }
                })
            })
            .collect()
    }
}
