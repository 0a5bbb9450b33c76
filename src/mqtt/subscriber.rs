use super::MqttClient;
use crate::dispatch::Dispatcher;
use crate::event::decode_event;
use rumqttc::{Event, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause between failed polls; rumqttc reconnects on the next poll
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Decode one events-topic payload and hand it to the dispatcher.
///
/// Undecodable or incomplete payloads are logged and skipped. Returns the
/// spawned send tasks (empty when nothing fired).
pub fn process_payload(dispatcher: &Dispatcher, payload: &[u8]) -> Vec<JoinHandle<()>> {
    match decode_event(payload) {
        Ok(event) => dispatcher.handle(&event),
        Err(e) if e.is_incomplete() => {
            debug!(error = %e, "Skipping incomplete event");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "Skipping malformed event payload");
            Vec::new()
        }
    }
}

/// Consumes the Frigate events topic and feeds the dispatcher.
///
/// Messages are handled one at a time on this task; notification sends run
/// on their own tasks and are not awaited.
pub struct EventSubscriber {
    mqtt: MqttClient,
    dispatcher: Arc<Dispatcher>,
}

impl EventSubscriber {
    pub fn new(mqtt: MqttClient, dispatcher: Arc<Dispatcher>) -> Self {
        Self { mqtt, dispatcher }
    }

    /// Poll the broker forever.
    ///
    /// Connection errors (including the first connect) are logged and retried
    /// after a delay. The topic is (re)subscribed on every ConnAck so the
    /// subscription survives reconnects.
    pub async fn run(mut self) {
        info!(topic = %self.mqtt.topic, "Starting MQTT event subscriber");

        loop {
            match self.mqtt.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT at '{}'", self.mqtt.address);
                    match self
                        .mqtt
                        .client
                        .try_subscribe(self.mqtt.topic.clone(), QoS::AtMostOnce)
                    {
                        Ok(()) => info!("Subscribed to topic '{}'", self.mqtt.topic),
                        Err(e) => error!(
                            topic = %self.mqtt.topic,
                            error = %e,
                            "Failed to subscribe"
                        ),
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    // Send tasks are detached
                    let _ = process_payload(&self.dispatcher, &publish.payload);
                }
                Ok(_) => {}
                Err(e) => {
                    error!(
                        address = %self.mqtt.address,
                        error = %e,
                        "MQTT connection error, retrying in {}s",
                        RETRY_DELAY.as_secs()
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}
