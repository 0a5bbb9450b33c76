// MQTT broker integration

mod client;
mod subscriber;

pub use client::{mqtt_options, MqttClient};
pub use subscriber::{process_payload, EventSubscriber};
