use crate::config::MqttConfig;
use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Capacity of the request channel between client handle and event loop
const REQUEST_CAPACITY: usize = 10;

/// Brokers may reject keep-alives below this
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Build broker options from config.
///
/// Without a configured client id, one is generated per process. It stays
/// within the 23 characters MQTT 3.1.1 brokers must accept.
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let (host, port) = config.host_and_port();
    let client_id = config
        .mqtt_client_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("frigate-notify-{}", &suffix[..8])
        });

    let mut options = MqttOptions::new(client_id, host, port);
    options.set_keep_alive(Duration::from_secs(
        config.mqtt_keep_alive_seconds.max(MIN_KEEP_ALIVE_SECS),
    ));
    options.set_max_packet_size(config.mqtt_max_packet_bytes, config.mqtt_max_packet_bytes);
    if let Some((username, password)) = config.credentials() {
        options.set_credentials(username, password);
    }
    options
}

/// MQTT client handle plus the event loop that drives it.
///
/// No network traffic happens until the event loop is polled.
pub struct MqttClient {
    pub(crate) client: AsyncClient,
    pub(crate) eventloop: EventLoop,
    pub(crate) topic: String,
    pub(crate) address: String,
}

impl MqttClient {
    pub fn new(config: &MqttConfig) -> Self {
        let (host, port) = config.host_and_port();
        info!("Connecting to MQTT at {}:{}", host, port);

        let (client, eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CAPACITY);

        Self {
            client,
            eventloop,
            topic: config.mqtt_topic.clone(),
            address: config.mqtt_address.clone(),
        }
    }
}
