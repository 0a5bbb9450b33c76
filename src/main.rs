use anyhow::{Context, Result};
use frigate_notify::config::{self, RuntimeEnv};
use frigate_notify::dispatch::Dispatcher;
use frigate_notify::mqtt::{EventSubscriber, MqttClient};
use frigate_notify::notify::HttpSender;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let env = RuntimeEnv::from_env();
    let app_config = config::load_config(&env.config_path)?;

    // Initialize tracing subscriber; RUST_LOG wins over debug_logging
    let default_filter = if app_config.debug_logging {
        "frigate_notify=debug"
    } else {
        "frigate_notify=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    info!(config = %env.config_path.display(), "frigate-notify starting...");

    config::validate(&app_config, &env).context("Invalid configuration")?;

    info!(
        ntfy_enabled = app_config.ntfy.ntfy_enabled,
        ha_enabled = app_config.home_assistant.ha_enabled,
        grouping_enabled = app_config.grouping.grouping_enabled,
        grouping_minutes = app_config.grouping.grouping_minutes,
        "Configuration loaded"
    );

    let sender = Arc::new(HttpSender::new()?);
    let dispatcher = Arc::new(Dispatcher::from_config(&app_config, &env, sender));

    let mqtt = MqttClient::new(&app_config.mqtt);
    let subscriber = tokio::spawn(EventSubscriber::new(mqtt, dispatcher).run());

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    subscriber.abort();
    info!("frigate-notify stopped");

    Ok(())
}
