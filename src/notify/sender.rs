use super::{NotificationRequest, RequestBody};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Delivers composed notification requests.
///
/// Implementations make exactly one attempt; callers only log the outcome.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<()>;
}

/// reqwest-backed sender for ntfy and Home Assistant.
#[derive(Clone)]
pub struct HttpSender {
    http_client: Client,
}

impl HttpSender {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("frigate-notify/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl NotificationSender for HttpSender {
    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Text(text) => builder.body(text.clone()),
            RequestBody::Json(value) => builder.json(value),
        };

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} at {}", request.channel, request.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!(
                "Non-successful response from {}: {}",
                request.channel,
                status
            ));
        }

        Ok(())
    }
}
