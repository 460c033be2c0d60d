use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use super::interface::WebhookTransport;
use super::types::{OutboundPayload, ResponseEnvelope};
use crate::error::WebhookError;

pub const RELAY_FAILURE_MESSAGE: &str = "Failed to communicate with webhook service";

/// Client for the local relay server.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    webhook_url: String,
}

impl RelayClient {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Health endpoint living next to the relay's `/webhook` route.
    pub fn health_url(&self) -> String {
        let base = self.webhook_url.trim_end_matches('/');
        let base = base.strip_suffix("/webhook").unwrap_or(base);
        format!("{}/health", base)
    }

    /// Send a payload through the relay. Always resolves to an envelope.
    pub async fn send_to_webhook(&self, payload: &OutboundPayload) -> ResponseEnvelope {
        debug!("Sending to webhook: {:?}", payload);

        match self.try_send(payload).await {
            Ok(envelope) => {
                debug!("Webhook response: {:?}", envelope);
                envelope
            }
            Err(e) => {
                error!("Webhook service error: {}", e);
                ResponseEnvelope::failure(RELAY_FAILURE_MESSAGE, e.to_string())
            }
        }
    }

    async fn try_send(&self, payload: &OutboundPayload) -> Result<ResponseEnvelope, WebhookError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        Ok(response.json::<ResponseEnvelope>().await?)
    }

    /// Best-effort liveness probe; any failure reads as unhealthy.
    pub async fn check_health(&self) -> bool {
        match self.client.get(self.health_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Webhook service health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl WebhookTransport for RelayClient {
    async fn submit(&self, payload: &OutboundPayload) -> ResponseEnvelope {
        self.send_to_webhook(payload).await
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}
