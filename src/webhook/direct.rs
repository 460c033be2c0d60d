use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::interface::WebhookTransport;
use super::types::{iso_timestamp, OutboundPayload, ResponseEnvelope};
use crate::error::WebhookError;

pub const DIRECT_SUCCESS_MESSAGE: &str = "N8N webhook processed successfully";
pub const DIRECT_REJECTED_MESSAGE: &str = "N8N webhook failed";
pub const DIRECT_FAILURE_MESSAGE: &str = "Failed to communicate with N8N webhook";

/// Posts straight to the external webhook, skipping the relay server.
#[derive(Debug, Clone)]
pub struct DirectClient {
    client: Client,
    webhook_url: String,
}

impl DirectClient {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    pub async fn send_direct_to_n8n(&self, payload: &OutboundPayload) -> ResponseEnvelope {
        debug!("Sending directly to N8N: {:?}", payload);

        match self.try_send(payload).await {
            Ok((ok, body)) => {
                let message = if ok {
                    DIRECT_SUCCESS_MESSAGE
                } else {
                    DIRECT_REJECTED_MESSAGE
                };
                ResponseEnvelope {
                    success: ok,
                    message: message.to_string(),
                    n8n_response: Some(body),
                    timestamp: iso_timestamp(),
                    error: None,
                }
            }
            Err(e) => {
                error!("Direct N8N webhook error: {}", e);
                ResponseEnvelope::failure(DIRECT_FAILURE_MESSAGE, e.to_string())
            }
        }
    }

    async fn try_send(&self, payload: &OutboundPayload) -> Result<(bool, String), WebhookError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("N8N direct response: status={}, data={}", status, body);

        Ok((status.is_success(), body))
    }
}

#[async_trait]
impl WebhookTransport for DirectClient {
    async fn submit(&self, payload: &OutboundPayload) -> ResponseEnvelope {
        self.send_direct_to_n8n(payload).await
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::webhook::types::{FarmerContext, TurnInput};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> OutboundPayload {
        OutboundPayload::from_turn(
            &TurnInput::Speech("cotton whitefly".to_string()),
            Language::Ur,
            &FarmerContext::default(),
        )
    }

    #[tokio::test]
    async fn success_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/abc"))
            .and(body_partial_json(serde_json::json!({"type": "speech", "language": "ur"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("Use yellow sticky traps"))
            .mount(&server)
            .await;

        let client = DirectClient::new(format!("{}/webhook/abc", server.uri()));
        let envelope = client.send_direct_to_n8n(&payload()).await;

        assert!(envelope.success);
        assert_eq!(envelope.message, DIRECT_SUCCESS_MESSAGE);
        assert_eq!(envelope.n8n_response.as_deref(), Some("Use yellow sticky traps"));
        assert!(envelope.error.is_none());
    }

    #[tokio::test]
    async fn non_ok_status_is_unsuccessful_but_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("workflow not active"))
            .mount(&server)
            .await;

        let client = DirectClient::new(server.uri());
        let envelope = client.submit(&payload()).await;

        assert!(!envelope.success);
        assert_eq!(envelope.message, DIRECT_REJECTED_MESSAGE);
        assert_eq!(envelope.n8n_response.as_deref(), Some("workflow not active"));
    }

    #[tokio::test]
    async fn transport_failure_is_normalized() {
        let client = DirectClient::new("http://127.0.0.1:1/webhook");
        let envelope = client.submit(&payload()).await;

        assert!(!envelope.success);
        assert_eq!(envelope.message, DIRECT_FAILURE_MESSAGE);
        assert!(!envelope.error.unwrap_or_default().is_empty());
    }
}
