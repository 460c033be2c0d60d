use std::sync::Arc;
use tracing::info;

use super::client::RelayClient;
use super::direct::DirectClient;
use super::interface::WebhookTransport;
use crate::config::{ClientConfig, TransportKind};

/// Factory for the payload transports
pub struct TransportFactory;

impl TransportFactory {
    /// Pick the relay or the direct path from configuration.
    pub fn create(client_config: &ClientConfig) -> Arc<dyn WebhookTransport> {
        match client_config.transport {
            TransportKind::Relay => {
                info!("Using relay transport: {}", client_config.relay_url);
                Arc::new(RelayClient::new(client_config.relay_url.clone()))
            }
            TransportKind::Direct => {
                info!("Using direct transport: {}", client_config.webhook_url);
                Arc::new(DirectClient::new(client_config.webhook_url.clone()))
            }
        }
    }
}
