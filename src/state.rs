use reqwest::Client;
use std::sync::Arc;

use crate::config::RelayConfig;

/// Shared relay state: immutable settings plus one pooled HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub http: Client,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: Client::new(),
        }
    }
}
