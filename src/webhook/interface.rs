use async_trait::async_trait;

use super::types::{OutboundPayload, ResponseEnvelope};

/// Submits one payload and reports the outcome as an envelope.
///
/// Implementations never fail: transport and status errors come back as
/// `success=false` envelopes with `error` populated.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn submit(&self, payload: &OutboundPayload) -> ResponseEnvelope;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
