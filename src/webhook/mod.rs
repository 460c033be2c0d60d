pub mod client;
pub mod direct;
pub mod factory;
pub mod interface;
pub mod types;

pub use client::RelayClient;
pub use direct::DirectClient;
pub use factory::TransportFactory;
pub use interface::WebhookTransport;
pub use types::{
    FarmerContext, HealthStatus, OutboundPayload, PayloadType, ResponseEnvelope, TurnInput,
};
