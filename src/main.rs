use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use smart_kissan::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("smart_kissan=debug,tower_http=debug")),
        )
        .init();

    let config = Config::discover();
    let relay_config = config.relay_config;

    let addr: SocketAddr = format!("{}:{}", relay_config.host, relay_config.port).parse()?;
    let webhook_url = relay_config.webhook_url.clone();

    let app = routes::build_app(AppState::new(relay_config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Webhook server running on http://{}", addr);
    info!("N8N Webhook URL: {}", webhook_url);
    info!("Webhook endpoint: http://{}/webhook", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
