use std::any::Any;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::WebhookError;
use crate::state::AppState;
use crate::webhook::types::iso_timestamp;
use crate::webhook::{HealthStatus, ResponseEnvelope};

pub const RELAY_SUCCESS_MESSAGE: &str = "Webhook processed successfully";
pub const RELAY_FAILURE_MESSAGE: &str = "Webhook processing failed";

pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/webhook", post(relay_webhook))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(state.config.body_limit_bytes))
}

/// Full relay application with its middleware stack.
pub fn build_app(state: AppState) -> Router {
    create_routes(&state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn relay_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<ResponseEnvelope>) {
    info!(
        timestamp = %iso_timestamp(),
        method = %method,
        headers = ?headers,
        body = %body,
        "Incoming webhook request"
    );

    match forward_to_webhook(&state, &body).await {
        Ok(data) => (
            StatusCode::OK,
            Json(ResponseEnvelope::success(RELAY_SUCCESS_MESSAGE, data)),
        ),
        Err(e) => {
            error!("Webhook error: {}", e);
            let upstream = e.upstream_body().map(str::to_string);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(
                    ResponseEnvelope::failure(RELAY_FAILURE_MESSAGE, e.to_string())
                        .with_n8n_response(upstream),
                ),
            )
        }
    }
}

/// POST the inbound body unchanged and return the raw reply text.
async fn forward_to_webhook(state: &AppState, body: &Value) -> Result<String, WebhookError> {
    let response = state
        .http
        .post(&state.config.webhook_url)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("").to_string();
    let data = response.text().await?;

    info!(
        status = status.as_u16(),
        status_text = %reason,
        data = %data,
        "N8N webhook response"
    );

    if !status.is_success() {
        return Err(WebhookError::Upstream {
            status: status.as_u16(),
            reason,
            body: data,
        });
    }

    Ok(data)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(&state.config.webhook_url))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    error!("Recovered from handler panic: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ResponseEnvelope::failure(RELAY_FAILURE_MESSAGE, detail)),
    )
        .into_response()
}
