use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use helpdesk_runtime::RepositoryDispatcher;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::stream_webhook::{
    evaluate_stream_webhook, StreamWebhookConfig, StreamWebhookRequest, WebhookOutcome,
};

const HEADER_MESSAGE_ID: &str = "twitch-eventsub-message-id";
const HEADER_MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
const HEADER_MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";
const HEADER_MESSAGE_TYPE: &str = "twitch-eventsub-message-type";

#[derive(Clone)]
pub struct WebhookServerState {
    pub config: StreamWebhookConfig,
    pub dispatcher: Arc<dyn RepositoryDispatcher>,
}

pub fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    Router::new()
        .route("/webhooks/twitch", post(handle_stream_webhook))
        .route("/healthz", get(handle_webhook_health))
        .with_state(state)
}

/// Serves the webhook router until ctrl-c.
pub async fn run_webhook_server(bind: &str, state: Arc<WebhookServerState>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook bound address")?;
    info!(addr = %local_addr, "stream webhook server listening");

    axum::serve(listener, build_webhook_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("stream webhook server exited unexpectedly")
}

async fn handle_webhook_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn handle_stream_webhook(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let request = StreamWebhookRequest {
        message_id: header(&headers, HEADER_MESSAGE_ID),
        timestamp: header(&headers, HEADER_MESSAGE_TIMESTAMP),
        signature: header(&headers, HEADER_MESSAGE_SIGNATURE),
        message_type: header(&headers, HEADER_MESSAGE_TYPE),
        body: &body,
    };
    let outcome = evaluate_stream_webhook(&state.config, &request, Utc::now());

    if let WebhookOutcome::Relay { event_type } = &outcome {
        if let Err(dispatch_error) = state
            .dispatcher
            .dispatch(
                &state.config.dispatch_event_type,
                json!({ "type": event_type }),
            )
            .await
        {
            error!(event_type = %event_type, error = %dispatch_error, "repository dispatch failed");
            return (StatusCode::BAD_GATEWAY, "dispatch failed".to_string());
        }
        info!(
            event_type = %event_type,
            dispatch_event_type = %state.config.dispatch_event_type,
            "stream event relayed"
        );
    }

    let status = StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::OK);
    (status, outcome.response_body())
}
