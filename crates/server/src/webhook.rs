//! Inbound webhook and health endpoints. The webhook acknowledges with 200
//! as soon as the payload is accepted; conversational processing happens in
//! spawned tasks, fire-and-forget from the transport's perspective.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use tiendy_bot::DialogueRouter;
use tiendy_whatsapp::WebhookPayload;

#[derive(Clone)]
pub struct WebhookState {
    pub router: Arc<DialogueRouter>,
}

pub fn router(dialogue: Arc<DialogueRouter>) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .route("/health", get(health))
        .with_state(WebhookState { router: dialogue })
}

pub async fn serve(bind_address: &str, port: u16, dialogue: Arc<DialogueRouter>) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(event_name = "system.webhook.start", bind_address = %address, "webhook listening");
    axum::serve(listener, router(dialogue)).await
}

async fn receive(State(state): State<WebhookState>, Json(payload): Json<Value>) -> StatusCode {
    let correlation_id = Uuid::new_v4().to_string();

    // Unknown payload shapes are acknowledged and dropped; the platform
    // retries on non-2xx and these will never parse differently.
    let Ok(payload) = serde_json::from_value::<WebhookPayload>(payload) else {
        debug!(correlation_id = %correlation_id, "ignoring unrecognized webhook payload");
        return StatusCode::OK;
    };

    for message in payload.text_messages() {
        debug!(
            correlation_id = %correlation_id,
            user = %message.user,
            "accepted inbound message"
        );
        let router = state.router.clone();
        tokio::spawn(async move {
            router.handle_inbound(&message.user, &message.text).await;
        });
    }

    StatusCode::OK
}

#[derive(Clone, Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    checked_at: String,
}

async fn health() -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: "tiendy-server",
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}
