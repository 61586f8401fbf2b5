//! Inbound notification listener.
//!
//! The handler only deserializes the body and queues it for the explorer;
//! it never touches exploration state. Every well-formed notification is
//! acknowledged, whether or not the call id is known.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Completion notification posted by the telephony service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallNotification {
    /// External call identifier.
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "bool_ish")]
    pub recording_available: bool,
}

/// Accepts `true`, `"true"`, `1`, `"1"`, `"yes"`; anything else (including null) is false.
fn bool_ish<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
        Some(serde_json::Value::String(s)) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    })
}

#[derive(Clone)]
struct WebhookState {
    notifications: mpsc::Sender<CallNotification>,
}

/// Build the listener router: `POST /webhook` and `GET /health`.
pub fn webhook_routes(notifications: mpsc::Sender<CallNotification>) -> Router {
    Router::new()
        .route("/webhook", post(receive_notification))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(WebhookState { notifications })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "call-explorer"
    }))
}

async fn receive_notification(
    State(state): State<WebhookState>,
    Json(notification): Json<CallNotification>,
) -> impl IntoResponse {
    info!(
        call_id = %notification.id,
        status = %notification.status,
        recording_available = notification.recording_available,
        "Received call notification"
    );

    if state.notifications.send(notification).await.is_err() {
        warn!("Explorer has stopped, notification dropped");
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "received" })),
    )
}
