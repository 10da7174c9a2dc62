//! Operational HTTP endpoints.
//!
//! - `GET /health` : liveness + current registry cardinalities
//! - `POST /webhook/notification` : server-to-server event injection, driven
//!   through the same router as the WebSocket path
//!
//! Neither endpoint is authenticated; callers are trusted (same trust model
//! as the `authenticate` event itself).

use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use limopulse_core::protocol::outbound::now_rfc3339;

use crate::app_state::AppState;
use crate::routing;

pub async fn health(State(app): State<AppState>) -> impl IntoResponse {
    let counts = app.registry().counts();
    Json(json!({
        "status": "ok",
        "connectedUsers": counts.connected,
        "admins": counts.admins,
        "drivers": counts.drivers,
        "customers": counts.customers,
        "timestamp": now_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Always answers success for a JSON body; an unrecognized `event` is a
/// silent no-op in the router.
pub async fn webhook_notification(
    State(app): State<AppState>,
    Json(body): Json<WebhookBody>,
) -> impl IntoResponse {
    routing::handle_webhook(app.registry(), &body.event, &body.data);
    Json(json!({ "success": true, "event": body.event }))
}
