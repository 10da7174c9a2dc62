//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Track the connection in the registry for its whole lifetime
//! - Decode one envelope per text frame and hand it to the router
//! - Registry cleanup on disconnect, whatever state the session was in
//!
//! All registry writes for one connection (authenticate -> register,
//! disconnect -> unregister) happen inside this one task, in receipt order,
//! so a disconnect can never overtake an in-flight authenticate for the same
//! connection id.

use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use limopulse_core::protocol::{envelope, Inbound};

use crate::app_state::AppState;
use crate::registry::{ConnId, Connection, ConnectionRegistry};
use crate::routing;

/// Per-connection outbound queue depth. A slow reader that falls this far
/// behind starts losing frames (fire-and-forget delivery).
const OUTBOUND_QUEUE: usize = 1024;

pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_session(app, socket))
}

async fn run_session(app: AppState, socket: WebSocket) {
    let registry = app.registry();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let conn_id = registry.add_conn(Connection { tx: out_tx.clone() });
    info!(conn_id, "connection open");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                match msg {
                    Message::Text(text) => handle_text(registry, conn_id, &text),
                    Message::Ping(payload) => {
                        let _ = out_tx.try_send(Message::Pong(payload));
                    }
                    Message::Pong(_) => {}
                    Message::Binary(_) => {
                        warn!(conn_id, "binary frame ignored");
                    }
                    Message::Close(_) => break,
                }
            }
        }
    }

    registry.unregister(conn_id);
    info!(conn_id, "connection closed");
}

/// Decode one frame and route it. A malformed event is dropped with a
/// warning; the session keeps running.
fn handle_text(registry: &ConnectionRegistry, conn_id: ConnId, text: &str) {
    match envelope::decode(text).and_then(|env| Inbound::from_envelope(&env)) {
        Ok(event) => routing::handle_event(registry, conn_id, event),
        Err(e) => warn!(conn_id, error = %e, "dropping malformed event"),
    }
}
