//! Axum route wiring (WS upgrade + operational HTTP surface).

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::{app_state::AppState, http, transport};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cfg().cors_origin);

    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/health", get(http::health))
        .route("/webhook/notification", post(http::webhook_notification))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(%origin, "CORS_ORIGIN is not a valid header value, no origin allowed");
            layer
        }
    }
}
