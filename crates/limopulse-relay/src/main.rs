//! Limopulse relay.
//!
//! Standalone realtime notification process for the booking platform:
//! - WebSocket endpoint: /ws
//! - Typed event routing between admins, drivers, and customers
//! - Health + webhook HTTP side-channel

use tracing_subscriber::{fmt, EnvFilter};

use limopulse_relay::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = config::RelayConfig::from_env().expect("config load failed");
    let addr = format!("0.0.0.0:{}", cfg.port);

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%addr, "limopulse-relay starting");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
