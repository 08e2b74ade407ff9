//! Diagnostic endpoints: health, clock, version, and a WebSocket echo.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::debug;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Current server time, RFC 3339.
pub async fn time() -> String {
    chrono::Local::now().to_rfc3339()
}

/// Server version.
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Upgrade to a WebSocket that echoes every data frame.
pub async fn echo(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(echo_socket)
}

async fn echo_socket(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                if socket.send(msg).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            // Ping/pong are answered by the protocol layer
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    debug!("Echo socket closed");
}
