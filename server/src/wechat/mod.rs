//! WeChat Callback Service
//!
//! Signature verification, inbound message parsing, reply dispatch, and the
//! platform API client.

pub mod client;
pub mod dispatch;
mod handlers;
pub mod message;
pub mod reply;
pub mod signature;

use axum::{routing::get, Router};

use crate::api::AppState;

pub use client::{PlatformApi, WeixinClient};
pub use dispatch::Dispatcher;
pub use handlers::INVALID_SIGNATURE;

/// Create the callback root router (`GET|POST /`).
pub fn callback_router() -> Router<AppState> {
    Router::new().route("/", get(handlers::challenge).post(handlers::receive))
}

/// Create the `/wechat` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", get(handlers::validate))
        .route("/access_token", get(handlers::access_token))
}
