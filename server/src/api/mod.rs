//! API Router and Application State
//!
//! Central routing configuration and shared state.

mod diagnostics;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    resources,
    store::DocumentStore,
    wechat::{self, Dispatcher, PlatformApi},
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Hosted document store
    pub store: Arc<dyn DocumentStore>,
    /// Chat platform API client
    pub platform: Arc<dyn PlatformApi>,
    /// Inbound message dispatcher
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        platform: Arc<dyn PlatformApi>,
    ) -> Self {
        let dispatcher = Dispatcher::new(store.clone(), config.welcome_text.clone());
        Self {
            config: Arc::new(config),
            store,
            platform,
            dispatcher,
        }
    }
}

/// Headroom for multipart form fields on top of the file itself.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Body limit that lets uploads up to `max_upload_size` reach the handler.
fn request_body_limit(max_upload_size: usize) -> usize {
    max_upload_size.saturating_add(FORM_OVERHEAD)
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = request_body_limit(state.config.max_upload_size);

    Router::new()
        // Platform callbacks
        .merge(wechat::callback_router())
        .nest("/wechat", wechat::router())
        // Resources
        .nest("/api", resources::router())
        // Diagnostics
        .route("/health", get(diagnostics::health_check))
        .route("/time", get(diagnostics::time))
        .route("/version", get(diagnostics::version))
        .route("/echo", get(diagnostics::echo))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        // State
        .with_state(state)
}
