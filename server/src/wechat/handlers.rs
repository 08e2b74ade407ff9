//! Webhook Handlers
//!
//! Signature handshake, message callbacks, and the access token passthrough.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{instrument, warn};

use super::dispatch::DispatchError;
use super::signature::SignatureParams;
use crate::api::AppState;
use crate::error::{ApiError, ApiResult};

/// Body returned when a callback signature does not verify.
pub const INVALID_SIGNATURE: &str = "Invalid signature";

fn invalid_signature() -> Response {
    (StatusCode::FORBIDDEN, INVALID_SIGNATURE).into_response()
}

/// GET /wechat/validate
///
/// Standalone handshake: echoes `echostr` when the signature verifies.
#[instrument(skip(state, params))]
pub async fn validate(
    State(state): State<AppState>,
    Query(params): Query<SignatureParams>,
) -> Response {
    match params.echostr() {
        Some(echostr) if params.verify(&state.config.weixin_token) => echostr.to_string().into_response(),
        _ => {
            warn!("Rejected validation handshake");
            (StatusCode::BAD_REQUEST, "invalid").into_response()
        }
    }
}

/// GET /
///
/// Handshake on the callback root.
#[instrument(skip(state, params))]
pub async fn challenge(
    State(state): State<AppState>,
    Query(params): Query<SignatureParams>,
) -> Response {
    match params.echostr() {
        Some(echostr) if params.verify(&state.config.weixin_token) => echostr.to_string().into_response(),
        _ => {
            warn!("Rejected callback handshake");
            invalid_signature()
        }
    }
}

/// POST /
///
/// Message callback: verify, dispatch, and render the passive reply.
#[instrument(skip(state, params, body), fields(body_len = body.len()))]
pub async fn receive(
    State(state): State<AppState>,
    Query(params): Query<SignatureParams>,
    body: String,
) -> ApiResult<Response> {
    if !params.verify(&state.config.weixin_token) {
        warn!("Rejected callback with bad signature");
        return Ok(invalid_signature());
    }

    let payload = state.dispatcher.dispatch(&body).await.map_err(|e| match e {
        DispatchError::Parse(e) => ApiError::BadRequest(e.to_string()),
        DispatchError::Store(e) => ApiError::from(e),
    })?;

    let content_type = if payload.is_silent() {
        "text/plain; charset=utf-8"
    } else {
        "application/xml; charset=utf-8"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], payload.to_xml()).into_response())
}

/// GET /wechat/access_token
#[instrument(skip(state))]
pub async fn access_token(State(state): State<AppState>) -> ApiResult<String> {
    Ok(state.platform.access_token().await?)
}
