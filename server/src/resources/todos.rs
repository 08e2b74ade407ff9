//! Todo Endpoints

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use tracing::{info, instrument};

use super::{insert_model, list_class, Created};
use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Todo, TODO_CLASS};
use crate::store::Document;

const TODO_SCHEMA: &str = r#"{"content": "TODO CONTENT"}"#;

/// GET /api/todos
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(list_class(state.store.as_ref(), TODO_CLASS).await?))
}

/// POST /api/todos
#[instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Created>> {
    let todo: Todo = serde_json::from_slice(&body).map_err(|_| ApiError::Malformed {
        schema: TODO_SCHEMA,
    })?;

    let doc = insert_model(state.store.as_ref(), TODO_CLASS, &todo).await?;
    info!(object_id = %doc.object_id, "Todo created");

    Ok(Created::ok())
}
