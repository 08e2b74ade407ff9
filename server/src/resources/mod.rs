//! Resource API
//!
//! List/create endpoints for todos, articles, and uploaded assets.

mod articles;
mod assets;
mod todos;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::AppState;
use crate::error::ApiError;
use crate::store::{self, Document, DocumentStore, Query};

/// Body returned after a successful create.
#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
}

impl Created {
    const fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// All documents in `class`, newest first; empty if it was never created.
async fn list_class(store: &dyn DocumentStore, class: &str) -> Result<Vec<Document>, ApiError> {
    Ok(store.find(&Query::new(class)).await?.into_documents())
}

/// Serialize `model` and insert it into `class`.
async fn insert_model<T: Serialize>(
    store: &dyn DocumentStore,
    class: &str,
    model: &T,
) -> Result<Document, ApiError> {
    let fields: Map<String, Value> = store::to_fields(model)?;
    Ok(store.insert(class, fields).await?)
}

/// Create the `/api` resource router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route("/articles", get(articles::list).post(articles::create))
        .route("/assets", get(assets::list).post(assets::upload))
}
