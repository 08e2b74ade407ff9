//! Article Endpoints

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use tracing::{info, instrument};

use super::{insert_model, list_class, Created};
use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{Article, ARTICLE_CLASS};
use crate::store::Document;

const ARTICLE_SCHEMA: &str = r#"{"title": "TITLE", "description": "DESCRIPTION", "url": "URL", "image": "IMAGE URL", "keywords": ["OPTIONAL", "KEYWORDS"]}"#;

/// GET /api/articles
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    Ok(Json(list_class(state.store.as_ref(), ARTICLE_CLASS).await?))
}

/// POST /api/articles
///
/// Keywords are stored lowercase.
#[instrument(skip(state, body))]
pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Created>> {
    let article: Article = serde_json::from_slice(&body).map_err(|_| ApiError::Malformed {
        schema: ARTICLE_SCHEMA,
    })?;
    let article = article.normalized();

    let doc = insert_model(state.store.as_ref(), ARTICLE_CLASS, &article).await?;
    info!(object_id = %doc.object_id, keywords = ?article.keywords, "Article created");

    Ok(Created::ok())
}
