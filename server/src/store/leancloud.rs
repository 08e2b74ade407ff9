//! LeanCloud REST Storage
//!
//! Talks to the `1.1/classes` REST API. Error responses carry a JSON body
//! `{"code": n, "error": "..."}`; code 101 means the class does not exist yet.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::{Collection, Document, DocumentStore, Query, StoreError};
use crate::config::Config;

/// Backend code for "class or object doesn't exist".
const CLASS_NOT_FOUND: i64 = 101;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    error: String,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    results: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    #[serde(rename = "objectId")]
    object_id: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

/// REST client for a LeanCloud application.
#[derive(Clone)]
pub struct LeanCloudStore {
    http: reqwest::Client,
    server: String,
    app_id: String,
    app_key: String,
}

impl LeanCloudStore {
    /// Create a store client for `server` (e.g. `https://xxxx.api.lncldglobal.com`).
    pub fn new(
        http: reqwest::Client,
        server: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            server: server.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }

    /// Create a store client from configuration, if it is configured.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Option<Self> {
        Some(Self::new(
            http,
            config.leancloud_api_server.clone()?,
            config.leancloud_app_id.clone()?,
            config.leancloud_app_key.clone()?,
        ))
    }

    fn class_url(&self, class: &str) -> String {
        format!("{}/1.1/classes/{class}", self.server)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-LC-Id", &self.app_id)
            .header("X-LC-Key", &self.app_key)
    }
}

/// Turn a non-success response into a [`StoreError`].
async fn error_from(response: reqwest::Response) -> StoreError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => StoreError::Backend {
            code: body.code,
            message: body.error,
        },
        Err(_) => StoreError::Backend {
            code: i64::from(status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        },
    }
}

#[async_trait]
impl DocumentStore for LeanCloudStore {
    #[instrument(skip(self), fields(class = %query.class))]
    async fn find(&self, query: &Query) -> Result<Collection, StoreError> {
        let mut params = vec![("order".to_string(), "-createdAt".to_string())];
        if let Some((field, value)) = &query.contains {
            // Equality against an array field matches on containment.
            let mut filter = Map::new();
            filter.insert(field.clone(), Value::from(value.as_str()));
            params.push(("where".to_string(), Value::Object(filter).to_string()));
        }

        let response = self
            .request(self.http.get(self.class_url(&query.class)))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return match error_from(response).await {
                StoreError::Backend { code, .. } if code == CLASS_NOT_FOUND => {
                    debug!("Class does not exist yet");
                    Ok(Collection::Missing)
                }
                err => Err(err),
            };
        }

        let body: QueryBody = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(count = body.results.len(), "Query completed");
        Ok(Collection::Documents(body.results))
    }

    #[instrument(skip(self, fields))]
    async fn insert(
        &self,
        class: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let response = self
            .request(self.http.post(self.class_url(class)))
            .json(&fields)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from(response).await);
        }

        let created: CreatedBody = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(object_id = %created.object_id, "Document created");

        Ok(Document {
            object_id: created.object_id,
            created_at: created.created_at,
            updated_at: Some(created.created_at),
            fields,
        })
    }
}
