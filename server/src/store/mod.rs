//! Document Store
//!
//! Narrow interface over the hosted document database. Collections ("classes")
//! are created implicitly on first insert, so a query against one that has
//! never been written reports [`Collection::Missing`] instead of failing.

mod leancloud;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use leancloud::LeanCloudStore;
pub use memory::MemoryStore;

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the call.
    #[error("{message}")]
    Backend {
        /// Backend error code.
        code: i64,
        /// Backend error message.
        message: String,
    },

    /// The backend could not be reached.
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with something we could not read.
    #[error("Unexpected store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Backend error code, if the backend supplied one.
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Backend { code, .. } => Some(*code),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

/// A record as stored, with the server-assigned metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Server-assigned identifier.
    #[serde(rename = "objectId")]
    pub object_id: String,
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// User fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decode the user fields into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::Decode(format!("document {}: {e}", self.object_id)))
    }
}

/// Outcome of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    /// The collection exists; documents are ordered newest first.
    Documents(Vec<Document>),
    /// The collection has never been created.
    Missing,
}

impl Collection {
    /// Documents in the collection, empty if it does not exist.
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            Self::Documents(docs) => docs,
            Self::Missing => Vec::new(),
        }
    }
}

/// Query against one collection, always ordered by `createdAt` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Collection name.
    pub class: String,
    /// Array-containment filter `(field, value)`.
    pub contains: Option<(String, String)>,
}

impl Query {
    /// All documents in `class`.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            contains: None,
        }
    }

    /// Restrict to documents whose array `field` contains `value`.
    #[must_use]
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.contains = Some((field.into(), value.into()));
        self
    }
}

/// Hosted document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a query.
    async fn find(&self, query: &Query) -> Result<Collection, StoreError>;

    /// Insert a new document into `class`, creating the collection if needed.
    async fn insert(&self, class: &str, fields: Map<String, Value>)
        -> Result<Document, StoreError>;
}

/// Serialize a model into the field map expected by [`DocumentStore::insert`].
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!("expected an object, got {other}"))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}
