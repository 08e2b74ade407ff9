//! In-Memory Storage
//!
//! Process-local implementation of [`DocumentStore`] used by tests and for
//! running the server without hosted storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, Query, StoreError};

/// Collections kept in process memory, oldest first within each class.
#[derive(Clone, Default)]
pub struct MemoryStore {
    classes: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn array_contains(doc: &Document, field: &str, value: &str) -> bool {
    match doc.fields.get(field) {
        Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(value)),
        Some(Value::String(s)) => s == value,
        _ => false,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, query: &Query) -> Result<Collection, StoreError> {
        let classes = self.classes.read().await;
        let Some(docs) = classes.get(&query.class) else {
            return Ok(Collection::Missing);
        };

        let matches = docs
            .iter()
            .rev()
            .filter(|doc| {
                query
                    .contains
                    .as_ref()
                    .is_none_or(|(field, value)| array_contains(doc, field, value))
            })
            .cloned()
            .collect();

        Ok(Collection::Documents(matches))
    }

    async fn insert(
        &self,
        class: &str,
        fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let now = Utc::now();
        let doc = Document {
            object_id: Uuid::now_v7().simple().to_string(),
            created_at: now,
            updated_at: Some(now),
            fields,
        };

        self.classes
            .write()
            .await
            .entry(class.to_string())
            .or_default()
            .push(doc.clone());

        Ok(doc)
    }
}
