//! Resource Models
//!
//! Field sets persisted in the document store. Metadata (`objectId`,
//! `createdAt`) is assigned by the store and lives on [`crate::store::Document`].

use serde::{Deserialize, Serialize};

/// Collection holding todos.
pub const TODO_CLASS: &str = "Todo";
/// Collection holding articles.
pub const ARTICLE_CLASS: &str = "Article";
/// Collection holding uploaded asset records.
pub const ASSET_CLASS: &str = "Asset";

/// A todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub content: String,
}

/// A linkable article, shown as a card in replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: String,
    /// Lowercase match terms.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Article {
    /// Lowercase every keyword so lookups are case-insensitive.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }
}

/// Display record for media uploaded to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub title: String,
    pub introduction: String,
    pub media_type: String,
    pub filename: String,
    /// Platform media id.
    pub media_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
