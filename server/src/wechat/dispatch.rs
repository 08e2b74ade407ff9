//! Message Dispatch
//!
//! Maps an inbound callback to a reply. Text is matched against article
//! keywords; events get a fixed reply or none at all.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::message::{EventKind, InboundMessage, MessageKind, ParseError};
use super::reply::{NewsItem, Reply, ReplyPayload};
use crate::models::{Article, ARTICLE_CLASS};
use crate::store::{DocumentStore, Query, StoreError};

/// Reply for event tags we do not know.
pub const EVENT_RECEIVED_TEXT: &str = "Event received";

/// Reply for message types we do not handle.
pub const UNSUPPORTED_TEXT: &str = "Sorry, this kind of message cannot be handled yet";

/// Dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Routes inbound messages to replies.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn DocumentStore>,
    welcome_text: String,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, welcome_text: impl Into<String>) -> Self {
        Self {
            store,
            welcome_text: welcome_text.into(),
        }
    }

    /// Parse a raw callback body and build the addressed reply.
    pub async fn dispatch(&self, raw: &str) -> Result<ReplyPayload, DispatchError> {
        let message = InboundMessage::parse(raw)?;
        let reply = self.reply_to(&message).await?;

        Ok(ReplyPayload {
            to_user: message.from_user,
            from_user: message.to_user,
            create_time: chrono::Utc::now().timestamp(),
            reply,
        })
    }

    /// Decide the reply for a parsed message.
    pub async fn reply_to(&self, message: &InboundMessage) -> Result<Reply, StoreError> {
        match &message.kind {
            MessageKind::Text { content } => {
                let articles = self.articles_matching(content).await?;
                if articles.is_empty() {
                    Ok(Reply::Text(content.clone()))
                } else {
                    Ok(Reply::News(articles.into_iter().map(NewsItem::from).collect()))
                }
            }
            MessageKind::Event { event, key } => Ok(self.reply_to_event(message, event, key.as_deref())),
            MessageKind::Other { msg_type } => {
                debug!(msg_type = %msg_type, from = %message.from_user, "Unhandled message type");
                Ok(Reply::Text(UNSUPPORTED_TEXT.to_string()))
            }
        }
    }

    fn reply_to_event(&self, message: &InboundMessage, event: &EventKind, key: Option<&str>) -> Reply {
        match event {
            EventKind::Subscribe => {
                info!(from = %message.from_user, key = ?key, "New follower");
                Reply::Text(self.welcome_text.clone())
            }
            EventKind::Unsubscribe => {
                info!(from = %message.from_user, "Follower left");
                Reply::None
            }
            EventKind::Unrecognized(tag) => {
                debug!(event = %tag, "Unrecognized event");
                Reply::Text(EVENT_RECEIVED_TEXT.to_string())
            }
            inert => {
                debug_assert!(inert.is_inert());
                info!(event = ?inert, from = %message.from_user, key = ?key, "Event received");
                Reply::None
            }
        }
    }

    /// Articles whose keywords contain `content` (case-insensitive), newest first.
    async fn articles_matching(&self, content: &str) -> Result<Vec<Article>, StoreError> {
        let keyword = content.trim().to_lowercase();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self
            .store
            .find(&Query::new(ARTICLE_CLASS).contains("keywords", keyword))
            .await?
            .into_documents();

        Ok(docs
            .iter()
            .filter_map(|doc| match doc.decode::<Article>() {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed article");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::store::{to_fields, Collection, Document, MemoryStore};

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn find(&self, _query: &Query) -> Result<Collection, StoreError> {
            Err(StoreError::Backend {
                code: 1,
                message: "Internal server error. No information available.".into(),
            })
        }

        async fn insert(
            &self,
            _class: &str,
            _fields: Map<String, Value>,
        ) -> Result<Document, StoreError> {
            unreachable!("dispatch never writes")
        }
    }

    fn text(content: &str) -> String {
        format!(
            "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
             <FromUserName><![CDATA[openid-1]]></FromUserName>\
             <CreateTime>1700000000</CreateTime>\
             <MsgType><![CDATA[text]]></MsgType>\
             <Content><![CDATA[{content}]]></Content></xml>"
        )
    }

    fn event(tag: &str) -> String {
        format!(
            "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
             <FromUserName><![CDATA[openid-1]]></FromUserName>\
             <CreateTime>1700000000</CreateTime>\
             <MsgType><![CDATA[event]]></MsgType>\
             <Event><![CDATA[{tag}]]></Event></xml>"
        )
    }

    async fn store_with_article(keywords: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let article = Article {
            title: "Ownership".into(),
            description: "Borrowing explained".into(),
            url: "https://example.com/ownership".into(),
            image: "https://example.com/ownership.png".into(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
        .normalized();
        store
            .insert(ARTICLE_CLASS, to_fields(&article).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn keyword_match_returns_news() {
        let store = store_with_article(&["Foo", "BAR"]).await;
        let dispatcher = Dispatcher::new(store, "welcome");

        let payload = dispatcher.dispatch(&text("foo")).await.unwrap();
        assert_eq!(payload.to_user, "openid-1");
        assert_eq!(payload.from_user, "gh_account");
        match payload.reply {
            Reply::News(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].title, "Ownership");
                assert_eq!(items[0].pic_url, "https://example.com/ownership.png");
            }
            other => panic!("expected news, got {other:?}"),
        }

        let upper = dispatcher.dispatch(&text("BaR")).await.unwrap();
        assert!(matches!(upper.reply, Reply::News(_)));
    }

    #[tokio::test]
    async fn unmatched_text_is_echoed() {
        let store = store_with_article(&["foo"]).await;
        let dispatcher = Dispatcher::new(store, "welcome");

        let payload = dispatcher.dispatch(&text("Something else")).await.unwrap();
        assert_eq!(payload.reply, Reply::Text("Something else".into()));
    }

    #[tokio::test]
    async fn missing_article_collection_echoes() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), "welcome");
        let payload = dispatcher.dispatch(&text("hello")).await.unwrap();
        assert_eq!(payload.reply, Reply::Text("hello".into()));
    }

    #[tokio::test]
    async fn events_follow_their_rules() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), "welcome");

        let subscribe = dispatcher.dispatch(&event("subscribe")).await.unwrap();
        assert_eq!(subscribe.reply, Reply::Text("welcome".into()));

        let unsubscribe = dispatcher.dispatch(&event("unsubscribe")).await.unwrap();
        assert!(unsubscribe.is_silent());

        for tag in ["SCAN", "CLICK", "LOCATION", "TEMPLATESENDJOBFINISH", "submit_invoice_title"] {
            let payload = dispatcher.dispatch(&event(tag)).await.unwrap();
            assert!(payload.is_silent(), "{tag} should not be answered");
        }

        let unknown = dispatcher.dispatch(&event("weapp_audit_success")).await.unwrap();
        assert_eq!(unknown.reply, Reply::Text(EVENT_RECEIVED_TEXT.into()));
    }

    #[tokio::test]
    async fn other_types_get_generic_reply() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()), "welcome");
        let raw = "<xml><ToUserName><![CDATA[gh]]></ToUserName>\
                   <FromUserName><![CDATA[u]]></FromUserName>\
                   <CreateTime>1</CreateTime><MsgType><![CDATA[voice]]></MsgType></xml>";
        let payload = dispatcher.dispatch(raw).await.unwrap();
        assert_eq!(payload.reply, Reply::Text(UNSUPPORTED_TEXT.into()));
    }

    #[tokio::test]
    async fn store_failure_surfaces() {
        let dispatcher = Dispatcher::new(Arc::new(FailingStore), "welcome");
        let err = dispatcher.dispatch(&text("foo")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Store(StoreError::Backend { code: 1, .. })));

        // Events never touch the store.
        assert!(dispatcher.dispatch(&event("subscribe")).await.is_ok());
    }
}
