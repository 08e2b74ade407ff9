//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum router
//! with an in-memory document store and a fake platform client, plus signing and
//! multipart helpers.
//!
//! ## Test Servers
//!
//! Use [`spawn_test_server()`] when a real socket is needed (WebSocket upgrades,
//! or standing in for a remote API) instead of `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tower::ServiceExt;
use wxhook_server::api::{create_router, AppState};
use wxhook_server::config::Config;
use wxhook_server::store::{Collection, Document, DocumentStore, MemoryStore, Query, StoreError};
use wxhook_server::wechat::client::{
    MaterialUpload, PlatformApi, PlatformError, UploadedMaterial,
};
use wxhook_server::wechat::signature::compute_signature;

// ============================================================================
// Fakes
// ============================================================================

/// Platform client that records uploads instead of sending them.
#[derive(Default)]
pub struct FakePlatform {
    pub uploads: Mutex<Vec<MaterialUpload>>,
    pub token_calls: AtomicUsize,
    /// When set, every call fails with this platform error code.
    pub fail_with: Option<i64>,
}

impl FakePlatform {
    pub fn failing(code: i64) -> Self {
        Self {
            fail_with: Some(code),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), PlatformError> {
        match self.fail_with {
            Some(code) => Err(PlatformError::Api {
                code,
                message: "invalid credential".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn access_token(&self) -> Result<String, PlatformError> {
        self.check()?;
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        Ok("fake-access-token".into())
    }

    async fn upload_material(
        &self,
        upload: MaterialUpload,
    ) -> Result<UploadedMaterial, PlatformError> {
        self.check()?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(upload);
        Ok(UploadedMaterial {
            media_id: format!("media-{}", uploads.len()),
            url: Some("https://mmbiz.example.com/asset".into()),
        })
    }
}

/// Store whose every call fails with the given backend code.
pub struct FailingStore(pub i64);

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _query: &Query) -> Result<Collection, StoreError> {
        Err(StoreError::Backend {
            code: self.0,
            message: "The storage backend is unavailable".into(),
        })
    }

    async fn insert(
        &self,
        _class: &str,
        _fields: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        Err(StoreError::Backend {
            code: self.0,
            message: "The storage backend is unavailable".into(),
        })
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub platform: Arc<FakePlatform>,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app with an empty in-memory store.
    pub fn new() -> Self {
        Self::with_parts(
            Config::default_for_test(),
            Arc::new(MemoryStore::new()),
            Arc::new(FakePlatform::default()),
        )
    }

    /// Create a test app around a custom store.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_parts(
            Config::default_for_test(),
            store,
            Arc::new(FakePlatform::default()),
        )
    }

    /// Create a test app around a custom platform client.
    pub fn with_platform(platform: FakePlatform) -> Self {
        Self::with_parts(
            Config::default_for_test(),
            Arc::new(MemoryStore::new()),
            Arc::new(platform),
        )
    }

    /// Create a test app with a custom config (for limit testing).
    pub fn with_config(config: Config) -> Self {
        Self::with_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(FakePlatform::default()),
        )
    }

    fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        platform: Arc<FakePlatform>,
    ) -> Self {
        let state = AppState::new(config.clone(), store.clone(), platform.clone());
        Self {
            router: create_router(state),
            store,
            platform,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// GET `uri` with an empty body.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        let req = Self::request(Method::GET, uri)
            .body(Body::empty())
            .unwrap();
        self.oneshot(req).await
    }

    /// POST a JSON body to `uri`.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        let req = Self::request(Method::POST, uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.oneshot(req).await
    }

    /// Query string carrying a valid signature for this app's token.
    pub fn signed_query(&self, timestamp: &str, nonce: &str) -> String {
        let signature = compute_signature(&self.config.weixin_token, timestamp, nonce);
        format!("signature={signature}&timestamp={timestamp}&nonce={nonce}")
    }

    /// POST an XML callback body to `/` with a valid signature.
    pub async fn post_callback(&self, xml: &str) -> Response<Body> {
        let uri = format!("/?{}", self.signed_query("1700000000", "nonce123"));
        let req = Self::request(Method::POST, &uri)
            .header("Content-Type", "text/xml")
            .body(Body::from(xml.to_string()))
            .unwrap();
        self.oneshot(req).await
    }
}

// ============================================================================
// Bodies
// ============================================================================

/// Collect a response body as a string.
pub async fn body_string(resp: Response<Body>) -> String {
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// Collect a response body as JSON.
pub async fn body_json(resp: Response<Body>) -> Value {
    let text = body_string(resp).await;
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {text}"))
}

pub const BOUNDARY: &str = "----TestBoundary";

/// Build a multipart body from text fields and an optional `(filename, bytes)` file part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a text message callback body.
pub fn text_message(content: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
         <FromUserName><![CDATA[openid-1]]></FromUserName>\
         <CreateTime>1700000000</CreateTime>\
         <MsgType><![CDATA[text]]></MsgType>\
         <Content><![CDATA[{content}]]></Content>\
         <MsgId>1234567890123456</MsgId></xml>"
    )
}

/// Build an event callback body.
pub fn event_message(event: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
         <FromUserName><![CDATA[openid-1]]></FromUserName>\
         <CreateTime>1700000000</CreateTime>\
         <MsgType><![CDATA[event]]></MsgType>\
         <Event><![CDATA[{event}]]></Event>\
         <EventKey><![CDATA[]]></EventKey></xml>"
    )
}

// ============================================================================
// Test Server
// ============================================================================

/// A running test server bound to a random port.
pub struct TestServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// Handle to the server task for cleanup.
    _handle: JoinHandle<()>,
}

/// Spawn a real HTTP server on a random port.
pub async fn spawn_test_server(router: Router) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    TestServer {
        addr,
        url,
        _handle: handle,
    }
}
