//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;

/// Which document store implementation backs the resource collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted LeanCloud-style REST storage.
    LeanCloud,
    /// Process-local storage, lost on restart.
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leancloud" => Ok(Self::LeanCloud),
            "memory" => Ok(Self::Memory),
            other => bail!("STORE_BACKEND must be `leancloud` or `memory`, got `{other}`"),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000")
    pub bind_address: String,

    /// Shared token configured on the WeChat admin console
    pub weixin_token: String,

    /// Official account app id (needed for access tokens and media uploads)
    pub weixin_app_id: Option<String>,

    /// Official account app secret
    pub weixin_app_secret: Option<String>,

    /// Base URL of the platform API (default: `https://api.weixin.qq.com`)
    pub weixin_api_base: String,

    /// Text sent to users who follow the account
    pub welcome_text: String,

    /// Document store implementation
    pub store_backend: StoreBackend,

    /// LeanCloud application id
    pub leancloud_app_id: Option<String>,

    /// LeanCloud application key
    pub leancloud_app_key: Option<String>,

    /// LeanCloud REST API server
    pub leancloud_api_server: Option<String>,

    /// Maximum file upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => StoreBackend::parse(&value)?,
            Err(_) => StoreBackend::LeanCloud,
        };

        let config = Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            weixin_token: env::var("WEIXIN_TOKEN").context("WEIXIN_TOKEN must be set")?,
            weixin_app_id: env::var("WEIXIN_APP_ID").ok(),
            weixin_app_secret: env::var("WEIXIN_APP_SECRET").ok(),
            weixin_api_base: env::var("WEIXIN_API_BASE")
                .unwrap_or_else(|_| "https://api.weixin.qq.com".into()),
            welcome_text: env::var("WELCOME_TEXT")
                .unwrap_or_else(|_| "Thanks for following! Send a keyword to find articles.".into()),
            store_backend,
            leancloud_app_id: env::var("LEANCLOUD_APP_ID").ok(),
            leancloud_app_key: env::var("LEANCLOUD_APP_KEY").ok(),
            leancloud_api_server: env::var("LEANCLOUD_API_SERVER").ok(),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB
        };

        if config.store_backend == StoreBackend::LeanCloud && !config.has_leancloud() {
            bail!(
                "LEANCLOUD_APP_ID, LEANCLOUD_APP_KEY and LEANCLOUD_API_SERVER must be set \
                 (or use STORE_BACKEND=memory)"
            );
        }

        Ok(config)
    }

    /// Check if the hosted document store is configured.
    #[must_use]
    pub const fn has_leancloud(&self) -> bool {
        self.leancloud_app_id.is_some()
            && self.leancloud_app_key.is_some()
            && self.leancloud_api_server.is_some()
    }

    /// Check if platform API credentials are configured.
    #[must_use]
    pub const fn has_weixin_credentials(&self) -> bool {
        self.weixin_app_id.is_some() && self.weixin_app_secret.is_some()
    }

    /// Create a default configuration for testing.
    ///
    /// Uses the in-memory store and placeholder platform credentials; tests
    /// inject a fake platform client so no request leaves the process.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".into(),
            weixin_token: "test-token".into(),
            weixin_app_id: Some("wx-test-app".into()),
            weixin_app_secret: Some("wx-test-secret".into()),
            weixin_api_base: "http://127.0.0.1:9".into(),
            welcome_text: "Welcome aboard!".into(),
            store_backend: StoreBackend::Memory,
            leancloud_app_id: None,
            leancloud_app_key: None,
            leancloud_api_server: None,
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}
