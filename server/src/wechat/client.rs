//! Platform API Client
//!
//! Access tokens and permanent media uploads. Tokens are cached until shortly
//! before the platform says they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::Config;

/// Refresh tokens this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Platform errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// App id/secret are not configured.
    #[error("Platform credentials are not configured")]
    NotConfigured,

    /// The platform answered with an `errcode`.
    #[error("{message}")]
    Api {
        /// Platform `errcode`.
        code: i64,
        /// Platform `errmsg`.
        message: String,
    },

    /// The platform could not be reached.
    #[error("Platform request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered with something we could not read.
    #[error("Unexpected platform response: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Platform error code, if any.
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Permanent media types accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Voice,
    Video,
    Thumb,
}

impl MediaKind {
    /// Parse a `media_type` form value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "voice" => Some(Self::Voice),
            "video" => Some(Self::Video),
            "thumb" => Some(Self::Thumb),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Thumb => "thumb",
        }
    }
}

/// A file to upload as permanent media.
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub kind: MediaKind,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
    pub title: String,
    pub introduction: String,
}

/// Result of a media upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedMaterial {
    pub media_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Chat platform API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Current OAuth access token.
    async fn access_token(&self) -> Result<String, PlatformError>;

    /// Upload permanent media.
    async fn upload_material(
        &self,
        upload: MaterialUpload,
    ) -> Result<UploadedMaterial, PlatformError>;
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    media_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl ApiEnvelope {
    fn check(self) -> Result<Self, PlatformError> {
        match self.errcode {
            Some(code) if code != 0 => Err(PlatformError::Api {
                code,
                message: self.errmsg.unwrap_or_default(),
            }),
            _ => Ok(self),
        }
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// REST client for the official-account API.
pub struct WeixinClient {
    http: reqwest::Client,
    api_base: String,
    credentials: Option<(String, String)>,
    token: RwLock<Option<CachedToken>>,
}

impl WeixinClient {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        credentials: Option<(String, String)>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            token: RwLock::new(None),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        let credentials = config
            .weixin_app_id
            .clone()
            .zip(config.weixin_app_secret.clone());
        Self::new(http, config.weixin_api_base.clone(), credentials)
    }

    #[instrument(skip(self))]
    async fn fetch_token(&self) -> Result<CachedToken, PlatformError> {
        let (app_id, app_secret) = self.credentials.as_ref().ok_or(PlatformError::NotConfigured)?;

        let envelope: ApiEnvelope = self
            .http
            .get(format!("{}/cgi-bin/token", self.api_base))
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", app_id.as_str()),
                ("secret", app_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        let envelope = envelope.check()?;

        let value = envelope
            .access_token
            .ok_or_else(|| PlatformError::Decode("missing access_token".into()))?;
        let lifetime = Duration::from_secs(envelope.expires_in.unwrap_or(7200));

        info!(expires_in = lifetime.as_secs(), "Fetched platform access token");
        Ok(CachedToken {
            value,
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN),
        })
    }
}

#[async_trait]
impl PlatformApi for WeixinClient {
    async fn access_token(&self) -> Result<String, PlatformError> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let value = fresh.value.clone();
        *slot = Some(fresh);
        Ok(value)
    }

    #[instrument(skip(self, upload), fields(kind = upload.kind.as_str(), filename = %upload.filename))]
    async fn upload_material(
        &self,
        upload: MaterialUpload,
    ) -> Result<UploadedMaterial, PlatformError> {
        let token = self.access_token().await?;

        let description = serde_json::json!({
            "title": upload.title,
            "introduction": upload.introduction,
        });
        let media = reqwest::multipart::Part::bytes(upload.data.to_vec())
            .file_name(upload.filename.clone())
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("media", media)
            .text("description", description.to_string());

        let envelope: ApiEnvelope = self
            .http
            .post(format!("{}/cgi-bin/material/add_material", self.api_base))
            .query(&[("access_token", token.as_str()), ("type", upload.kind.as_str())])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))?;
        let envelope = envelope.check()?;

        let media_id = envelope
            .media_id
            .ok_or_else(|| PlatformError::Decode("missing media_id".into()))?;
        debug!(media_id = %media_id, "Uploaded permanent media");

        Ok(UploadedMaterial {
            media_id,
            url: envelope.url,
        })
    }
}
