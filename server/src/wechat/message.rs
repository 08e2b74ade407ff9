//! Inbound Message Types
//!
//! Callback payloads arrive as XML documents:
//!
//! ```xml
//! <xml>
//!   <ToUserName><![CDATA[gh_account]]></ToUserName>
//!   <FromUserName><![CDATA[openid]]></FromUserName>
//!   <CreateTime>1700000000</CreateTime>
//!   <MsgType><![CDATA[text]]></MsgType>
//!   <Content><![CDATA[hello]]></Content>
//!   <MsgId>1234567890123456</MsgId>
//! </xml>
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Failure to read a callback body.
#[derive(Debug, Error)]
#[error("Invalid message body: {0}")]
pub struct ParseError(String);

/// Wire shape of a callback body.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "ToUserName")]
    to_user: String,
    #[serde(rename = "FromUserName")]
    from_user: String,
    #[serde(rename = "CreateTime", default)]
    create_time: i64,
    #[serde(rename = "MsgType")]
    msg_type: String,
    #[serde(rename = "Content")]
    content: Option<String>,
    #[serde(rename = "Event")]
    event: Option<String>,
    #[serde(rename = "EventKey")]
    event_key: Option<String>,
    #[serde(rename = "MsgId")]
    msg_id: Option<String>,
}

/// Event subtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Subscribe,
    Unsubscribe,
    Scan,
    Click,
    Location,
    TemplateSendJobFinish,
    MassSendJobFinish,
    UserAuthorizeInvoice,
    UpdateInvoiceStatus,
    SubmitInvoiceTitle,
    UserScanProduct,
    UserScanProductEnterSession,
    UserScanProductAsync,
    UserScanProductVerifyAction,
    /// Any tag not listed above, lowercased.
    Unrecognized(String),
}

impl EventKind {
    /// Parse an event tag; matching is case-insensitive.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "subscribe" => Self::Subscribe,
            "unsubscribe" => Self::Unsubscribe,
            "scan" => Self::Scan,
            "click" => Self::Click,
            "location" => Self::Location,
            "templatesendjobfinish" => Self::TemplateSendJobFinish,
            "masssendjobfinish" => Self::MassSendJobFinish,
            "user_authorize_invoice" => Self::UserAuthorizeInvoice,
            "update_invoice_status" => Self::UpdateInvoiceStatus,
            "submit_invoice_title" => Self::SubmitInvoiceTitle,
            "user_scan_product" => Self::UserScanProduct,
            "user_scan_product_enter_session" => Self::UserScanProductEnterSession,
            "user_scan_product_async" => Self::UserScanProductAsync,
            "user_scan_product_verify_action" => Self::UserScanProductVerifyAction,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Recognized events that are acknowledged without a reply.
    pub const fn is_inert(&self) -> bool {
        matches!(
            self,
            Self::Scan
                | Self::Click
                | Self::Location
                | Self::TemplateSendJobFinish
                | Self::MassSendJobFinish
                | Self::UserAuthorizeInvoice
                | Self::UpdateInvoiceStatus
                | Self::SubmitInvoiceTitle
                | Self::UserScanProduct
                | Self::UserScanProductEnterSession
                | Self::UserScanProductAsync
                | Self::UserScanProductVerifyAction
        )
    }
}

/// Message body, discriminated by `MsgType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text {
        content: String,
    },
    Event {
        event: EventKind,
        key: Option<String>,
    },
    /// image, voice, video, shortvideo, location, link, ...
    Other {
        msg_type: String,
    },
}

/// A parsed callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The official account that received the message.
    pub to_user: String,
    /// The sender's openid.
    pub from_user: String,
    pub create_time: i64,
    pub msg_id: Option<String>,
    pub kind: MessageKind,
}

impl InboundMessage {
    /// Parse an XML callback body.
    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let raw: RawMessage =
            quick_xml::de::from_str(body).map_err(|e| ParseError(e.to_string()))?;

        let kind = match raw.msg_type.trim().to_ascii_lowercase().as_str() {
            "text" => MessageKind::Text {
                content: raw.content.unwrap_or_default(),
            },
            "event" => MessageKind::Event {
                event: EventKind::parse(raw.event.as_deref().unwrap_or_default()),
                key: raw.event_key.filter(|k| !k.is_empty()),
            },
            other => MessageKind::Other {
                msg_type: other.to_string(),
            },
        };

        Ok(Self {
            to_user: raw.to_user,
            from_user: raw.from_user,
            create_time: raw.create_time,
            msg_id: raw.msg_id,
            kind,
        })
    }
}
