//! Passive Reply Rendering
//!
//! Replies are XML documents addressed back to the sender. A callback that
//! needs no reply is answered with the literal body `success`.

use crate::models::Article;

/// Body acknowledging a callback without replying.
pub const ACK_BODY: &str = "success";

/// One card in a news reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub pic_url: String,
    pub url: String,
}

impl From<Article> for NewsItem {
    fn from(article: Article) -> Self {
        Self {
            title: article.title,
            description: article.description,
            pic_url: article.image,
            url: article.url,
        }
    }
}

/// What to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    News(Vec<NewsItem>),
    /// Acknowledge only.
    None,
}

/// A reply addressed to the sender of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    /// The sender's openid.
    pub to_user: String,
    /// The official account.
    pub from_user: String,
    pub create_time: i64,
    pub reply: Reply,
}

/// Wrap text in a CDATA section, splitting any embedded terminator.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

impl ReplyPayload {
    /// Whether there is anything to send.
    pub const fn is_silent(&self) -> bool {
        matches!(self.reply, Reply::None)
    }

    /// Render the response body.
    pub fn to_xml(&self) -> String {
        let header = format!(
            "<ToUserName>{}</ToUserName><FromUserName>{}</FromUserName><CreateTime>{}</CreateTime>",
            cdata(&self.to_user),
            cdata(&self.from_user),
            self.create_time
        );

        match &self.reply {
            Reply::None => ACK_BODY.to_string(),
            Reply::Text(content) => format!(
                "<xml>{header}<MsgType>{}</MsgType><Content>{}</Content></xml>",
                cdata("text"),
                cdata(content)
            ),
            Reply::News(items) => {
                let articles: String = items
                    .iter()
                    .map(|item| {
                        format!(
                            "<item><Title>{}</Title><Description>{}</Description>\
                             <PicUrl>{}</PicUrl><Url>{}</Url></item>",
                            cdata(&item.title),
                            cdata(&item.description),
                            cdata(&item.pic_url),
                            cdata(&item.url)
                        )
                    })
                    .collect();
                format!(
                    "<xml>{header}<MsgType>{}</MsgType><ArticleCount>{}</ArticleCount>\
                     <Articles>{articles}</Articles></xml>",
                    cdata("news"),
                    items.len()
                )
            }
        }
    }
}
