//! Export data model.
//!
//! The export probes blocks and actors by key presence; here both are decoded
//! once into closed enums so rendering can match on them exhaustively.

use serde::Deserialize;

/// One post, as read from the export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Output file stem. Ancestors in a share tree usually don't carry one.
    #[serde(default)]
    pub filename: Option<String>,
    pub poster: Actor,
    pub published_at: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reshare chain leading up to this post, oldest first.
    #[serde(default)]
    pub share_tree: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawActor")]
pub enum Actor {
    Named {
        display_name: String,
        handle: String,
    },
    Anonymous,
}

impl Actor {
    pub fn named(display_name: impl Into<String>, handle: impl Into<String>) -> Self {
        Self::Named {
            display_name: display_name.into(),
            handle: handle.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActor {
    #[serde(default)]
    anon: bool,
    display_name: Option<String>,
    handle: Option<String>,
}

impl TryFrom<RawActor> for Actor {
    type Error = String;

    fn try_from(raw: RawActor) -> Result<Self, Self::Error> {
        if raw.anon {
            return Ok(Actor::Anonymous);
        }
        match (raw.display_name, raw.handle) {
            (Some(display_name), Some(handle)) => Ok(Actor::Named {
                display_name,
                handle,
            }),
            (_, None) => Err("actor is neither anonymous nor has a handle".to_owned()),
            (None, Some(handle)) => Err(format!("actor @{handle} has no displayName")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBlock")]
pub enum ContentBlock {
    /// Markdown, passed through verbatim.
    Text(String),
    Question(Ask),
    Image(Image),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ask {
    pub content: String,
    #[serde(rename = "who")]
    pub sender: Actor,
    pub sent_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Image {
    #[serde(rename = "fileURL")]
    pub url: String,
    #[serde(rename = "altText", default)]
    pub alt_text: Option<String>,
}

#[derive(Deserialize)]
struct RawBlock {
    markdown: Option<MarkdownBody>,
    ask: Option<Ask>,
    img: Option<Image>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarkdownBody {
    Plain(String),
    Wrapped { content: String },
}

impl TryFrom<RawBlock> for ContentBlock {
    type Error = &'static str;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        if let Some(body) = raw.markdown {
            let text = match body {
                MarkdownBody::Plain(text) => text,
                MarkdownBody::Wrapped { content } => content,
            };
            Ok(ContentBlock::Text(text))
        } else if let Some(ask) = raw.ask {
            Ok(ContentBlock::Question(ask))
        } else if let Some(img) = raw.img {
            Ok(ContentBlock::Image(img))
        } else {
            Err("unrecognized content block: expected one of `markdown`, `ask` or `img`")
        }
    }
}

/// Decode a whole export document.
pub fn parse_export(text: &str) -> Result<Vec<Post>, serde_json::Error> {
    serde_json::from_str(text)
}
