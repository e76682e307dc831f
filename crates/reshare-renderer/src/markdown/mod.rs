//! Markdown output for posts.
//!
//! A post renders as its attribution line, its content blocks and its tags.
//! A post's document is every post in its share tree, oldest first, followed
//! by the post itself.

#[cfg(test)]
mod tests;

use chrono_tz::Tz;

use crate::attribution::{render_asker, render_poster};
use crate::error::RenderError;
use crate::image_cache::{Fetcher, ImageCache, ImageStore};
use crate::types::{Ask, ContentBlock, Image, Post};

/// Blank line between fragments, blocks and posts.
const SEPARATOR: &str = "\n\n";

pub struct MarkdownContext<F, S> {
    pub zone: Tz,
    pub images: ImageCache<F, S>,
}

impl<F: Fetcher, S: ImageStore> MarkdownContext<F, S> {
    pub fn new(zone: Tz, images: ImageCache<F, S>) -> Self {
        Self { zone, images }
    }
}

/// Full document for a post: its share tree, then the post.
pub fn render_share_tree<F: Fetcher, S: ImageStore>(
    post: &Post,
    ctx: &mut MarkdownContext<F, S>,
) -> Result<String, RenderError> {
    let mut rendered = Vec::with_capacity(post.share_tree.len() + 1);
    for share in &post.share_tree {
        rendered.push(render_post(share, ctx)?);
    }
    rendered.push(render_post(post, ctx)?);
    Ok(rendered.join(SEPARATOR))
}

pub fn render_post<F: Fetcher, S: ImageStore>(
    post: &Post,
    ctx: &mut MarkdownContext<F, S>,
) -> Result<String, RenderError> {
    let who_when = render_poster(&post.poster, &post.published_at, ctx.zone)?;
    let content = render_content(&post.content, ctx)?;
    let tags = render_tags(&post.tags);
    Ok(format!("{who_when}{SEPARATOR}{content}{SEPARATOR}{tags}"))
}

pub fn render_content<F: Fetcher, S: ImageStore>(
    blocks: &[ContentBlock],
    ctx: &mut MarkdownContext<F, S>,
) -> Result<String, RenderError> {
    let rendered = blocks
        .iter()
        .map(|block| render_block(block, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(SEPARATOR))
}

pub fn render_block<F: Fetcher, S: ImageStore>(
    block: &ContentBlock,
    ctx: &mut MarkdownContext<F, S>,
) -> Result<String, RenderError> {
    match block {
        ContentBlock::Text(markdown) => Ok(markdown.clone()),
        ContentBlock::Question(ask) => render_ask(ask, ctx.zone),
        ContentBlock::Image(image) => render_image(image, &mut ctx.images),
    }
}

/// `#a, #b`, or nothing at all for an untagged post.
pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_ask(ask: &Ask, zone: Tz) -> Result<String, RenderError> {
    let who_when = render_asker(&ask.sender, &ask.sent_at, zone)?;
    let mut md = who_when;
    md.push_str(SEPARATOR);
    md.push_str("```quote\n");
    md.push_str(&ask.content);
    if !ask.content.ends_with('\n') {
        md.push('\n');
    }
    md.push_str("```");
    Ok(md)
}

fn render_image<F: Fetcher, S: ImageStore>(
    image: &Image,
    images: &mut ImageCache<F, S>,
) -> Result<String, RenderError> {
    let dest = images.resolve(&image.url)?;
    let alt = image.alt_text.as_deref().map(flatten_alt).unwrap_or_default();
    Ok(format!("![{alt}]({dest})"))
}

/// Image alt text can't span lines in markdown, so line breaks become spaces.
pub fn flatten_alt(alt: &str) -> String {
    alt.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
