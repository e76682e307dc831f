//! Reshare renderer
//!
//! Turns an export of posts into one markdown document per post. Each
//! document restates the post's share tree, oldest reshare first, and links
//! images from a local cache that is filled on demand.
//!

pub mod attribution;
pub mod error;
pub mod image_cache;
pub mod markdown;
pub mod time;
pub mod types;
pub mod utils;
pub mod writer;

pub use error::{ExportError, ImageError, ParseError, RenderError};
pub use image_cache::{CacheKey, DirImageStore, Fetcher, HttpFetcher, ImageCache, ImageStore};
pub use markdown::{MarkdownContext, render_post, render_share_tree};
pub use types::{Actor, Ask, ContentBlock, Image, Post};
pub use writer::{ExportOptions, ExportSummary, ExportWriter};

/// Decode an export document, keeping its text around for error reporting.
pub fn load_export(name: impl AsRef<str>, text: &str) -> Result<Vec<Post>, ParseError> {
    types::parse_export(text).map_err(|e| ParseError::new(name, text, e))
}
