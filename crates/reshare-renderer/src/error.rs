use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use thiserror::Error;

/// Errors rendering a single post
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    /// Timestamp not in the export format
    #[error("malformed timestamp {input:?}")]
    #[diagnostic(
        code(reshare::render::timestamp),
        help("timestamps look like 2022-04-01T12:00:00.000000+0000")
    )]
    Timestamp {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Poster marked anonymous; only askers may be
    #[error("posts must be attributed to a named account, found an anonymous poster")]
    #[diagnostic(code(reshare::render::anonymous_poster))]
    AnonymousPoster,

    /// Image could not be cached
    #[error(transparent)]
    #[diagnostic(transparent)]
    Image(#[from] ImageError),
}

/// Errors resolving an image into the local cache
#[derive(Debug, Error, Diagnostic)]
pub enum ImageError {
    /// URL failed to parse
    #[error("invalid image url: {0}")]
    #[diagnostic(code(reshare::image::invalid_url))]
    InvalidUrl(String, #[source] url::ParseError),

    /// Nothing in the URL to name the cached file after
    #[error("image url {0} has neither a path nor a host to name the cached file after")]
    #[diagnostic(
        code(reshare::image::no_basename),
        help("use the url-hash cache key for urls like this")
    )]
    NoBasename(String),

    /// Transport error or error status while fetching
    #[error("failed to fetch image {url}")]
    #[diagnostic(code(reshare::image::fetch))]
    Fetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cached image could not be written
    #[error("failed to store cached image at {}", path.display())]
    #[diagnostic(code(reshare::image::store))]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors exporting a batch of posts
#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    /// Export document failed to decode
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// A post failed to render
    #[error("failed to render post {filename}")]
    #[diagnostic(code(reshare::export::render))]
    Render {
        filename: String,
        #[source]
        #[diagnostic_source]
        source: RenderError,
    },

    /// Top-level post without an output filename
    #[error("post #{0} in the export has no filename")]
    #[diagnostic(code(reshare::export::missing_filename))]
    MissingFilename(usize),

    /// Output directory or document could not be written
    #[error("failed to write {}", path.display())]
    #[diagnostic(code(reshare::export::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some posts failed while keeping going
    #[error("{} of {} posts failed to render: {}", .failed.len(), .total, .failed.join(", "))]
    #[diagnostic(code(reshare::export::partial))]
    Partial { total: usize, failed: Vec<String> },
}

/// Export document failed to decode, with the offending location.
#[derive(Debug, Error, Diagnostic)]
#[error("parse error: {source}")]
#[diagnostic(code(reshare::parse))]
pub struct ParseError {
    source: serde_json::Error,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    err_location: SourceSpan,
}

impl ParseError {
    pub fn new(name: impl AsRef<str>, text: &str, source: serde_json::Error) -> Self {
        // serde_json reports 1-based lines and columns, with column 0 at EOF
        let offset = if source.line() == 0 {
            0
        } else {
            SourceOffset::from_location(text, source.line(), source.column().max(1)).offset()
        };
        Self {
            source,
            src: NamedSource::new(name, text.to_owned()),
            err_location: SourceSpan::new(offset.into(), 0),
        }
    }

    pub fn line(&self) -> usize {
        self.source.line()
    }
}
