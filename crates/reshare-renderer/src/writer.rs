//! Export writer
//!
//! Renders every post of an export into its own markdown file, caching the
//! images they reference along the way. Posts are handled one at a time in
//! export order.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::error::ExportError;
use crate::image_cache::{CacheKey, CacheStats, DirImageStore, Fetcher, ImageCache};
use crate::markdown::{MarkdownContext, render_share_tree};
use crate::types::Post;
use crate::utils::relative_link;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Rendered documents go here, one `<filename>.md` per post.
    pub output_dir: PathBuf,
    /// Cached images go here.
    pub image_dir: PathBuf,
    /// Zone timestamps are displayed in.
    pub zone: Tz,
    pub cache_key: CacheKey,
    /// Log failing posts and carry on instead of stopping at the first one.
    pub keep_going: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("rendered"),
            image_dir: PathBuf::from("img"),
            zone: Tz::UTC,
            cache_key: CacheKey::default(),
            keep_going: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    /// Filenames of posts that failed to render, when keeping going.
    pub failed: Vec<String>,
    pub images: CacheStats,
}

impl ExportSummary {
    /// Turn a run with failed posts into an error.
    pub fn check(self) -> Result<Self, ExportError> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(ExportError::Partial {
                total: self.written.len() + self.failed.len(),
                failed: self.failed,
            })
        }
    }
}

pub struct ExportWriter<F: Fetcher> {
    options: ExportOptions,
    context: MarkdownContext<F, DirImageStore>,
}

impl<F: Fetcher> ExportWriter<F> {
    pub fn new(options: ExportOptions, fetcher: F) -> Result<Self, ExportError> {
        let link_prefix = relative_link(&options.output_dir, &options.image_dir)
            .map_err(|source| ExportError::Io {
                path: options.image_dir.clone(),
                source,
            })?;
        let images = ImageCache::new(
            fetcher,
            DirImageStore::new(&options.image_dir),
            options.cache_key,
            link_prefix,
        );
        let context = MarkdownContext::new(options.zone, images);
        Ok(Self { options, context })
    }

    pub fn run(mut self, posts: &[Post]) -> Result<ExportSummary, ExportError> {
        create_dir(&self.options.output_dir)?;
        create_dir(&self.options.image_dir)?;

        let mut summary = ExportSummary::default();
        for (index, post) in posts.iter().enumerate() {
            match self.write_post(index, post) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "wrote post");
                    summary.written.push(path);
                }
                Err(e) if self.options.keep_going => {
                    let name = post
                        .filename
                        .clone()
                        .unwrap_or_else(|| format!("#{index}"));
                    tracing::warn!(post = %name, error = %e, "skipping post");
                    summary.failed.push(name);
                }
                Err(e) => return Err(e),
            }
        }

        summary.images = self.context.images.stats();
        Ok(summary)
    }

    fn write_post(&mut self, index: usize, post: &Post) -> Result<PathBuf, ExportError> {
        let filename = post
            .filename
            .as_deref()
            .ok_or(ExportError::MissingFilename(index))?;
        let rendered =
            render_share_tree(post, &mut self.context).map_err(|source| ExportError::Render {
                filename: filename.to_owned(),
                source,
            })?;

        let path = self.options.output_dir.join(format!("{filename}.md"));
        std::fs::write(&path, rendered).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn create_dir(dir: &Path) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}
