//! Local cache for images referenced by posts.
//!
//! Images are fetched once and stored under a basename derived from their URL.
//! An existing file under that basename is never fetched again, whichever URL
//! produced it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

use crate::error::ImageError;

/// Fetches the bytes behind a URL.
pub trait Fetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImageError>;
}

/// Where cached images live.
pub trait ImageStore {
    fn contains(&self, name: &str) -> bool;
    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ImageError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("reshare/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, ImageError> {
        let wrap = |e: reqwest::Error| ImageError::Fetch {
            url: url.to_string(),
            source: Box::new(e),
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(wrap)?;
        let bytes = response.bytes().map_err(wrap)?;
        Ok(bytes.to_vec())
    }
}

/// Image store backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirImageStore {
    dir: PathBuf,
}

impl DirImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ImageStore for DirImageStore {
    fn contains(&self, name: &str) -> bool {
        self.dir.join(name).exists()
    }

    fn put(&mut self, name: &str, bytes: &[u8]) -> Result<(), ImageError> {
        let dest = self.dir.join(name);
        // write beside the destination, then move it into place
        let partial = self.dir.join(format!(".{name}.part"));
        let result = std::fs::write(&partial, bytes)
            .map_err(|source| ImageError::Store {
                path: partial.clone(),
                source,
            })
            .and_then(|()| {
                std::fs::rename(&partial, &dest).map_err(|source| ImageError::Store {
                    path: dest.clone(),
                    source,
                })
            });
        if result.is_err() {
            let _ = std::fs::remove_file(&partial);
        }
        result
    }
}

/// How the cached file name is derived from an image URL.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey {
    /// Parent path segment plus the file extension: `/abc123/photo.png` is `abc123.png`.
    /// Two URLs sharing a parent segment and extension share a cache entry.
    #[default]
    PathSegment,
    /// Digest of the whole URL plus the file extension.
    UrlHash,
}

impl FromStr for CacheKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path-segment" => Ok(Self::PathSegment),
            "url-hash" => Ok(Self::UrlHash),
            other => Err(format!(
                "unknown cache key {other:?}, expected `path-segment` or `url-hash`"
            )),
        }
    }
}

impl CacheKey {
    /// Name of the cached file for `url`, percent-decoded.
    pub fn basename(&self, url: &Url) -> Result<String, ImageError> {
        let segments: Vec<String> = url
            .path_segments()
            .map(|s| s.map(decode_segment).collect())
            .unwrap_or_default();
        let extension = segments
            .last()
            .and_then(|last| Path::new(last).extension())
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let name = match self {
            // no parent directory in the path: the host stands in for it
            CacheKey::PathSegment => match segments.len().checked_sub(2) {
                Some(i) => format!("{}{extension}", segments[i]),
                None => match url.host_str() {
                    Some(host) => format!("{host}{extension}"),
                    None => String::new(),
                },
            },
            CacheKey::UrlHash => {
                let digest = blake3::hash(url.as_str().as_bytes()).to_hex();
                format!("{}{extension}", &digest.as_str()[..16])
            }
        };
        if name.is_empty() {
            return Err(ImageError::NoBasename(url.to_string()));
        }
        Ok(name)
    }
}

/// Percent-decode a path segment for use in a file name. Segments that don't
/// decode to UTF-8, or that would decode to a path separator, stay encoded.
fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) if !decoded.contains(['/', '\\']) => decoded.into_owned(),
        _ => segment.to_owned(),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub fetched: usize,
    pub reused: usize,
}

pub struct ImageCache<F, S> {
    fetcher: F,
    store: S,
    key: CacheKey,
    link_prefix: String,
    stats: CacheStats,
}

impl<F: Fetcher, S: ImageStore> ImageCache<F, S> {
    /// `link_prefix` is the path from the rendered documents to the image store, e.g. `../img`.
    pub fn new(fetcher: F, store: S, key: CacheKey, link_prefix: impl Into<String>) -> Self {
        let mut link_prefix = link_prefix.into();
        while link_prefix.ends_with('/') {
            link_prefix.pop();
        }
        Self {
            fetcher,
            store,
            key,
            link_prefix,
            stats: CacheStats::default(),
        }
    }

    /// Make sure the image behind `url` is cached and return the link to it.
    pub fn resolve(&mut self, url: &str) -> Result<String, ImageError> {
        let parsed = Url::parse(url).map_err(|e| ImageError::InvalidUrl(url.to_owned(), e))?;
        let basename = self.key.basename(&parsed)?;

        if self.store.contains(&basename) {
            tracing::debug!(%url, %basename, "image already cached");
            self.stats.reused += 1;
        } else {
            tracing::debug!(%url, %basename, "fetching image");
            let bytes = self.fetcher.fetch(&parsed)?;
            self.store.put(&basename, &bytes)?;
            self.stats.fetched += 1;
        }

        Ok(self.link_to(&basename))
    }

    fn link_to(&self, basename: &str) -> String {
        if self.link_prefix.is_empty() {
            urlencoding::encode(basename).into_owned()
        } else {
            format!("{}/{}", self.link_prefix, urlencoding::encode(basename))
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}
