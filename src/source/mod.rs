//! Content sources
//!
//! Everything the blog shows comes from a [`ContentSource`]. The live site
//! talks to the Prismic API ([`PrismicSource`]); tests and offline setups use
//! [`MemorySource`]. [`CachedSource`] wraps either one and keeps published
//! content fresh for `revalidate` seconds.

mod cached;
mod memory;
mod prismic;

pub use cached::CachedSource;
pub use memory::MemorySource;
pub use prismic::PrismicSource;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{CmsKind, SiteConfig};
use crate::content::{Cursor, PageResult, PostDetail, PostSummary};

/// Failure talking to the content source
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to content source failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content source answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed content source payload: {0}")]
    Decode(String),

    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("content source has no master ref")]
    MissingRef,
}

/// Ordering by first publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicationOrder {
    /// Newest first
    Descending,
    /// Oldest first
    Ascending,
}

impl PublicationOrder {
    /// Prismic `orderings` parameter
    pub fn as_orderings(&self) -> &'static str {
        match self {
            Self::Descending => "[document.first_publication_date desc]",
            Self::Ascending => "[document.first_publication_date]",
        }
    }
}

/// Read access to published (or previewed) posts
///
/// `preview` carries a caller-supplied preview ref; when present the source
/// answers with that ref's content instead of the published one.
#[async_trait]
pub trait ContentSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// First page of posts, newest first
    async fn first_page(
        &self,
        page_size: usize,
        preview: Option<&str>,
    ) -> Result<PageResult, FetchError>;

    /// The page a cursor points at
    async fn fetch_cursor(&self, cursor: &Cursor) -> Result<PageResult, FetchError>;

    /// A single post by uid, `None` when it does not exist
    async fn get_post(
        &self,
        uid: &str,
        preview: Option<&str>,
    ) -> Result<Option<PostDetail>, FetchError>;

    /// The post right after `document_id` in the given ordering
    async fn adjacent_post(
        &self,
        document_id: &str,
        order: PublicationOrder,
        preview: Option<&str>,
    ) -> Result<Option<PostSummary>, FetchError>;
}

/// Build the content source described by the site configuration
pub fn from_config(config: &SiteConfig, base_dir: &Path) -> Result<Arc<dyn ContentSource>> {
    let source: Arc<dyn ContentSource> = match config.cms.kind {
        CmsKind::Prismic => Arc::new(PrismicSource::from_config(&config.cms)?),
        CmsKind::Memory => Arc::new(MemorySource::load(base_dir.join(&config.cms.fixtures))?),
    };

    tracing::info!("Content source: {}", source.name());

    if config.revalidate == 0 {
        return Ok(source);
    }

    Ok(Arc::new(CachedSource::new(
        source,
        Duration::from_secs(config.revalidate),
    )))
}
