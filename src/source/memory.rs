//! In-memory content source, loaded from a YAML fixtures file

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{ContentSource, FetchError, PublicationOrder};
use crate::content::{Cursor, PageResult, PostDetail, PostSummary};

const CURSOR_PREFIX: &str = "memory:";

/// Fixtures file layout
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub posts: Vec<PostDetail>,
}

/// Posts held in memory, newest first
///
/// Preview refs are accepted and ignored: there is no draft content here.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    posts: Vec<PostDetail>,
}

impl MemorySource {
    pub fn new(mut posts: Vec<PostDetail>) -> Self {
        // Stable sort, undated posts last
        posts.sort_by(|a, b| b.first_publication_date.cmp(&a.first_publication_date));
        Self { posts }
    }

    /// Load posts from a fixtures file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures {:?}", path))?;
        let fixtures: Fixtures = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse fixtures {:?}", path))?;
        tracing::debug!("Loaded {} posts from {:?}", fixtures.posts.len(), path);
        Ok(Self::new(fixtures.posts))
    }

    pub fn posts(&self) -> &[PostDetail] {
        &self.posts
    }

    /// Page `page` (1-based) of `page_size` posts
    fn page(&self, page: usize, page_size: usize) -> PageResult {
        let start = (page - 1).saturating_mul(page_size);
        let results = self
            .posts
            .iter()
            .skip(start)
            .take(page_size)
            .map(PostDetail::summary)
            .collect();

        let next_page = (start.saturating_add(page_size) < self.posts.len())
            .then(|| encode_cursor(page + 1, page_size));

        PageResult { results, next_page }
    }

    fn position(&self, document_id: &str) -> Option<usize> {
        self.posts.iter().position(|post| post.id == document_id)
    }
}

fn encode_cursor(page: usize, page_size: usize) -> Cursor {
    Cursor::new(format!("{}page={}&pageSize={}", CURSOR_PREFIX, page, page_size))
}

fn decode_cursor(cursor: &Cursor) -> Result<(usize, usize), FetchError> {
    let invalid = || FetchError::InvalidCursor(cursor.to_string());
    let query = cursor.as_str().strip_prefix(CURSOR_PREFIX).ok_or_else(invalid)?;

    let mut page = None;
    let mut page_size = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("page", value)) => page = value.parse::<usize>().ok(),
            Some(("pageSize", value)) => page_size = value.parse::<usize>().ok(),
            _ => return Err(invalid()),
        }
    }

    match (page, page_size) {
        (Some(page), Some(page_size)) if page > 0 && page_size > 0 => Ok((page, page_size)),
        _ => Err(invalid()),
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn first_page(
        &self,
        page_size: usize,
        _preview: Option<&str>,
    ) -> Result<PageResult, FetchError> {
        Ok(self.page(1, page_size.max(1)))
    }

    async fn fetch_cursor(&self, cursor: &Cursor) -> Result<PageResult, FetchError> {
        let (page, page_size) = decode_cursor(cursor)?;
        Ok(self.page(page, page_size))
    }

    async fn get_post(
        &self,
        uid: &str,
        _preview: Option<&str>,
    ) -> Result<Option<PostDetail>, FetchError> {
        Ok(self.posts.iter().find(|post| post.uid == uid).cloned())
    }

    async fn adjacent_post(
        &self,
        document_id: &str,
        order: PublicationOrder,
        _preview: Option<&str>,
    ) -> Result<Option<PostSummary>, FetchError> {
        let Some(index) = self.position(document_id) else {
            return Ok(None);
        };

        let adjacent = match order {
            PublicationOrder::Descending => self.posts.get(index + 1),
            PublicationOrder::Ascending => index.checked_sub(1).and_then(|i| self.posts.get(i)),
        };
        Ok(adjacent.map(PostDetail::summary))
    }
}
