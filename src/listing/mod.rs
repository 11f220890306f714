//! Listing controller - the paginated post listing
//!
//! A [`ListingState`] starts from the first page and grows by appending
//! whatever the stored cursor points at. States are values: `load_more`
//! returns a new state and leaves the old one alone, so a failed fetch never
//! leaves a half-appended list behind.

pub mod sessions;

use serde::Serialize;
use std::sync::Arc;

use crate::content::{Cursor, PageResult, PostSummary};
use crate::source::{ContentSource, FetchError};

pub use sessions::{Session, SessionBusy, SessionStore};

/// Posts loaded so far plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingState {
    posts: Vec<PostSummary>,
    next_page: Option<Cursor>,
}

impl ListingState {
    /// Seed a listing with its first page
    pub fn initialize(first_page: PageResult) -> Self {
        Self {
            posts: first_page.results,
            next_page: first_page.next_page,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&Cursor> {
        self.next_page.as_ref()
    }

    /// Whether a "load more" action should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// This state followed by `page`, in the order the source returned it
    fn extended(&self, page: PageResult) -> Self {
        let mut posts = Vec::with_capacity(self.posts.len() + page.results.len());
        posts.extend_from_slice(&self.posts);
        posts.extend(page.results);
        Self {
            posts,
            next_page: page.next_page,
        }
    }
}

/// Drives a listing against a content source
#[derive(Clone)]
pub struct ListingController {
    source: Arc<dyn ContentSource>,
    page_size: usize,
}

impl ListingController {
    pub fn new(source: Arc<dyn ContentSource>, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
        }
    }

    /// Fetch the first page and seed a listing with it
    pub async fn first_page(&self, preview: Option<&str>) -> Result<ListingState, FetchError> {
        let page = self.source.first_page(self.page_size, preview).await?;
        tracing::debug!(
            "First page: {} posts, more: {}",
            page.results.len(),
            page.next_page.is_some()
        );
        Ok(ListingState::initialize(page))
    }

    /// Append the page behind the state's cursor
    ///
    /// Without a cursor there is nothing left to load: no fetch is issued and
    /// an identical state comes back.
    pub async fn load_more(&self, state: &ListingState) -> Result<ListingState, FetchError> {
        let Some(cursor) = state.next_page() else {
            tracing::debug!("Load more without a cursor, nothing to fetch");
            return Ok(state.clone());
        };

        let page = self.source.fetch_cursor(cursor).await.map_err(|e| {
            tracing::warn!("Failed to load more posts from {}: {}", cursor, e);
            e
        })?;

        tracing::debug!(
            "Loaded {} more posts after {}",
            page.results.len(),
            state.posts().len()
        );
        Ok(state.extended(page))
    }
}
