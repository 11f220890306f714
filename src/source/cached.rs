//! Time-based revalidation in front of another content source
//!
//! Published content is reused for `ttl` before being fetched again. Preview
//! requests and cursor fetches always go to the inner source, and failures
//! are never stored. Each table is pruned of stale entries on write and holds
//! at most `capacity` entries, so lookups of made-up uids cannot grow it
//! without bound.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{ContentSource, FetchError, PublicationOrder};
use crate::content::{Cursor, PageResult, PostDetail, PostSummary};

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

type Table<K, V> = RwLock<HashMap<K, Entry<V>>>;

/// Entries kept per table
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct CachedSource {
    inner: Arc<dyn ContentSource>,
    ttl: Duration,
    capacity: usize,
    first_pages: Table<usize, PageResult>,
    posts: Table<String, Option<PostDetail>>,
    adjacent: Table<(String, PublicationOrder), Option<PostSummary>>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn ContentSource>, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn ContentSource>, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity: capacity.max(1),
            first_pages: RwLock::new(HashMap::new()),
            posts: RwLock::new(HashMap::new()),
            adjacent: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    async fn clear(&self) {
        self.first_pages.write().await.clear();
        self.posts.write().await.clear();
        self.adjacent.write().await.clear();
    }

    async fn cached<K, V, F>(&self, table: &Table<K, V>, key: K, fetch: F) -> Result<V, FetchError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
        F: Future<Output = Result<V, FetchError>>,
    {
        if let Some(entry) = table.read().await.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
        }

        let value = fetch.await?;

        let mut entries = table.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        while entries.len() >= self.capacity && !entries.contains_key(&key) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }
}

#[async_trait]
impl ContentSource for CachedSource {
    fn name(&self) -> &'static str {
        "cached"
    }

    async fn first_page(
        &self,
        page_size: usize,
        preview: Option<&str>,
    ) -> Result<PageResult, FetchError> {
        if preview.is_some() {
            return self.inner.first_page(page_size, preview).await;
        }
        self.cached(
            &self.first_pages,
            page_size,
            self.inner.first_page(page_size, None),
        )
        .await
    }

    async fn fetch_cursor(&self, cursor: &Cursor) -> Result<PageResult, FetchError> {
        self.inner.fetch_cursor(cursor).await
    }

    async fn get_post(
        &self,
        uid: &str,
        preview: Option<&str>,
    ) -> Result<Option<PostDetail>, FetchError> {
        if preview.is_some() {
            return self.inner.get_post(uid, preview).await;
        }
        self.cached(&self.posts, uid.to_string(), self.inner.get_post(uid, None))
            .await
    }

    async fn adjacent_post(
        &self,
        document_id: &str,
        order: PublicationOrder,
        preview: Option<&str>,
    ) -> Result<Option<PostSummary>, FetchError> {
        if preview.is_some() {
            return self.inner.adjacent_post(document_id, order, preview).await;
        }
        self.cached(
            &self.adjacent,
            (document_id.to_string(), order),
            self.inner.adjacent_post(document_id, order, None),
        )
        .await
    }
}
