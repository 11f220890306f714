//! Detail renderer - everything a single post page needs
//!
//! Reading time is estimated per section at [`WORDS_PER_MINUTE`] and rounded
//! up per section, so the total is the sum of the section estimates rather
//! than an estimate of the total word count.

pub mod comments;

use serde::Serialize;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{rich_text, ContentSection, PostDetail, PostSummary};
use crate::source::{ContentSource, FetchError, PublicationOrder};
use crate::templates::{DateView, EditedView, NavPost, PostView, SectionView};

pub use comments::CommentWidget;

/// Reading speed used for estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Count words: runs of non-whitespace, empty tokens discarded
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in minutes
pub fn compute_reading_time(content: &[ContentSection]) -> u32 {
    content.iter().map(section_reading_time).sum()
}

fn section_reading_time(section: &ContentSection) -> u32 {
    let words = count_words(&rich_text::as_text(&section.body, " "));
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// The posts around the current one in publication order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjacentPosts {
    /// Next older post
    pub prev: Option<PostSummary>,
    /// Next newer post
    pub next: Option<PostSummary>,
}

/// Ask the source for the posts published right before and after `current`
pub async fn resolve_adjacent_posts(
    current: &PostDetail,
    source: &dyn ContentSource,
    preview: Option<&str>,
) -> Result<AdjacentPosts, FetchError> {
    let (prev, next) = tokio::try_join!(
        source.adjacent_post(&current.id, PublicationOrder::Descending, preview),
        source.adjacent_post(&current.id, PublicationOrder::Ascending, preview),
    )?;
    Ok(AdjacentPosts { prev, next })
}

/// Builds post pages from the content source
#[derive(Clone)]
pub struct DetailRenderer {
    source: Arc<dyn ContentSource>,
    config: Arc<SiteConfig>,
}

impl DetailRenderer {
    pub fn new(source: Arc<dyn ContentSource>, config: Arc<SiteConfig>) -> Self {
        Self { source, config }
    }

    /// The view of post `uid`, `None` when the source does not know it
    pub async fn render(
        &self,
        uid: &str,
        preview: Option<&str>,
    ) -> Result<Option<PostView>, FetchError> {
        let Some(post) = self.source.get_post(uid, preview).await? else {
            tracing::debug!("Post not found: {}", uid);
            return Ok(None);
        };

        let adjacent = resolve_adjacent_posts(&post, self.source.as_ref(), preview).await?;
        let mut comments = CommentWidget::new(&self.config.comments);
        Ok(Some(build_view(
            &post,
            adjacent,
            &self.config,
            &mut comments,
            preview.is_some(),
        )))
    }
}

/// Shape a fetched post into its page view
pub fn build_view(
    post: &PostDetail,
    adjacent: AdjacentPosts,
    config: &SiteConfig,
    comments: &mut CommentWidget<'_>,
    preview: bool,
) -> PostView {
    let path = post.path();

    PostView {
        uid: post.uid.clone(),
        title: post.title.clone(),
        subtitle: post.subtitle.clone(),
        banner: post.banner.clone(),
        author: post.author.clone(),
        published: post
            .first_publication_date
            .as_ref()
            .map(|date| DateView::new(date, config)),
        edited: post
            .last_publication_date
            .as_ref()
            .map(|date| EditedView::new(date, config)),
        reading_time: compute_reading_time(&post.content),
        sections: post
            .content
            .iter()
            .map(|section| SectionView {
                heading: section.heading.clone(),
                html: rich_text::as_html(&section.body),
            })
            .collect(),
        prev: adjacent.prev.as_ref().map(NavPost::from),
        next: adjacent.next.as_ref().map(NavPost::from),
        comments: comments.mount(&path),
        path,
        preview,
    }
}
