//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::rich_text::RichTextFragment;
use super::timestamp;

/// A post as it appears on the listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Unique slug
    pub uid: String,

    /// First publication date, absent for never-published drafts
    #[serde(default, with = "timestamp::option")]
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    #[serde(default)]
    pub author: String,
}

impl PostSummary {
    /// URL path of the post page
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }
}

/// A full post as rendered on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    /// Document id in the content source, used for adjacency queries
    pub id: String,

    /// Unique slug
    pub uid: String,

    #[serde(default, with = "timestamp::option")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "timestamp::option")]
    pub last_publication_date: Option<DateTime<Utc>>,

    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    /// Banner image url
    #[serde(default)]
    pub banner: Option<String>,

    #[serde(default)]
    pub author: String,

    /// Ordered content sections
    #[serde(default)]
    pub content: Vec<ContentSection>,
}

impl PostDetail {
    /// URL path of the post page
    pub fn path(&self) -> String {
        post_path(&self.uid)
    }

    /// The listing view of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

/// A heading followed by rich-text body fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub heading: String,

    #[serde(default)]
    pub body: Vec<RichTextFragment>,
}

/// Opaque pagination token handed out by the content source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of posts plus the cursor of the page after it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub results: Vec<PostSummary>,
    pub next_page: Option<Cursor>,
}

fn post_path(uid: &str) -> String {
    format!("/post/{}", uid)
}
