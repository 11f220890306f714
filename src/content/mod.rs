//! Content module - post models and rich-text handling

mod post;
pub mod rich_text;
pub mod timestamp;

pub use post::{ContentSection, Cursor, PageResult, PostDetail, PostSummary};
pub use rich_text::RichTextFragment;
