//! utterances comment widget

use std::collections::HashSet;

use crate::config::CommentsConfig;
use crate::helpers::{html_escape, script_tag};

/// Anchor the widget script is mounted into
pub const COMMENTS_ANCHOR: &str = "inject-comments-for-uterances";

/// Issues the widget embed for a post view
///
/// One widget lives for one page view. Mounting the same path twice yields
/// nothing the second time, so a thread is never embedded twice on a page.
#[derive(Debug)]
pub struct CommentWidget<'a> {
    config: &'a CommentsConfig,
    mounted: HashSet<String>,
}

impl<'a> CommentWidget<'a> {
    pub fn new(config: &'a CommentsConfig) -> Self {
        Self {
            config,
            mounted: HashSet::new(),
        }
    }

    /// Embed markup threaded by `path`, `None` when disabled or already mounted
    pub fn mount(&mut self, path: &str) -> Option<String> {
        if !self.config.enable || !self.mounted.insert(path.to_string()) {
            return None;
        }

        tracing::debug!("Mounting comments for {}", path);
        let script = script_tag(&[
            ("src", self.config.script.as_str()),
            ("crossorigin", "anonymous"),
            ("async", "true"),
            ("repo", self.config.repo.as_str()),
            ("issue-term", self.config.issue_term.as_str()),
            ("theme", self.config.theme.as_str()),
        ]);

        Some(format!(
            r#"<div id="{}" data-thread="{}">{}</div>"#,
            COMMENTS_ANCHOR,
            html_escape(path),
            script
        ))
    }
}
