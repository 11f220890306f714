//! Built-in templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on: everything
//! coming from the content source is escaped unless a template marks it
//! `safe`, which only the pre-rendered rich text and the comment embed are.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::PostSummary;
use crate::helpers::{date_xml, format_date, html_escape};
use crate::listing::ListingState;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        // Same escaping as the rest of the crate; Tera's default also encodes '/'
        tera.set_escape_fn(html_escape);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("error.html", include_str!("site/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
            (
                "partials/preview.html",
                include_str!("site/partials/preview.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Context shared by every page
pub fn base_context(
    site: &SiteData,
    translations: &HashMap<String, String>,
    preview: bool,
) -> Context {
    let mut context = Context::new();
    context.insert("site", site);
    context.insert("t", translations);
    context.insert("preview", &preview);
    context
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        return Ok(tera::Value::String(s));
    }

    let truncated: String = s.chars().take(length).collect();
    Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateView {
    /// Machine-readable, for `<time datetime>`
    pub datetime: String,
    pub display: String,
}

impl DateView {
    pub fn new(date: &DateTime<Utc>, config: &SiteConfig) -> Self {
        Self {
            datetime: date_xml(date),
            display: format_date(date, &config.date_format, &config.language, &config.timezone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedView {
    pub datetime: String,
    pub date: String,
    pub time: String,
}

impl EditedView {
    pub fn new(date: &DateTime<Utc>, config: &SiteConfig) -> Self {
        Self {
            datetime: date_xml(date),
            date: format_date(date, &config.date_format, &config.language, &config.timezone),
            time: format_date(date, &config.time_format, &config.language, &config.timezone),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub published: Option<DateView>,
}

impl PostCard {
    pub fn new(post: &PostSummary, config: &SiteConfig) -> Self {
        Self {
            uid: post.uid.clone(),
            path: post.path(),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            published: post
                .first_publication_date
                .as_ref()
                .map(|date| DateView::new(date, config)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    pub posts: Vec<PostCard>,
    pub has_more: bool,
    /// Message shown above the load-more action, e.g. after a failed fetch
    pub notice: Option<String>,
}

impl ListingView {
    pub fn new(state: &ListingState, config: &SiteConfig, notice: Option<String>) -> Self {
        Self {
            posts: state
                .posts()
                .iter()
                .map(|post| PostCard::new(post, config))
                .collect(),
            has_more: state.has_more(),
            notice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

impl From<&PostSummary> for NavPost {
    fn from(post: &PostSummary) -> Self {
        Self {
            title: post.title.clone(),
            path: post.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub heading: String,
    /// Rendered rich text, inserted unescaped
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub banner: Option<String>,
    pub author: String,
    pub published: Option<DateView>,
    pub edited: Option<EditedView>,
    /// Minutes
    pub reading_time: u32,
    pub sections: Vec<SectionView>,
    pub prev: Option<NavPost>,
    pub next: Option<NavPost>,
    /// Comment widget embed, inserted unescaped
    pub comments: Option<String>,
    pub preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Cursor, PageResult};
    use crate::i18n::I18n;

    fn context(preview: bool) -> Context {
        let config = SiteConfig::default();
        base_context(
            &SiteData::from(&config),
            &I18n::new(&config.language).get_all_translations(),
            preview,
        )
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: chrono::DateTime::from_timestamp(1_616_700_455, 0),
            title: title.to_string(),
            subtitle: "Sub".to_string(),
            author: "Autora".to_string(),
        }
    }

    #[test]
    fn test_render_listing_with_more() {
        let renderer = TemplateRenderer::new().unwrap();
        let state = ListingState::initialize(PageResult {
            results: vec![summary("a", "<script>alert(1)</script>")],
            next_page: Some(Cursor::new("c")),
        });

        let mut ctx = context(false);
        ctx.insert(
            "listing",
            &ListingView::new(&state, &SiteConfig::default(), None),
        );
        let html = renderer.render("index.html", &ctx).unwrap();

        assert!(html.contains(r#"href="/post/a""#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains("25 mar 2021"));
        assert!(!html.contains("Sair do modo Preview"));
    }

    #[test]
    fn test_render_listing_exhausted_in_preview() {
        let renderer = TemplateRenderer::new().unwrap();
        let state = ListingState::initialize(PageResult {
            results: vec![summary("a", "A")],
            next_page: None,
        });

        let mut ctx = context(true);
        ctx.insert(
            "listing",
            &ListingView::new(&state, &SiteConfig::default(), Some("Falhou".to_string())),
        );
        let html = renderer.render("index.html", &ctx).unwrap();

        assert!(!html.contains("Carregar mais posts"));
        assert!(html.contains("Falhou"));
        assert!(html.contains("Sair do modo Preview"));
        assert!(html.contains(r#"href="/api/exit-preview""#));
    }

    #[test]
    fn test_truncate_chars() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let out = truncate_chars_filter(&tera::Value::from("Olá mundo"), &args).unwrap();
        assert_eq!(out, tera::Value::from("Olá m…"));

        let out = truncate_chars_filter(&tera::Value::from("curto"), &args).unwrap();
        assert_eq!(out, tera::Value::from("curto"));
    }
}
