//! Rich-text fragments as delivered by the content API
//!
//! `as_text` flattens fragments to plain text, `as_html` renders them to
//! markup. Block and span kinds follow the content API's structured text
//! format; unknown kinds are kept and rendered as plain paragraphs.

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// Kind of a rich-text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(other)]
    Other,
}

impl Default for BlockKind {
    fn default() -> Self {
        Self::Paragraph
    }
}

/// One block of rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextFragment {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source, for image blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextFragment {
    /// A plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Kind of an inline span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Other,
}

/// Inline formatting over `[start, end)`, offsets in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Flatten fragments to plain text, joining blocks with `separator`
pub fn as_text(fragments: &[RichTextFragment], separator: &str) -> String {
    fragments
        .iter()
        .filter(|fragment| fragment.kind != BlockKind::Image)
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Render fragments to HTML
///
/// Consecutive list items are grouped into a single `<ul>` or `<ol>`.
pub fn as_html(fragments: &[RichTextFragment]) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for fragment in fragments {
        let list = match fragment.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(fragment.kind),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list.take() {
                html.push_str(list_tag(kind).1);
            }
            if let Some(kind) = list {
                html.push_str(list_tag(kind).0);
                open_list = Some(kind);
            }
        }

        html.push_str(&render_block(fragment));
    }

    if let Some(kind) = open_list {
        html.push_str(list_tag(kind).1);
    }

    html
}

fn list_tag(kind: BlockKind) -> (&'static str, &'static str) {
    if kind == BlockKind::OrderedListItem {
        ("<ol>", "</ol>")
    } else {
        ("<ul>", "</ul>")
    }
}

fn render_block(fragment: &RichTextFragment) -> String {
    let inner = || render_spans(&fragment.text, &fragment.spans);
    match fragment.kind {
        BlockKind::Heading1 => format!("<h1>{}</h1>", inner()),
        BlockKind::Heading2 => format!("<h2>{}</h2>", inner()),
        BlockKind::Heading3 => format!("<h3>{}</h3>", inner()),
        BlockKind::Heading4 => format!("<h4>{}</h4>", inner()),
        BlockKind::Heading5 => format!("<h5>{}</h5>", inner()),
        BlockKind::Heading6 => format!("<h6>{}</h6>", inner()),
        BlockKind::Preformatted => format!("<pre>{}</pre>", inner()),
        BlockKind::ListItem | BlockKind::OrderedListItem => format!("<li>{}</li>", inner()),
        BlockKind::Image => match &fragment.url {
            Some(url) => format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                html_escape(url),
                html_escape(fragment.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Paragraph | BlockKind::Other => format!("<p>{}</p>", inner()),
    }
}

/// Apply spans to a block's text, escaping everything in between
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut pending: Vec<&Span> = spans.iter().filter(|span| span.start < span.end).collect();
    // Wider spans open first so they close last.
    pending.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut pending = pending.into_iter().peekable();

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut offset = 0;

    for ch in text.chars() {
        close_spans(&mut out, &mut open, offset);
        while let Some(span) = pending.next_if(|span| span.start <= offset) {
            out.push_str(&open_tag(span));
            open.push(span);
        }

        match ch {
            '\n' => out.push_str("<br />"),
            _ => out.push_str(&html_escape(ch.encode_utf8(&mut [0; 4]))),
        }
        offset += ch.len_utf16();
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

/// Close every span ending at `offset`, reopening any span that was
/// closed only to keep tags properly nested.
fn close_spans<'a>(out: &mut String, open: &mut Vec<&'a Span>, offset: usize) {
    if !open.iter().any(|span| span.end <= offset) {
        return;
    }

    let mut reopen = Vec::new();
    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
        if span.end > offset {
            reopen.push(span);
        }
        if !open.iter().any(|span| span.end <= offset) {
            break;
        }
    }

    for span in reopen.into_iter().rev() {
        out.push_str(&open_tag(span));
        open.push(span);
    }
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let data = span.data.clone().unwrap_or_default();
            let href = html_escape(data.url.as_deref().unwrap_or("#"));
            match data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    href,
                    html_escape(&target)
                ),
                None => format!(r#"<a href="{}">"#, href),
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|data| data.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Other => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Other => "</span>",
    }
}
