//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Build a `<script>` tag from attribute pairs, escaping every value
pub fn script_tag(attrs: &[(&str, &str)]) -> String {
    let attrs: String = attrs
        .iter()
        .map(|(name, value)| format!(r#" {}="{}""#, name, html_escape(value)))
        .collect();
    format!("<script{}></script>", attrs)
}
