//! HTML sanitizing for server-rendered paste pages.
//!
//! The JSON API never passes through here; it returns stored content as-is.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Tags kept by [`sanitize_html`]. Everything else is dropped and every
/// attribute is stripped.
pub const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "u",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "code",
    "pre",
    "blockquote",
];

/// Tags removed together with their text content.
const DROPPED_WITH_CONTENT: &[&str] = &["script", "style"];

fn cleaner() -> &'static ammonia::Builder<'static> {
    static CLEANER: OnceLock<ammonia::Builder<'static>> = OnceLock::new();
    CLEANER.get_or_init(|| {
        let mut builder = ammonia::Builder::empty();
        builder
            .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
            .clean_content_tags(DROPPED_WITH_CONTENT.iter().copied().collect::<HashSet<_>>());
        builder
    })
}

/// Reduce `raw` to the allow-listed formatting tags with no attributes.
///
/// Text outside tags is kept and HTML-escaped.
pub fn sanitize_html(raw: &str) -> String {
    cleaner().clean(raw).to_string()
}

/// Neutralize characters that could end a JavaScript template literal.
///
/// `\`, `` ` ``, and the `$` of `${` become numeric character references.
/// They no longer act as template syntax but still display as themselves.
/// Applied after [`sanitize_html`] when the result is embedded in a
/// generated page.
pub fn escape_for_template(sanitized: &str) -> String {
    let mut out = String::with_capacity(sanitized.len());
    let mut chars = sanitized.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("&#92;"),
            '`' => out.push_str("&#96;"),
            '$' if chars.peek() == Some(&'{') => out.push_str("&#36;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Sanitize and template-escape in one step.
pub fn render_safe(raw: &str) -> String {
    escape_for_template(&sanitize_html(raw))
}
