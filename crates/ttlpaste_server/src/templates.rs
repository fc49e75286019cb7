//! Self-contained HTML documents for share links.
//!
//! Callers pass content that is already sanitized; everything else is
//! HTML-escaped here.

const BASE_STYLE: &str = "body{font-family:system-ui,-apple-system,sans-serif;margin:0;background:#f5f5f5;color:#1f2933}\
.container{background:#fff;padding:2rem;border-radius:8px;box-shadow:0 2px 8px rgba(0,0,0,.1)}";

const PASTE_STYLE: &str = "body{max-width:800px;margin:0 auto;padding:2rem}\
.content{white-space:pre-wrap;word-wrap:break-word;line-height:1.6}\
.meta{color:#6b7280;font-size:.85rem;margin-top:1.5rem}";

const MESSAGE_STYLE: &str = "body{display:flex;justify-content:center;align-items:center;min-height:100vh}\
.container{text-align:center}h1{color:#dc2626;margin:0 0 1rem 0}p{color:#666;margin:0}";

fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<meta name=\"robots\" content=\"noindex\">\n\
<title>{}</title>\n<style>{}{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        html_escape::encode_text(title),
        BASE_STYLE,
        style,
        body
    )
}

/// Page showing one paste.
///
/// `safe_content` must already be sanitized and template-escaped.
/// `footer` is plain text and is escaped.
pub fn paste_page(safe_content: &str, footer: Option<&str>) -> String {
    let footer = footer
        .map(|text| format!("<p class=\"meta\">{}</p>", html_escape::encode_text(text)))
        .unwrap_or_default();
    document(
        "Paste",
        PASTE_STYLE,
        &format!(
            "<div class=\"container\">\n<div class=\"content\">{}</div>\n{}</div>",
            safe_content, footer
        ),
    )
}

/// Centered status page with a heading and one line of text.
pub fn message_page(title: &str, heading: &str, message: &str) -> String {
    document(
        title,
        MESSAGE_STYLE,
        &format!(
            "<div class=\"container\">\n<h1>{}</h1>\n<p>{}</p>\n</div>",
            html_escape::encode_text(heading),
            html_escape::encode_text(message)
        ),
    )
}

/// Page for absent, expired, or view-exhausted pastes.
pub fn not_found_page() -> String {
    message_page(
        "Paste Not Found",
        "404 - Paste Not Found",
        "This paste is unavailable. It may have expired or reached its view limit.",
    )
}

/// Page for store failures.
pub fn error_page() -> String {
    message_page(
        "Error",
        "500 - Internal Server Error",
        "An error occurred while loading the paste.",
    )
}
