//! HTML and text helpers

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use scraper::{Html, Selector};
use std::borrow::Cow;
use std::sync::LazyLock;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));

/// `<meta charset=..>` or `<meta http-equiv=.. content="..; charset=..">`
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9._:-]+)"#)
        .expect("meta charset pattern is valid")
});

/// Bytes scanned for a `<meta>` charset declaration
const META_SCAN_LIMIT: usize = 1024;

/// Check if a Content-Type header names an HTML document
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_lowercase().contains("text/html"))
        .unwrap_or(false)
}

/// The `charset` parameter of a Content-Type header
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

/// Encoding of an HTML body
///
/// The Content-Type charset wins, then a `<meta>` declaration near the
/// start of the document, then UTF-8. Unknown labels are skipped.
pub fn html_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    let from_header = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = from_header {
        return encoding;
    }

    let head = &body[..body.len().min(META_SCAN_LIMIT)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| Encoding::for_label(&caps[1]))
        .unwrap_or(UTF_8)
}

/// Decode an HTML body using its declared charset
///
/// A byte order mark overrides the declaration. Malformed sequences are
/// replaced.
pub fn decode_html<'a>(body: &'a [u8], content_type: Option<&str>) -> Cow<'a, str> {
    let (text, _, _) = html_encoding(body, content_type).decode(body);
    text
}

/// Re-serialize an HTML body through the lenient parser
///
/// Scrubs malformed markup so later title extraction sees a well-formed
/// tree. The result keeps the body's original encoding. Bodies that do not
/// decode cleanly, or whose encoding cannot be written back, are returned
/// unchanged.
pub fn normalize_html(body: &Bytes, content_type: Option<&str>) -> Bytes {
    let encoding = html_encoding(body, content_type);
    if encoding.output_encoding() != encoding {
        return body.clone();
    }

    let (text, actual, had_errors) = encoding.decode(body);
    if had_errors || actual != encoding {
        return body.clone();
    }

    let serialized = Html::parse_document(&text).html();
    let (encoded, _, unmappable) = encoding.encode(&serialized);
    if unmappable {
        return body.clone();
    }
    Bytes::from(encoded.into_owned())
}

/// Extract the cleaned text of the first `<title>` element
///
/// Entities are decoded by the parser. Returns `None` when the document
/// has no title or the title is blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = document.select(&TITLE_SELECTOR).next()?;
    let text = clean_text(&title.text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Strip control characters and collapse whitespace runs to one space
///
/// Control characters that are whitespace (tab, newline, ...) become a
/// separator; the rest are dropped. Leading and trailing whitespace is
/// removed.
pub fn clean_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else if c.is_control() {
            continue;
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}
