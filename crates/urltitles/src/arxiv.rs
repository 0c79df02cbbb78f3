//! arXiv PDF to abstract page mapping
//!
//! arXiv has a deterministic mapping between a paper's PDF and its
//! landing page:
//!
//! ```text
//! PDF:  https://arxiv.org/pdf/1703.08251.pdf
//! HTML: https://arxiv.org/abs/1703.08251
//! ```
//!
//! The landing page carries a proper title, so PDFs are summarized from
//! there instead of from document metadata.

use regex::Regex;
use std::sync::LazyLock;

static ARXIV_PDF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://arxiv\.org/pdf/([0-9.]+(?:v[0-9]+)?)\.pdf")
        .expect("arXiv pattern is valid")
});

/// Returns true if `url` is an arXiv PDF with a known abstract page
pub fn is_arxiv_pdf(url: &str) -> bool {
    ARXIV_PDF.is_match(url)
}

/// Map an arXiv PDF URL to its abstract page
///
/// Returns `None` when `url` is not an arXiv PDF URL.
pub fn to_html_url(url: &str) -> Option<String> {
    let caps = ARXIV_PDF.captures(url)?;
    let id = caps.get(1)?.as_str();
    Some(format!("https://arxiv.org/abs/{}", id))
}
