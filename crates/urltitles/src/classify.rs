//! Content classification and status annotations

use crate::arxiv;
use crate::collaborators::is_video_url;
use crate::convert::is_html;
use crate::redirect::summarize_redirects;
use crate::types::FetchResult;

/// What kind of summary a fetched URL gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Video-hosting page; summarized from video metadata
    VideoHost,
    /// HTML page; summarized from its title
    Html,
    /// arXiv PDF; summarized from its abstract page
    ArxivPdf,
    /// Other PDF; summarized from document metadata
    Pdf,
    /// Anything else; content type and size
    Other,
}

/// Classify a URL and its Content-Type
///
/// The URL decides video hosts; otherwise the content type decides.
pub fn classify_content(url: &str, content_type: Option<&str>) -> ContentKind {
    if is_video_url(url) {
        return ContentKind::VideoHost;
    }
    match kind_of_content_type(content_type) {
        ContentKind::Pdf if arxiv::is_arxiv_pdf(url) => ContentKind::ArxivPdf,
        kind => kind,
    }
}

/// Classify by Content-Type alone: `Html`, `Pdf` or `Other`
pub fn kind_of_content_type(content_type: Option<&str>) -> ContentKind {
    if is_html(content_type) {
        ContentKind::Html
    } else if is_pdf(content_type) {
        ContentKind::Pdf
    } else {
        ContentKind::Other
    }
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_lowercase().contains("application/pdf"))
        .unwrap_or(false)
}

/// Parenthesized anomaly prefix for a reply, e.g. `(WARNING: BAD CERT, 404) `
///
/// Lists, in order: the bad certificate warning, a non-200 status, and the
/// redirect summary. Empty when none applies; otherwise ends with a space.
pub fn status_annotation(result: &FetchResult) -> String {
    let mut parts = Vec::new();

    if result.bad_certificate {
        parts.push("WARNING: BAD CERT".to_string());
    }
    if result.status_code != 200 {
        parts.push(result.status_code.to_string());
    }
    if let Some(redirect) = summarize_redirects(&result.redirect_chain) {
        parts.push(format!("R: {}", redirect));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("({}) ", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RedirectHop;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;

    fn result(status_code: u16, bad_certificate: bool, chain: Vec<RedirectHop>) -> FetchResult {
        FetchResult {
            final_url: "http://example.com/".to_string(),
            status_code,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            redirect_chain: chain,
            bad_certificate,
        }
    }

    #[test]
    fn test_classify_by_content_type() {
        let url = "https://example.com/x";
        assert_eq!(classify_content(url, Some("text/html; charset=utf-8")), ContentKind::Html);
        assert_eq!(classify_content(url, Some("application/pdf")), ContentKind::Pdf);
        assert_eq!(classify_content(url, Some("image/png")), ContentKind::Other);
        assert_eq!(classify_content(url, None), ContentKind::Other);
    }

    #[test]
    fn test_kind_of_content_type() {
        assert_eq!(kind_of_content_type(Some("text/html")), ContentKind::Html);
        assert_eq!(kind_of_content_type(Some("Application/PDF")), ContentKind::Pdf);
        assert_eq!(kind_of_content_type(Some("text/plain")), ContentKind::Other);
    }

    #[test]
    fn test_classify_video_host_wins() {
        assert_eq!(
            classify_content("https://www.youtube.com/watch?v=abc", Some("text/html")),
            ContentKind::VideoHost
        );
        assert_eq!(
            classify_content("https://youtu.be/abc", None),
            ContentKind::VideoHost
        );
    }

    #[test]
    fn test_classify_arxiv_pdf() {
        assert_eq!(
            classify_content("https://arxiv.org/pdf/1703.08251.pdf", Some("application/pdf")),
            ContentKind::ArxivPdf
        );
        assert_eq!(
            classify_content("https://arxiv.org/pdf/1703.08251.pdf", Some("text/html")),
            ContentKind::Html
        );
    }

    #[test]
    fn test_status_annotation_empty() {
        let r = result(200, false, vec![RedirectHop::new("http://example.com/", 200)]);
        assert_eq!(status_annotation(&r), "");
    }

    #[test]
    fn test_status_annotation_all_parts() {
        let r = result(
            404,
            true,
            vec![
                RedirectHop::new("http://example.com/", 301),
                RedirectHop::new("https://www.example.com/", 404),
            ],
        );
        assert_eq!(
            status_annotation(&r),
            "(WARNING: BAD CERT, 404, R: www.example.com) "
        );
    }

    #[test]
    fn test_status_annotation_scheme_redirect() {
        let r = result(
            200,
            false,
            vec![
                RedirectHop::new("http://example.com/", 301),
                RedirectHop::new("https://example.com/", 200),
            ],
        );
        assert_eq!(status_annotation(&r), "(R: HTTPS) ");
    }

    #[test]
    fn test_status_annotation_path_redirect_only() {
        let r = result(
            200,
            false,
            vec![
                RedirectHop::new("https://example.com/a", 302),
                RedirectHop::new("https://example.com/b", 200),
            ],
        );
        assert_eq!(status_annotation(&r), "");
    }
}
