//! Turning fetched responses into reply lines

use crate::arxiv;
use crate::classify::{classify_content, kind_of_content_type, status_annotation, ContentKind};
use crate::client::Fetcher;
use crate::collaborators::{PdfInspector, VideoLookup};
use crate::convert::{decode_html, extract_title};
use crate::error::FetchError;
use crate::size::format_size;
use crate::types::{FetchReport, FetchResult, Summary};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Fetch-and-summarize pipeline for single URLs
pub struct Summarizer {
    fetcher: Fetcher,
    video: Arc<dyn VideoLookup>,
    pdf: Arc<dyn PdfInspector>,
}

impl Summarizer {
    pub fn new(fetcher: Fetcher, video: Arc<dyn VideoLookup>, pdf: Arc<dyn PdfInspector>) -> Self {
        Self {
            fetcher,
            video,
            pdf,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch `url` and produce its reply line
    ///
    /// Returns `None` when the fetch fails. Replies for arXiv PDF links get
    /// ` | <resolved url>` appended so the channel sees the abstract page.
    pub fn title_for<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Option<String>> {
        async move {
            let result = match self.fetcher.fetch(url).await {
                Ok(result) => result,
                Err(e) => {
                    info!(url = %url, error = %e, "No reply for URL");
                    return None;
                }
            };

            let summary = self.summarize(&result).await;
            if arxiv::is_arxiv_pdf(url) {
                let line = format!("{} | {}", summary, result.resolved_url());
                return Some(Summary::new(line).into_string());
            }
            Some(summary.into_string())
        }
        .boxed()
    }

    /// Fetch `url` and return metadata together with the summary
    pub async fn report(&self, url: &str) -> Result<FetchReport, FetchError> {
        let result = self.fetcher.fetch(url).await?;
        let summary = self.summarize(&result).await;
        Ok(FetchReport::new(url, &result, summary))
    }

    /// Summarize a fetched response
    pub async fn summarize(&self, result: &FetchResult) -> Summary {
        let url = result.final_url.as_str();
        let status = status_annotation(result);
        let kind = classify_content(url, result.content_type());
        debug!(url = %url, ?kind, "Classified");

        let line = match kind {
            ContentKind::VideoHost => match self.video.lookup(url).await {
                Ok(video) => format!("[ {}({}, {}) ]", status, video.title, video.duration),
                Err(e) => {
                    debug!(url = %url, error = %e, "Video lookup failed, using content type");
                    let fallback = kind_of_content_type(result.content_type());
                    self.describe(fallback, result, &status)
                }
            },
            ContentKind::ArxivPdf => {
                let abstract_page = match arxiv::to_html_url(url) {
                    Some(html_url) => self.title_for(&html_url).await,
                    None => None,
                };
                match abstract_page {
                    Some(line) => line,
                    None => self.describe(ContentKind::Pdf, result, &status),
                }
            }
            other => self.describe(other, result, &status),
        };

        Summary::new(line)
    }

    /// Format the kinds that need nothing beyond the response itself
    fn describe(&self, kind: ContentKind, result: &FetchResult, status: &str) -> String {
        let content_type = result.content_type().unwrap_or("unknown");
        let size = format_size(result.content_length());

        match kind {
            ContentKind::Html => format!("[ {}{} ]", status, page_title(result)),
            ContentKind::Pdf | ContentKind::ArxivPdf => {
                let info = self.pdf.inspect(&result.body);
                let pages = info
                    .pages
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!(
                    "[ {}{} ({}, {}) {} ]",
                    status, info.title, content_type, pages, size
                )
            }
            ContentKind::VideoHost | ContentKind::Other => {
                format!("[ {}({}) {} ]", status, content_type, size)
            }
        }
    }
}

/// Page title, or a `No title` fallback naming the host
fn page_title(result: &FetchResult) -> String {
    extract_title(&decode_html(&result.body, result.content_type())).unwrap_or_else(|| {
        match Url::parse(&result.final_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            Some(host) => format!("No title: {}", host),
            None => "No title".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchOptions;
    use crate::collaborators::{PdfInfo, VideoInfo};
    use crate::testing::*;

    fn summarizer(transport: ScriptedTransport) -> Summarizer {
        summarizer_with(transport, FixedVideo(None), PdfInfo::default())
    }

    fn summarizer_with(transport: ScriptedTransport, video: FixedVideo, pdf: PdfInfo) -> Summarizer {
        Summarizer::new(
            Fetcher::new(Arc::new(transport), FetchOptions::default()),
            Arc::new(video),
            Arc::new(FixedPdf(pdf)),
        )
    }

    #[tokio::test]
    async fn test_html_title() {
        let s = summarizer(
            ScriptedTransport::new()
                .on("https://example.com/", html(200, "<title>  Foo   Bar  </title>")),
        );
        assert_eq!(
            s.title_for("https://example.com/").await,
            Some("[ Foo Bar ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_html_title_in_declared_charset() {
        let s = summarizer(ScriptedTransport::new().on(
            "https://example.de/",
            response(
                200,
                "text/html; charset=iso-8859-1",
                b"<title>Caf\xe9 M\xfcller</title>",
            ),
        ));
        assert_eq!(
            s.title_for("https://example.de/").await,
            Some("[ Caf\u{e9} M\u{fc}ller ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_html_without_title_names_host() {
        let s = summarizer(
            ScriptedTransport::new().on("https://example.com/", html(200, "<p>no title</p>")),
        );
        assert_eq!(
            s.title_for("https://example.com/").await,
            Some("[ No title: example.com ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_bad_certificate_annotated() {
        let s = summarizer(
            ScriptedTransport::new()
                .on("https://self-signed.example/", cert_error())
                .on("https://self-signed.example/", html(200, "<title>Home</title>")),
        );
        assert_eq!(
            s.title_for("https://self-signed.example/").await,
            Some("[ (WARNING: BAD CERT) Home ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_non_200_and_redirect_annotated() {
        let s = summarizer(
            ScriptedTransport::new()
                .on("http://example.com/gone", redirect(301, "https://example.org/gone"))
                .on("https://example.org/gone", html(410, "<title>Gone</title>")),
        );
        assert_eq!(
            s.title_for("http://example.com/gone").await,
            Some("[ (410, R: example.org) Gone ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_nothing() {
        let s = summarizer(ScriptedTransport::new());
        assert_eq!(s.title_for("https://down.example/").await, None);
    }

    #[tokio::test]
    async fn test_pdf_summary() {
        let s = summarizer_with(
            ScriptedTransport::new().on(
                "https://example.com/paper.pdf",
                response(200, "application/pdf", &[b'x'; 1536]),
            ),
            FixedVideo(None),
            PdfInfo {
                title: "A Study".to_string(),
                pages: Some(12),
            },
        );
        assert_eq!(
            s.title_for("https://example.com/paper.pdf").await,
            Some("[ A Study (application/pdf, 12) 1.5KB ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_pdf_without_metadata() {
        let s = summarizer(ScriptedTransport::new().on(
            "https://example.com/scan.pdf",
            response(200, "application/pdf", b"garbage"),
        ));
        assert_eq!(
            s.title_for("https://example.com/scan.pdf").await,
            Some("[ (application/pdf, ?) 7.0bytes ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_other_content_type() {
        let s = summarizer(ScriptedTransport::new().on(
            "https://example.com/data.json",
            response(200, "application/json", br#"{"key": "value"}"#),
        ));
        assert_eq!(
            s.title_for("https://example.com/data.json").await,
            Some("[ (application/json) 16.0bytes ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_video_summary() {
        let s = summarizer_with(
            ScriptedTransport::new().on(
                "https://www.youtube.com/watch?v=2XLZ4Z8LpEE",
                html(200, "<title>page</title>"),
            ),
            FixedVideo(Some(VideoInfo {
                title: "Teletype".to_string(),
                duration: "00:12:34".to_string(),
            })),
            PdfInfo::default(),
        );
        assert_eq!(
            s.title_for("https://www.youtube.com/watch?v=2XLZ4Z8LpEE").await,
            Some("[ (Teletype, 00:12:34) ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_video_lookup_failure_falls_back_to_html() {
        let s = summarizer(ScriptedTransport::new().on(
            "https://youtu.be/2XLZ4Z8LpEE",
            html(200, "<title>Some Video - YouTube</title>"),
        ));
        assert_eq!(
            s.title_for("https://youtu.be/2XLZ4Z8LpEE").await,
            Some("[ Some Video - YouTube ]".to_string())
        );
    }

    #[tokio::test]
    async fn test_arxiv_pdf_link_gets_resolved_url() {
        let s = summarizer(ScriptedTransport::new().on(
            "https://arxiv.org/abs/1703.08251",
            html(200, "<title>[1703.08251] A Paper</title>"),
        ));
        assert_eq!(
            s.title_for("https://arxiv.org/pdf/1703.08251.pdf").await,
            Some("[ [1703.08251] A Paper ] | https://arxiv.org/abs/1703.08251".to_string())
        );
    }

    #[tokio::test]
    async fn test_arxiv_pdf_content_summarized_from_abstract() {
        let transport = ScriptedTransport::new().on(
            "https://arxiv.org/abs/1703.08251v2",
            html(200, "<title>Abstract page</title>"),
        );
        let s = summarizer(transport);
        let result = FetchResult {
            final_url: "https://arxiv.org/pdf/1703.08251v2.pdf".to_string(),
            status_code: 200,
            headers: {
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/pdf"),
                );
                h
            },
            body: bytes::Bytes::from_static(b"%PDF"),
            redirect_chain: vec![],
            bad_certificate: false,
        };
        assert_eq!(s.summarize(&result).await.as_str(), "[ Abstract page ]");
    }

    #[tokio::test]
    async fn test_report() {
        let s = summarizer(
            ScriptedTransport::new().on("https://example.com/", html(200, "<title>Hi</title>")),
        );
        let report = s.report("https://example.com/").await.unwrap();
        assert_eq!(report.summary.as_str(), "[ Hi ]");
        assert_eq!(report.status_code, 200);
        assert_eq!(report.resolved_url, "https://example.com/");
    }
}
