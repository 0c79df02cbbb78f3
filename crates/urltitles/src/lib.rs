//! urltitles - chat bot plugin that summarizes pasted URLs
//!
//! For every `http(s)` URL seen in a channel message, [`UrlTitles`] fetches
//! it and replies with a one-line summary:
//!
//! - HTML pages: the page title
//! - PDFs: document title, page count and size
//! - arXiv PDF links: the abstract page's title plus its URL
//! - video pages: title and duration
//! - anything else: content type and size
//!
//! Replies are prefixed with anomalies worth knowing about before clicking:
//! a bad TLS certificate, a non-200 status, or a redirect to another host
//! or scheme.
//!
//! ```no_run
//! use urltitles::{ChatMessage, MessageHandler, UrlTitles};
//!
//! # async fn run() -> Result<(), urltitles::FetchError> {
//! let bot = UrlTitles::builder().build()?;
//! let msg = ChatMessage::new(Some("alice"), "#rust", "see https://www.rust-lang.org/");
//! for reply in bot.handle(&msg).await {
//!     println!("{}", reply);
//! }
//! # Ok(())
//! # }
//! ```

mod arxiv;
mod classify;
pub mod client;
pub mod collaborators;
mod convert;
mod error;
mod message;
mod plugin;
mod redirect;
mod size;
mod summarizer;
pub mod transport;
mod types;

#[cfg(test)]
mod testing;

pub use arxiv::{is_arxiv_pdf, to_html_url};
pub use classify::{classify_content, status_annotation, ContentKind};
pub use client::{FetchOptions, Fetcher};
pub use collaborators::{
    is_video_url, LopdfInspector, PdfInfo, PdfInspector, VideoInfo, VideoLookup, YouTubeLookup,
};
pub use convert::{clean_text, extract_title};
pub use error::FetchError;
pub use message::{extract_urls, ChatMessage, Ctcp};
pub use plugin::{DispatchOptions, MessageHandler, UrlTitles, UrlTitlesBuilder};
pub use redirect::summarize_redirects;
pub use size::format_size;
pub use summarizer::Summarizer;
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::{FetchOutcome, FetchReport, FetchResult, RedirectHop, Summary};

/// Default User-Agent string, a desktop browser's
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/57.0.2987.133 Safari/537.36";

/// Attempts per URL, retries included
pub const MAX_RETRIES: u32 = 2;

/// Statuses that, on a URL ending in punctuation, trigger a retry without it
pub const RETRY_STATUSES: [u16; 3] = [400, 404, 504];

/// Characters the URL extractor tends to swallow from surrounding prose
pub const TRAILING_PUNCTUATION: &str = "'\".?!";

/// Nicks (lowercase, substring match) whose messages are never answered
pub const DEFAULT_IGNORES: &[&str] = &["ml-feeds", "ml-helper", "nutrofeeds"];
