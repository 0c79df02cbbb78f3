//! External metadata collaborators
//!
//! Video title/duration and PDF document info, each behind a trait.

mod pdf;
mod youtube;

pub use pdf::LopdfInspector;
pub use youtube::{is_video_url, YouTubeLookup};

use crate::error::FetchError;
use async_trait::async_trait;

/// Video metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    /// Display duration, `HH:MM:SS`
    pub duration: String,
}

/// Looks up video metadata for a video-hosting URL
#[async_trait]
pub trait VideoLookup: Send + Sync {
    /// Fetch title and duration for `url`
    ///
    /// Called only for URLs accepted by [`is_video_url`]. An error makes
    /// the summarizer fall back to the page's content type.
    async fn lookup(&self, url: &str) -> Result<VideoInfo, FetchError>;
}

/// PDF document-info metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    /// Document title, empty when the PDF has none
    pub title: String,
    /// Page count, `None` when the document could not be read
    pub pages: Option<usize>,
}

/// Extracts metadata from PDF bytes
///
/// Must not fail: malformed documents yield empty fields.
pub trait PdfInspector: Send + Sync {
    fn inspect(&self, bytes: &[u8]) -> PdfInfo;
}
