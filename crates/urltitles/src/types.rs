//! Core types for urltitles

use crate::error::FetchError;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One response in a redirect chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHop {
    /// URL that was requested
    pub url: String,
    /// Status code it answered with
    pub status_code: u16,
}

impl RedirectHop {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
        }
    }
}

/// Result of a successful fetch, retries included
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Last URL the retry loop requested
    ///
    /// Differs from the input when trailing punctuation was stripped or the
    /// input was an arXiv PDF. Not the redirect-resolved URL; see
    /// [`FetchResult::resolved_url`].
    pub final_url: String,
    /// Status code of the terminal response
    pub status_code: u16,
    /// Headers of the terminal response
    pub headers: HeaderMap,
    /// Body of the terminal response
    pub body: Bytes,
    /// Every response received for `final_url`, terminal response last
    pub redirect_chain: Vec<RedirectHop>,
    /// True if a certificate failure forced an unverified retry
    pub bad_certificate: bool,
}

impl FetchResult {
    /// URL of the terminal response after following redirects
    pub fn resolved_url(&self) -> &str {
        self.redirect_chain
            .last()
            .map(|hop| hop.url.as_str())
            .unwrap_or(self.final_url.as_str())
    }

    /// Content-Type header value
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Content size: Content-Length when it parses, else the body length
    ///
    /// `None` when neither gives a non-zero size.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .or_else(|| Some(self.body.len() as u64).filter(|&n| n > 0))
    }
}

/// Outcome of a fetch
pub type FetchOutcome = Result<FetchResult, FetchError>;

/// A reply line ready for the channel
///
/// Construction strips control characters and collapses whitespace runs,
/// so a `Summary` never carries either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Summary(String);

impl Summary {
    /// Normalize `raw` into a summary
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(crate::convert::clean_text(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Summary> for String {
    fn from(summary: Summary) -> Self {
        summary.0
    }
}

/// Fetch metadata plus the summary, for machine-readable output
#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    /// URL as given
    pub url: String,
    /// Last URL requested
    pub final_url: String,
    /// URL after redirects
    pub resolved_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// True if certificate verification was disabled to get a response
    pub bad_certificate: bool,
    /// Responses received, terminal response last
    pub redirect_chain: Vec<RedirectHop>,
    /// The reply line
    pub summary: Summary,
}

impl FetchReport {
    pub fn new(url: impl Into<String>, result: &FetchResult, summary: Summary) -> Self {
        Self {
            url: url.into(),
            final_url: result.final_url.clone(),
            resolved_url: result.resolved_url().to_string(),
            status_code: result.status_code,
            content_type: result.content_type().map(str::to_string),
            size: result.content_length(),
            bad_certificate: result.bad_certificate,
            redirect_chain: result.redirect_chain.clone(),
            summary,
        }
    }
}
