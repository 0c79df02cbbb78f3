//! URL fetching with retries
//!
//! [`Fetcher`] wraps a [`Transport`] with the retry policy:
//!
//! - certificate failures downgrade to unverified TLS and retry
//! - other transport failures retry unchanged
//! - 400/404/504 on a URL ending in punctuation retries without the last
//!   character, correcting over-greedy URL extraction from chat text
//!
//! Redirects are followed here rather than by the HTTP client so that
//! every hop lands in [`FetchResult::redirect_chain`].

use crate::arxiv;
use crate::convert::{is_html, normalize_html};
use crate::error::FetchError;
use crate::transport::{RawResponse, Transport};
use crate::types::{FetchOutcome, FetchResult, RedirectHop};
use crate::{DEFAULT_USER_AGENT, MAX_RETRIES, RETRY_STATUSES, TRAILING_PUNCTUATION};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Fetch options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Total attempts per fetch, retries included
    pub max_retries: u32,
    /// Statuses that trigger the trailing-punctuation retry
    pub retry_statuses: Vec<u16>,
    /// Characters stripped from the end of a URL on a retry status
    pub trailing_punctuation: String,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
    /// Re-serialize HTML bodies through the lenient parser
    pub normalize_html: bool,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Body read timeout; partial content is kept
    pub body_timeout: Duration,
    /// Body size cap; longer bodies are truncated
    pub max_body_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: MAX_RETRIES,
            retry_statuses: RETRY_STATUSES.to_vec(),
            trailing_punctuation: TRAILING_PUNCTUATION.to_string(),
            max_redirects: 10,
            normalize_html: true,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            body_timeout: Duration::from_secs(30),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Per-fetch retry bookkeeping
#[derive(Debug)]
struct RetryState {
    attempts_remaining: u32,
    current_url: String,
    verify_tls: bool,
    bad_cert_seen: bool,
}

impl RetryState {
    fn new(url: String, attempts: u32) -> Self {
        Self {
            attempts_remaining: attempts,
            current_url: url,
            verify_tls: true,
            bad_cert_seen: false,
        }
    }
}

/// A response accepted by the retry loop
struct Accepted {
    url: String,
    chain: Vec<RedirectHop>,
    response: RawResponse,
}

/// Fetches URLs through a [`Transport`] with bounded retries
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    options: FetchOptions,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, options: FetchOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch a URL
    ///
    /// arXiv PDF URLs are fetched from their abstract page instead.
    /// Returns an error only when no attempt produced a response.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let start = match arxiv::to_html_url(url) {
            Some(html_url) => {
                debug!(pdf = %url, html = %html_url, "Fetching arXiv abstract instead of PDF");
                html_url
            }
            None => url.to_string(),
        };

        let mut state = RetryState::new(start, self.options.max_retries);
        let mut accepted: Option<Accepted> = None;
        let mut attempts = 0;

        while state.attempts_remaining > 0 {
            state.attempts_remaining -= 1;
            attempts += 1;
            debug!(
                transport = self.transport.name(),
                attempt = attempts,
                url = %state.current_url,
                "Fetch attempt"
            );

            let (chain, response) = match self
                .get_following_redirects(&state.current_url, state.verify_tls)
                .await
            {
                Ok(ok) => ok,
                Err(FetchError::Certificate(reason)) => {
                    warn!(url = %state.current_url, %reason, "Bad certificate, retrying unverified");
                    state.bad_cert_seen = true;
                    state.verify_tls = false;
                    continue;
                }
                Err(e) => {
                    warn!(url = %state.current_url, error = %e, "Request failed");
                    continue;
                }
            };

            let strip = self.options.retry_statuses.contains(&response.status_code)
                && self.ends_with_punctuation(&state.current_url);

            accepted = Some(Accepted {
                url: state.current_url.clone(),
                chain,
                response,
            });

            if strip {
                state.current_url.pop();
                debug!(
                    url = %state.current_url,
                    "Error status on URL ending in punctuation, retrying without it"
                );
                continue;
            }

            break;
        }

        let Some(Accepted {
            url: final_url,
            chain,
            response,
        }) = accepted
        else {
            return Err(FetchError::RetriesExhausted {
                url: url.to_string(),
                attempts,
            });
        };

        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let body = if self.options.normalize_html && is_html(content_type) {
            normalize_html(&response.body, content_type)
        } else {
            response.body
        };

        Ok(FetchResult {
            final_url,
            status_code: response.status_code,
            headers: response.headers,
            body,
            redirect_chain: chain,
            bad_certificate: state.bad_cert_seen,
        })
    }

    fn ends_with_punctuation(&self, url: &str) -> bool {
        url.chars()
            .last()
            .map(|c| self.options.trailing_punctuation.contains(c))
            .unwrap_or(false)
    }

    /// GET a URL, following redirects and recording each hop
    async fn get_following_redirects(
        &self,
        url: &str,
        verify_tls: bool,
    ) -> Result<(Vec<RedirectHop>, RawResponse), FetchError> {
        let mut chain = Vec::new();
        let mut current = url.to_string();

        loop {
            let response = self.transport.get(&current, verify_tls).await?;
            chain.push(RedirectHop::new(current.clone(), response.status_code));

            if !is_redirect(response.status_code) {
                return Ok((chain, response));
            }

            let Some(location) = response
                .headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                warn!(
                    status = response.status_code,
                    url = %current,
                    "Redirect status without Location header"
                );
                return Ok((chain, response));
            };

            if chain.len() > self.options.max_redirects {
                return Err(FetchError::TooManyRedirects(self.options.max_redirects));
            }

            current = resolve_location(&current, location)?;
        }
    }
}

fn is_redirect(status_code: u16) -> bool {
    matches!(status_code, 301 | 302 | 303 | 307 | 308)
}

/// Resolve a Location header against the URL that returned it
fn resolve_location(base: &str, location: &str) -> Result<String, FetchError> {
    Url::parse(base)
        .and_then(|base| base.join(location))
        .map(String::from)
        .map_err(|_| FetchError::InvalidUrl(location.to_string()))
}
