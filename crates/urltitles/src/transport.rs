//! Single-request HTTP transport
//!
//! A [`Transport`] performs exactly one GET without following redirects,
//! so the fetcher can record every hop. [`HttpTransport`] is the reqwest
//! implementation; tests substitute scripted transports.

use crate::client::FetchOptions;
use crate::error::FetchError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// A single HTTP response, body included
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status_code: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Performs one HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// GET `url` without following redirects
    ///
    /// With `verify_tls` false, certificate validation is skipped.
    /// Certificate failures must be reported as [`FetchError::Certificate`].
    async fn get(&self, url: &str, verify_tls: bool) -> Result<RawResponse, FetchError>;
}

/// reqwest-backed transport
///
/// Holds a verifying and a non-verifying client. Both share one cookie jar
/// so session cookies (consent redirects and the like) survive across
/// requests and across the verification downgrade.
pub struct HttpTransport {
    verified: reqwest::Client,
    unverified: reqwest::Client,
    cookies: Arc<Jar>,
    body_timeout: Duration,
    max_body_bytes: usize,
}

impl HttpTransport {
    /// Create a transport with a fresh cookie jar
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        Self::with_cookie_jar(options, Arc::new(Jar::default()))
    }

    /// Create a transport sharing an existing cookie jar
    pub fn with_cookie_jar(options: &FetchOptions, cookies: Arc<Jar>) -> Result<Self, FetchError> {
        Ok(Self {
            verified: build_client(options, Arc::clone(&cookies), true)?,
            unverified: build_client(options, Arc::clone(&cookies), false)?,
            cookies,
            body_timeout: options.body_timeout,
            max_body_bytes: options.max_body_bytes,
        })
    }

    /// The process-wide cookie jar
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookies)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn get(&self, url: &str, verify_tls: bool) -> Result<RawResponse, FetchError> {
        let client = if verify_tls {
            &self.verified
        } else {
            &self.unverified
        };

        debug!(url = %url, verify_tls, "Sending request");
        let response = client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status_code = response.status().as_u16();
        let headers = response.headers().clone();
        let body = read_body_with_timeout(response, self.body_timeout, self.max_body_bytes).await;

        Ok(RawResponse {
            status_code,
            headers,
            body,
        })
    }
}

fn build_client(
    options: &FetchOptions,
    cookies: Arc<Jar>,
    verify_tls: bool,
) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&options.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    reqwest::Client::builder()
        .default_headers(headers)
        .cookie_provider(cookies)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(options.connect_timeout)
        .timeout(options.request_timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(FetchError::ClientBuildError)
}

/// Read response body with timeout and size cap, keeping partial content
async fn read_body_with_timeout(
    response: reqwest::Response,
    timeout: Duration,
    limit: usize,
) -> Bytes {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let chunk_future = stream.next();
        let timeout_future = tokio::time::sleep_until(deadline);

        tokio::select! {
            chunk = chunk_future => {
                match chunk {
                    Some(Ok(bytes)) => {
                        body.extend_from_slice(&bytes);
                        if body.len() >= limit {
                            warn!(limit, "Body size limit reached, truncating");
                            body.truncate(limit);
                            return Bytes::from(body);
                        }
                    }
                    Some(Err(e)) => {
                        error!("Error reading body chunk: {}", e);
                        return Bytes::from(body);
                    }
                    None => {
                        return Bytes::from(body);
                    }
                }
            }
            _ = timeout_future => {
                warn!("Body timeout reached, keeping partial content");
                return Bytes::from(body);
            }
        }
    }
}
