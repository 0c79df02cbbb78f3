//! Error types for urltitles

use std::error::Error as StdError;
use thiserror::Error;

/// Errors that can occur while fetching or summarizing a URL
///
/// None of these ever reach the chat transport: the dispatcher logs them
/// and drops the affected URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or is not http(s)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// TLS handshake failed certificate validation
    #[error("Certificate verification failed: {0}")]
    Certificate(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Redirect chain longer than the configured limit
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Every attempt failed before a response was received
    #[error("Giving up on {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    /// Video metadata lookup failed
    #[error("Video lookup failed: {0}")]
    VideoLookup(String),
}

impl FetchError {
    /// Create an error from a reqwest error
    ///
    /// reqwest has no dedicated TLS predicate, so TLS failures (bad
    /// certificates, handshake failures, protocol alerts) are recognized by
    /// walking the source chain down to the TLS backend error. The top-level
    /// message is skipped since it embeds the URL.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(reason) = StdError::source(&err).and_then(tls_failure) {
            FetchError::Certificate(reason)
        } else if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else {
            FetchError::RequestError(err.to_string())
        }
    }

    /// Returns true for failures that warrant retrying without verification
    pub fn is_certificate(&self) -> bool {
        matches!(self, FetchError::Certificate(_))
    }
}

/// Fragments that mark an error as coming from the TLS layer
const TLS_MARKERS: [&str; 5] = ["certificate", "handshake", "tls", "ssl", "alert"];

fn tls_failure(err: &(dyn StdError + 'static)) -> Option<String> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string();
        let lower = message.to_lowercase();
        if TLS_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return Some(message);
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.1.as_deref().map(|l| l as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::InvalidUrl("ftp://x".to_string()).to_string(),
            "Invalid URL: ftp://x"
        );
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            FetchError::TooManyRedirects(10).to_string(),
            "Too many redirects (limit 10)"
        );
        assert_eq!(
            FetchError::RetriesExhausted {
                url: "https://example.com".to_string(),
                attempts: 2
            }
            .to_string(),
            "Giving up on https://example.com after 2 attempts"
        );
    }

    #[test]
    fn test_certificate_failure_found_in_source_chain() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer(
                "client error (Connect)",
                Some(Box::new(Layer(
                    "invalid peer certificate: UnknownIssuer",
                    None,
                ))),
            ))),
        );
        assert_eq!(
            tls_failure(&err),
            Some("invalid peer certificate: UnknownIssuer".to_string())
        );
    }

    #[test]
    fn test_handshake_failures_count_as_tls() {
        let alert = Layer(
            "client error (Connect)",
            Some(Box::new(Layer("received fatal alert: HandshakeFailure", None))),
        );
        assert_eq!(
            tls_failure(&alert),
            Some("received fatal alert: HandshakeFailure".to_string())
        );

        let protocol = Layer(
            "client error (Connect)",
            Some(Box::new(Layer("peer is incompatible: Tls12NotOffered", None))),
        );
        assert!(tls_failure(&protocol).is_some());

        let openssl = Layer("error:0A00010B:SSL routines::wrong version number", None);
        assert!(tls_failure(&openssl).is_some());
    }

    #[test]
    fn test_certificate_failure_absent() {
        let err = Layer(
            "error sending request",
            Some(Box::new(Layer("connection refused", None))),
        );
        assert_eq!(tls_failure(&err), None);
    }

    #[test]
    fn test_is_certificate() {
        assert!(FetchError::Certificate("expired".to_string()).is_certificate());
        assert!(!FetchError::Timeout.is_certificate());
    }
}
