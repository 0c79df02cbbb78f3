//! Scripted collaborators for unit tests

use crate::collaborators::{PdfInfo, PdfInspector, VideoInfo, VideoLookup};
use crate::error::FetchError;
use crate::transport::{RawResponse, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Script = Result<RawResponse, FetchError>;

/// Transport answering from per-URL queues, recording every request
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    requests: Mutex<Vec<(String, bool)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, url: &str, outcome: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Requested URLs with their verify flag, in order
    pub fn requests(&self) -> Vec<(String, bool)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn get(&self, url: &str, verify_tls: bool) -> Result<RawResponse, FetchError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), verify_tls));
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(FetchError::RequestError(format!("unscripted: {}", url))))
    }
}

pub fn response(status_code: u16, content_type: &str, body: &[u8]) -> Script {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
    Ok(RawResponse {
        status_code,
        headers,
        body: Bytes::copy_from_slice(body),
    })
}

pub fn html(status_code: u16, body: &str) -> Script {
    response(status_code, "text/html; charset=utf-8", body.as_bytes())
}

pub fn redirect(status_code: u16, location: &str) -> Script {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_str(location).unwrap());
    Ok(RawResponse {
        status_code,
        headers,
        body: Bytes::new(),
    })
}

pub fn cert_error() -> Script {
    Err(FetchError::Certificate(
        "invalid peer certificate: UnknownIssuer".to_string(),
    ))
}

pub fn connect_error() -> Script {
    Err(FetchError::RequestError("connection refused".to_string()))
}

/// Video lookup returning a fixed answer
pub struct FixedVideo(pub Option<VideoInfo>);

#[async_trait]
impl VideoLookup for FixedVideo {
    async fn lookup(&self, _url: &str) -> Result<VideoInfo, FetchError> {
        self.0
            .clone()
            .ok_or_else(|| FetchError::VideoLookup("not a video".to_string()))
    }
}

/// PDF inspector returning a fixed answer
pub struct FixedPdf(pub PdfInfo);

impl PdfInspector for FixedPdf {
    fn inspect(&self, _bytes: &[u8]) -> PdfInfo {
        self.0.clone()
    }
}
