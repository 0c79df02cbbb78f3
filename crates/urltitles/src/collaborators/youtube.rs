//! YouTube video metadata, scraped from the public watch page

use super::{VideoInfo, VideoLookup};
use crate::convert::clean_text;
use crate::error::FetchError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

/// Timeout for the watch page request
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:(?:www\.|m\.)?youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/)|youtu\.be/)[\w-]+",
    )
    .expect("video URL pattern is valid")
});

static LENGTH_SECONDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""lengthSeconds"\s*:\s*"(\d+)""#).expect("lengthSeconds pattern is valid")
});

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern is valid")
});

static META_TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="title"], meta[property="og:title"]"#)
        .expect("meta title selector is valid")
});

static META_DURATION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[itemprop="duration"]"#).expect("duration selector is valid")
});

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));

/// Returns true if `url` is a YouTube video page
///
/// Accepts `youtube.com/watch?...v=<id>`, `youtube.com/shorts/<id>` (with
/// optional `www.`/`m.`) and `youtu.be/<id>`. Channel pages, playlists and
/// the home page are not videos and fall through to the HTML summary.
pub fn is_video_url(url: &str) -> bool {
    VIDEO_URL.is_match(url)
}

/// [`VideoLookup`] that scrapes YouTube watch pages
pub struct YouTubeLookup {
    client: reqwest::Client,
}

impl YouTubeLookup {
    /// Create a lookup sharing the process cookie jar
    ///
    /// YouTube answers some regions with a consent redirect; the shared
    /// jar keeps that cookie once set.
    pub fn new(user_agent: &str, cookies: Arc<Jar>) -> Result<Self, FetchError> {
        let user_agent = HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(cookies)
            .connect_timeout(LOOKUP_TIMEOUT)
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(FetchError::ClientBuildError)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl VideoLookup for YouTubeLookup {
    async fn lookup(&self, url: &str) -> Result<VideoInfo, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::VideoLookup(format!("HTTP {}", status.as_u16())));
        }

        let page = response.text().await.map_err(FetchError::from_reqwest)?;
        let info = parse_watch_page(&page)
            .ok_or_else(|| FetchError::VideoLookup("no video metadata in page".to_string()))?;

        debug!(url = %url, title = %info.title, duration = %info.duration, "Video metadata");
        Ok(info)
    }
}

/// Extract title and duration from a watch page
///
/// Title comes from the `title`/`og:title` meta tags, falling back to
/// `<title>` minus the site suffix. Duration comes from the player
/// response's `lengthSeconds`, falling back to the `itemprop=duration`
/// meta tag.
fn parse_watch_page(page: &str) -> Option<VideoInfo> {
    let document = Html::parse_document(page);

    let title = document
        .select(&META_TITLE)
        .filter_map(|el| el.value().attr("content"))
        .map(clean_text)
        .find(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&TITLE)
                .next()
                .map(|el| clean_text(&el.text().collect::<String>()))
                .map(|t| t.trim_end_matches(" - YouTube").to_string())
                .filter(|t| !t.is_empty())
        })?;

    let seconds = LENGTH_SECONDS
        .captures(page)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .or_else(|| {
            document
                .select(&META_DURATION)
                .filter_map(|el| el.value().attr("content"))
                .find_map(parse_iso_duration)
        });

    Some(VideoInfo {
        title,
        duration: seconds
            .map(format_duration)
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Parse an ISO 8601 duration of the form `PT#H#M#S`
fn parse_iso_duration(value: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(value)?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 3600 + part(2) * 60 + part(3))
}

/// Format seconds as `HH:MM:SS`
fn format_duration(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
